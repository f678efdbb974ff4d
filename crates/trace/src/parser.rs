//! Line-oriented trace parser.
//!
//! Each line holds one record. The first token names the record kind and the
//! rest are `-flag value` pairs in any order:
//!
//! ```text
//! n -t * -s 0 -x 10.5 -y 20 -v circle -c black
//! l -t * -s 0 -d 1 -o right
//! + -t 0.1 -s 0 -d 1 -p tcp -e 1040
//! ```
//!
//! A record that is missing a required flag, or carries a flag value that does
//! not parse, is skipped on its own. Nothing short of an unreadable stream
//! aborts a parse.

use crate::error::TraceError;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use topotrace_types::{BoundingBox, ParsedTrace, TraceEvent, TraceEventKind, TraceLink, TraceNode};
use tracing::{debug, info};

/// Why a single record was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SkipReason {
    UnknownRecord(String),
    MissingFlag(&'static str),
    BadValue { flag: &'static str, value: String },
    NonFiniteTime,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRecord(token) => write!(f, "unknown record kind '{}'", token),
            Self::MissingFlag(flag) => write!(f, "missing required flag -{}", flag),
            Self::BadValue { flag, value } => write!(f, "bad value '{}' for -{}", value, flag),
            Self::NonFiniteTime => f.write_str("time is not finite"),
        }
    }
}

enum Record {
    Node(TraceNode),
    Link(TraceLink),
    Event(TraceEvent),
}

/// Flag values of one record. A later occurrence of a flag wins.
struct Flags<'a> {
    values: HashMap<&'a str, &'a str>,
}

impl<'a> Flags<'a> {
    fn collect(tokens: &[&'a str]) -> Self {
        let mut values = HashMap::new();
        for pair in tokens.windows(2) {
            if let Some(name) = pair[0].strip_prefix('-') {
                if !name.is_empty() {
                    values.insert(name, pair[1]);
                }
            }
        }
        Self { values }
    }

    fn text(&self, flag: &'static str) -> Option<&'a str> {
        self.values.get(flag).copied()
    }

    fn required<T: FromStr>(&self, flag: &'static str) -> Result<T, SkipReason> {
        let value = self.text(flag).ok_or(SkipReason::MissingFlag(flag))?;
        parse_value(flag, value)
    }

    fn optional<T: FromStr>(&self, flag: &'static str, default: T) -> Result<T, SkipReason> {
        match self.text(flag) {
            Some(value) => parse_value(flag, value),
            None => Ok(default),
        }
    }
}

fn parse_value<T: FromStr>(flag: &'static str, value: &str) -> Result<T, SkipReason> {
    value.parse().map_err(|_| SkipReason::BadValue {
        flag,
        value: value.to_string(),
    })
}

fn finite(flag: &'static str, value: f64) -> Result<f64, SkipReason> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SkipReason::BadValue {
            flag,
            value: value.to_string(),
        })
    }
}

fn parse_record(tokens: &[&str]) -> Result<Record, SkipReason> {
    let kind = tokens[0];
    let flags = Flags::collect(&tokens[1..]);

    match kind {
        "n" => {
            let id: u64 = flags.required("s")?;
            let x = finite("x", flags.optional("x", 0.0)?)?;
            let y = finite("y", flags.optional("y", 0.0)?)?;
            let mut node = TraceNode::new(id, x, y);
            if let Some(shape) = flags.text("v") {
                node.shape = shape.to_string();
            }
            if let Some(color) = flags.text("c") {
                node.color = color.to_string();
            }
            if let Some(label) = flags.text("l") {
                node.label = label.to_string();
            }
            Ok(Record::Node(node))
        }
        "l" => {
            let mut link = TraceLink::new(flags.required("s")?, flags.required("d")?);
            if let Some(orientation) = flags.text("o") {
                link.orientation = orientation.to_string();
            }
            if let Some(color) = flags.text("c") {
                link.color = color.to_string();
            }
            Ok(Record::Link(link))
        }
        other => {
            let kind = TraceEventKind::from_token(other)
                .ok_or_else(|| SkipReason::UnknownRecord(other.to_string()))?;
            let time: f64 = flags.optional("t", 0.0)?;
            if !time.is_finite() {
                return Err(SkipReason::NonFiniteTime);
            }
            Ok(Record::Event(TraceEvent {
                time,
                kind,
                src: flags.required("s")?,
                dst: flags.required("d")?,
                packet_kind: flags.text("p").unwrap_or("tcp").to_string(),
                size: flags.optional("e", 0)?,
            }))
        }
    }
}

/// Accumulates records line by line.
#[derive(Debug, Default)]
struct TraceBuilder {
    trace: ParsedTrace,
    line_no: usize,
}

impl TraceBuilder {
    fn feed_line(&mut self, line: &str) {
        self.line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match parse_record(&tokens) {
            Ok(Record::Node(node)) => {
                match self.trace.bounds.as_mut() {
                    Some(bounds) => bounds.include(node.x, node.y),
                    None => self.trace.bounds = Some(BoundingBox::at(node.x, node.y)),
                }
                self.trace.nodes.insert(node.id, node);
            }
            Ok(Record::Link(link)) => self.trace.links.push(link),
            Ok(Record::Event(event)) => {
                self.trace.max_time = self.trace.max_time.max(event.time);
                self.trace.events.push(event);
            }
            Err(reason) => {
                debug!(line = self.line_no, %reason, "Skipping trace record");
                self.trace.skipped_records += 1;
            }
        }
    }

    fn finish(mut self) -> ParsedTrace {
        // Stable: equal times keep input order.
        self.trace.events.sort_by(|a, b| a.time.total_cmp(&b.time));

        info!(
            nodes = self.trace.nodes.len(),
            links = self.trace.links.len(),
            events = self.trace.events.len(),
            skipped = self.trace.skipped_records,
            max_time = self.trace.max_time,
            "Parsed trace"
        );
        self.trace
    }
}

/// Parse a trace held in memory.
pub fn parse_str(text: &str) -> ParsedTrace {
    let mut builder = TraceBuilder::default();
    for line in text.lines() {
        builder.feed_line(line);
    }
    builder.finish()
}

/// Parse a trace from a buffered stream.
///
/// A read failure aborts the parse; no partial trace is returned.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<ParsedTrace, TraceError> {
    let mut builder = TraceBuilder::default();
    for line in reader.lines() {
        builder.feed_line(&line?);
    }
    Ok(builder.finish())
}

/// Parse a trace file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ParsedTrace, TraceError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TraceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Reading trace file");
    parse_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read, Write};
    use tracing_test::traced_test;

    const SAMPLE: &str = "\
# two nodes and a link
V -t * -v 1.0a5 -a 0
n -t * -s 0 -x 10 -y 20 -v box -c red
n -t * -s 1 -x -5.5 -y 40
l -t * -s 0 -d 1 -o right-up
+ -t 0.5 -s 0 -d 1 -p cbr -e 210
- -t 0.5 -s 0 -d 1 -p cbr -e 210
r -t 0.62 -s 0 -d 1 -p cbr -e 210
";

    #[test]
    fn test_parse_sample() {
        let trace = parse_str(SAMPLE);
        assert_eq!(trace.nodes.len(), 2);
        assert_eq!(trace.links.len(), 1);
        assert_eq!(trace.events.len(), 3);
        assert_eq!(trace.max_time, 0.62);
        // The `V` header line is not a known record.
        assert_eq!(trace.skipped_records, 1);

        let n0 = &trace.nodes[&0];
        assert_eq!((n0.x, n0.y), (10.0, 20.0));
        assert_eq!(n0.shape, "box");
        assert_eq!(n0.color, "red");
        assert_eq!(n0.label, "n0");

        assert_eq!(trace.links[0].orientation, "right-up");
        assert_eq!(trace.events[0].packet_kind, "cbr");
        assert_eq!(trace.events[0].size, 210);
    }

    #[test]
    fn test_bounds_cover_all_nodes() {
        let trace = parse_str(SAMPLE);
        let bounds = trace.bounds.unwrap();
        assert_eq!(bounds.min_x, -5.5);
        assert_eq!(bounds.max_x, 10.0);
        assert_eq!(bounds.min_y, 20.0);
        assert_eq!(bounds.max_y, 40.0);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let text = "\
n -t * -s 1 -x 10 -y 10
n -t * -s 2 -x 20 -y 20
n -t * -s 3 -x 30 -y 30
l -t * -s 1 -d 2
l -t * -s 2 -d 3
+ -t 1.0 -s 1 -d 2
+ -t 2.0 -s 2 -d 3
r -t 3.0 -s 2 -d 3
+ -t 4.0 -s 1 -d 2
+ -t 5.0 -s 2 -d 3
+ -t 1.5 -s one -d 2
";
        let trace = parse_str(text);
        assert_eq!(trace.nodes.len(), 3);
        assert_eq!(trace.links.len(), 2);
        assert_eq!(trace.events.len(), 5);
        assert_eq!(trace.skipped_records, 1);
        assert!(trace.events.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_dangling_link_and_unknown_record() {
        let trace = parse_str("n -t * -s 1 -x 5 -y 5\nQ -t 1 -s 1\nl -t * -s 1 -d 42\n");
        assert_eq!(trace.nodes.len(), 1);
        assert_eq!(trace.links.len(), 1);
        assert_eq!(trace.links[0].dst, 42);
        assert_eq!(trace.skipped_records, 1);
    }

    #[test]
    fn test_equal_times_keep_input_order() {
        let text = "\
+ -t 2.0 -s 9 -d 8
+ -t 1.0 -s 1 -d 2
h -t 1.0 -s 3 -d 4
d -t 1.0 -s 5 -d 6
";
        let trace = parse_str(text);
        let order: Vec<u64> = trace.events.iter().map(|e| e.src).collect();
        assert_eq!(order, vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_missing_required_flag_skips_record() {
        let trace = parse_str("n -t * -x 1 -y 2\nl -s 1\n+ -t 1 -s 1\n");
        assert!(trace.is_empty());
        assert_eq!(trace.skipped_records, 3);
        assert!(trace.bounds.is_none());
    }

    #[test]
    fn test_event_defaults() {
        let trace = parse_str("+ -s 1 -d 2");
        let event = &trace.events[0];
        assert_eq!(event.time, 0.0);
        assert_eq!(event.packet_kind, "tcp");
        assert_eq!(event.size, 0);
    }

    #[test]
    fn test_flags_in_any_order_and_unknown_ignored() {
        let trace = parse_str("r -e 64 -Z 3 -d 7 -p ack -s 4 -t 0.25 -a 1");
        let event = &trace.events[0];
        assert_eq!(event.kind, TraceEventKind::Receive);
        assert_eq!((event.src, event.dst), (4, 7));
        assert_eq!(event.time, 0.25);
        assert_eq!(event.packet_kind, "ack");
    }

    #[test]
    fn test_non_finite_time_skipped() {
        let trace = parse_str("+ -t inf -s 1 -d 2\n+ -t NaN -s 1 -d 2\n");
        assert!(trace.events.is_empty());
        assert_eq!(trace.skipped_records, 2);
    }

    #[test]
    fn test_last_node_record_wins() {
        let trace = parse_str("n -s 1 -x 0 -y 0\nn -s 1 -x 50 -y 60 -l core\n");
        assert_eq!(trace.nodes.len(), 1);
        let node = &trace.nodes[&1];
        assert_eq!((node.x, node.y), (50.0, 60.0));
        assert_eq!(node.label, "core");
        // Bounds still include the overwritten record.
        assert_eq!(trace.bounds.unwrap().min_x, 0.0);
    }

    #[traced_test]
    #[test]
    fn test_skip_is_logged() {
        parse_str("x -t 1 -s 2");
        assert!(logs_contain("Skipping trace record"));
        assert!(logs_contain("unknown record kind"));
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let trace = parse_file(file.path()).unwrap();
        assert_eq!(trace, parse_str(SAMPLE));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_file(dir.path().join("absent.nam")).unwrap_err();
        assert!(matches!(err, TraceError::Open { .. }));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    #[test]
    fn test_read_failure_is_fatal() {
        let err = parse_reader(BufReader::new(FailingReader)).unwrap_err();
        assert!(matches!(err, TraceError::Io(_)));
    }
}
