//! Parser for NAM-style simulator traces.
//!
//! Parsing is best-effort: malformed records are skipped and counted, and the
//! only error is an unreadable stream. The result is a [`ParsedTrace`] with
//! events stably sorted by time.
//!
//! [`ParsedTrace`]: topotrace_types::ParsedTrace

mod error;
mod parser;

pub use error::TraceError;
pub use parser::{parse_file, parse_reader, parse_str};
