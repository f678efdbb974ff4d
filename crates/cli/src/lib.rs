//! Building blocks behind the `topotrace` binary.
//!
//! Each subcommand is a plain function over the library crates so it can be
//! exercised without a terminal.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use topotrace_client::ClientError;
use topotrace_editor::{Command, CommandLog, EditError};
use topotrace_graph::GraphStore;
use topotrace_replay::{PacerConfig, ReplayEngine, ReplayError, TickPacer};
use topotrace_trace::TraceError;
use topotrace_types::{BoundingBox, NodeId, ParsedTrace, TraceEventKind};
use tracing::{debug, info};

/// Errors surfaced by the command-line tool.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("simulation failed: {0}")]
    Simulation(String),
}

// ═══════════════════════════════════════════════════════════════════════════
// inspect
// ═══════════════════════════════════════════════════════════════════════════

/// Counts and extents of a parsed trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSummary {
    pub nodes: usize,
    pub links: usize,
    pub events: usize,
    pub events_by_kind: BTreeMap<String, usize>,
    pub max_time: f64,
    pub bounds: Option<BoundingBox>,
    pub skipped_records: usize,
}

impl TraceSummary {
    pub fn of(trace: &ParsedTrace) -> Self {
        let events_by_kind = [
            TraceEventKind::Enqueue,
            TraceEventKind::Dequeue,
            TraceEventKind::Receive,
            TraceEventKind::Drop,
            TraceEventKind::Hop,
        ]
        .into_iter()
        .map(|kind| (kind.to_string(), trace.count_kind(kind)))
        .filter(|(_, n)| *n > 0)
        .collect();

        Self {
            nodes: trace.nodes.len(),
            links: trace.links.len(),
            events: trace.events.len(),
            events_by_kind,
            max_time: trace.max_time,
            bounds: trace.bounds,
            skipped_records: trace.skipped_records,
        }
    }
}

impl fmt::Display for TraceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:    {}", self.nodes)?;
        writeln!(f, "links:    {}", self.links)?;
        writeln!(f, "events:   {}", self.events)?;
        for (kind, count) in &self.events_by_kind {
            writeln!(f, "  {:<8}{}", kind, count)?;
        }
        writeln!(f, "max time: {:.3}s", self.max_time)?;
        match &self.bounds {
            Some(b) => writeln!(
                f,
                "bounds:   x [{}, {}]  y [{}, {}]",
                b.min_x, b.max_x, b.min_y, b.max_y
            )?,
            None => writeln!(f, "bounds:   -")?,
        }
        write!(f, "skipped:  {}", self.skipped_records)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// replay
// ═══════════════════════════════════════════════════════════════════════════

/// How to drive a replay from the command line.
#[derive(Debug, Clone)]
pub struct ReplayPlan {
    /// Trace seconds advanced per tick.
    pub step: f64,
    /// Stop once the cursor reaches this time. Defaults to the end of the run.
    pub until: Option<f64>,
    /// Jump here before playing.
    pub seek: Option<f64>,
    /// Print a status line every this many ticks.
    pub report_every: usize,
    pub pacer: PacerConfig,
}

impl Default for ReplayPlan {
    fn default() -> Self {
        Self {
            step: 0.05,
            until: None,
            seek: None,
            report_every: 20,
            pacer: PacerConfig::default(),
        }
    }
}

/// One line of replay output.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayLine {
    Status { cursor: f64, active: usize },
    LoadRaised { cursor: f64, active: usize },
    LoadCleared { cursor: f64, active: usize },
}

impl fmt::Display for ReplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayLine::Status { cursor, active } => {
                write!(f, "t={:>8.3}s  active={}", cursor, active)
            }
            ReplayLine::LoadRaised { cursor, active } => {
                write!(f, "t={:>8.3}s  load raised ({} active)", cursor, active)
            }
            ReplayLine::LoadCleared { cursor, active } => {
                write!(f, "t={:>8.3}s  load cleared ({} active)", cursor, active)
            }
        }
    }
}

/// Result of a headless replay.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub lines: Vec<ReplayLine>,
    pub ticks: usize,
    pub final_cursor: f64,
    pub peak_active: usize,
    /// Sum of the paced intervals, i.e. how long the run takes in real time.
    pub paced_wall_time: Duration,
}

/// Drive `engine` to completion (or `plan.until`) without sleeping.
pub fn run_replay(engine: &mut ReplayEngine, plan: &ReplayPlan) -> Result<ReplayReport, CliError> {
    if !(plan.step.is_finite() && plan.step > 0.0) {
        return Err(ReplayError::InvalidStep(plan.step).into());
    }
    if let Some(until) = plan.until.filter(|t| !t.is_finite()) {
        return Err(ReplayError::InvalidEnd(until).into());
    }
    if let Some(target) = plan.seek {
        engine.seek(target)?;
    }
    let end = plan
        .until
        .unwrap_or(engine.max_time() + engine.config().transit_duration);
    let mut pacer = TickPacer::new(plan.pacer.clone())?;
    let mut report = ReplayReport {
        lines: Vec::new(),
        ticks: 0,
        final_cursor: engine.cursor(),
        peak_active: engine.active_count(),
        paced_wall_time: Duration::ZERO,
    };

    engine.play();
    let mut overloaded = engine.is_overloaded();
    while engine.cursor() < end && !(plan.until.is_none() && engine.is_finished()) {
        let step = plan.step.min(end - engine.cursor());
        engine.tick(step)?;
        report.ticks += 1;
        report.paced_wall_time += pacer.next_interval(engine.is_overloaded());

        let cursor = engine.cursor();
        let active = engine.active_count();
        report.peak_active = report.peak_active.max(active);

        if engine.is_overloaded() != overloaded {
            overloaded = !overloaded;
            report.lines.push(if overloaded {
                ReplayLine::LoadRaised { cursor, active }
            } else {
                ReplayLine::LoadCleared { cursor, active }
            });
        }
        if plan.report_every > 0 && report.ticks % plan.report_every == 0 {
            report.lines.push(ReplayLine::Status { cursor, active });
        }
    }
    engine.pause();
    report.final_cursor = engine.cursor();

    info!(
        ticks = report.ticks,
        cursor = report.final_cursor,
        peak_active = report.peak_active,
        stats = ?engine.stats(),
        "Replay finished"
    );
    Ok(report)
}

// ═══════════════════════════════════════════════════════════════════════════
// generate
// ═══════════════════════════════════════════════════════════════════════════

/// Rebuild a trace's topology in an editor store through undoable commands.
///
/// Links whose endpoints were never described by a node record are skipped.
/// Returns the editor id assigned to each trace node.
pub fn import_topology(
    trace: &ParsedTrace,
    store: &mut GraphStore,
    log: &mut CommandLog,
) -> Result<BTreeMap<u64, NodeId>, CliError> {
    let mut ids = BTreeMap::new();
    for node in trace.nodes.values() {
        log.execute(
            store,
            Command::add_node(node.x.round() as i32, node.y.round() as i32),
        )?;
        if let Some(id) = log.last_applied().and_then(Command::created_node) {
            ids.insert(node.id, id);
        }
    }

    let mut dangling = 0usize;
    for link in &trace.links {
        match (ids.get(&link.src), ids.get(&link.dst)) {
            (Some(&a), Some(&b)) => {
                log.execute(store, Command::add_link(a, b))?;
            }
            _ => dangling += 1,
        }
    }
    debug!(
        nodes = ids.len(),
        links = store.link_count(),
        dangling,
        "Imported trace topology"
    );
    Ok(ids)
}
