//! Timeline replay engine.
//!
//! Reconstructs the set of packets in flight at any trace time from the
//! sorted event list of a [`ParsedTrace`].
//!
//! # Advancement
//!
//! Forward movement, whether from `tick` or from the rebuild inside `seek`,
//! goes through one routine. For each event with `time <= target`:
//!
//! 1. **Settle** at the event time: recompute progress, retire packets at or
//!    past the retire threshold, and (only if the event time is strictly later
//!    than the latest admission) evict the oldest packets down to the soft cap.
//! 2. **Admit** the event if it is an Enqueue or Hop, unless the hard cap is
//!    already reached.
//!
//! Finally the engine settles at `target` itself. Retirement and eviction both
//! remove packets from the oldest end of the admission order, so settling at
//! extra intermediate cursors never changes the result. This is what makes
//! ticking to `T` in any step sizes agree with a direct `seek(T)`.
//!
//! # State Machine
//!
//! ```text
//!   Stopped ──play()──► Playing ──pause()──► Paused
//!      ▲                  │  ▲                 │
//!      └──── stop() ──────┘  └──── play() ─────┘
//! ```
//!
//! `seek` is legal in every state and never changes it. `stop` rewinds to 0.

use crate::config::ReplayConfig;
use crate::error::ReplayError;
use std::sync::Arc;
use topotrace_types::{ParsedTrace, TraceEvent, TraceEventKind};
use tracing::{debug, trace};

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Identity of a packet: endpoints plus start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketKey {
    pub src: u64,
    pub dst: u64,
    /// Bit pattern of the start time.
    start_bits: u64,
}

impl PacketKey {
    pub fn new(src: u64, dst: u64, start_time: f64) -> Self {
        Self {
            src,
            dst,
            start_bits: start_time.to_bits(),
        }
    }

    pub fn start_time(&self) -> f64 {
        f64::from_bits(self.start_bits)
    }
}

/// A packet currently crossing a link.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedPacket {
    pub start_time: f64,
    pub src: u64,
    pub dst: u64,
    /// The event kind that admitted the packet.
    pub kind: TraceEventKind,
    pub packet_kind: String,
    pub size: u32,
    /// Fraction of the transit completed at the current cursor.
    pub progress: f64,
    /// Smoothed progress for rendering.
    pub visual_progress: f64,
    /// Admission order within the current pass.
    seq: u64,
}

impl AnimatedPacket {
    fn admit(event: &TraceEvent, seq: u64) -> Self {
        Self {
            start_time: event.time,
            src: event.src,
            dst: event.dst,
            kind: event.kind,
            packet_kind: event.packet_kind.clone(),
            size: event.size,
            progress: 0.0,
            visual_progress: 0.0,
            seq,
        }
    }

    pub fn key(&self) -> PacketKey {
        PacketKey::new(self.src, self.dst, self.start_time)
    }

    /// Admission order within the current pass.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Counters for the current pass from time 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Events consumed so far.
    pub consumed: u64,
    /// Packets admitted.
    pub admitted: u64,
    /// Admissions refused at the hard cap.
    pub dropped: u64,
    /// Packets evicted at the soft cap.
    pub evicted: u64,
    /// Packets retired on reaching the retire threshold.
    pub retired: u64,
}

/// Deterministic, seekable replay of a parsed trace.
#[derive(Debug)]
pub struct ReplayEngine {
    config: ReplayConfig,
    trace: Arc<ParsedTrace>,
    state: PlaybackState,
    cursor: f64,
    /// Index of the next unconsumed event.
    next_event: usize,
    /// Active packets in admission order.
    active: Vec<AnimatedPacket>,
    next_seq: u64,
    /// Start time of the most recent admission.
    last_admission: Option<f64>,
    stats: ReplayStats,
}

impl ReplayEngine {
    /// Create an engine with an empty trace.
    pub fn new(config: ReplayConfig) -> Result<Self, ReplayError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create an engine with default configuration over `trace`.
    pub fn with_trace(trace: Arc<ParsedTrace>) -> Self {
        let mut engine = Self::build(ReplayConfig::default());
        engine.load(trace);
        engine
    }

    fn build(config: ReplayConfig) -> Self {
        Self {
            config,
            trace: Arc::new(ParsedTrace::default()),
            state: PlaybackState::Stopped,
            cursor: 0.0,
            next_event: 0,
            active: Vec::new(),
            next_seq: 0,
            last_admission: None,
            stats: ReplayStats::default(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn trace(&self) -> &Arc<ParsedTrace> {
        &self.trace
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current trace time.
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn max_time(&self) -> f64 {
        self.trace.max_time
    }

    /// Active packets in admission order.
    pub fn active_packets(&self) -> &[AnimatedPacket] {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Identities of the active packets, in admission order.
    pub fn active_keys(&self) -> Vec<PacketKey> {
        self.active.iter().map(AnimatedPacket::key).collect()
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Load signal: more than `load_threshold` packets still in flight.
    pub fn is_overloaded(&self) -> bool {
        let in_flight = self
            .active
            .iter()
            .filter(|p| p.progress < self.config.retire_progress)
            .count();
        in_flight > self.config.load_threshold
    }

    /// Every event consumed, the cursor past the last one, nothing in flight.
    pub fn is_finished(&self) -> bool {
        self.next_event >= self.trace.events.len()
            && self.cursor >= self.trace.max_time
            && self.active.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Playback Control
    // ═══════════════════════════════════════════════════════════════════════════

    /// Replace the trace wholesale. The engine returns to Stopped at time 0.
    pub fn load(&mut self, trace: Arc<ParsedTrace>) {
        debug!(
            events = trace.events.len(),
            max_time = trace.max_time,
            "Loaded trace into replay engine"
        );
        self.trace = trace;
        self.state = PlaybackState::Stopped;
        self.rewind();
    }

    pub fn play(&mut self) {
        self.transition(PlaybackState::Playing);
    }

    /// Freeze the cursor until the next `play`.
    pub fn pause(&mut self) {
        self.transition(PlaybackState::Paused);
    }

    /// Stop and rewind to time 0.
    pub fn stop(&mut self) {
        self.transition(PlaybackState::Stopped);
        self.rewind();
    }

    /// Jump to `target`, clamped to `[0, max_time]`.
    ///
    /// Rebuilds the active set from the start of the trace, so the result
    /// depends only on the target and never on earlier calls. Visual progress
    /// is snapped to progress.
    pub fn seek(&mut self, target: f64) -> Result<(), ReplayError> {
        if !target.is_finite() {
            return Err(ReplayError::InvalidSeek(target));
        }
        let target = target.clamp(0.0, self.trace.max_time.max(0.0));
        self.rewind();
        self.advance_to(target);
        for packet in &mut self.active {
            packet.visual_progress = packet.progress;
        }
        trace!(cursor = target, active = self.active.len(), "Seek");
        Ok(())
    }

    /// Advance the cursor by `dt` seconds of trace time.
    ///
    /// Only moves while Playing; returns whether the engine advanced.
    pub fn tick(&mut self, dt: f64) -> Result<bool, ReplayError> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(ReplayError::InvalidStep(dt));
        }
        if self.state != PlaybackState::Playing {
            return Ok(false);
        }
        self.advance_to(self.cursor + dt);
        let smoothing = self.config.smoothing;
        for packet in &mut self.active {
            packet.visual_progress += (packet.progress - packet.visual_progress) * smoothing;
        }
        Ok(true)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Internal
    // ═══════════════════════════════════════════════════════════════════════════

    fn transition(&mut self, next: PlaybackState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, cursor = self.cursor, "Playback state change");
            self.state = next;
        }
    }

    fn rewind(&mut self) {
        self.cursor = 0.0;
        self.next_event = 0;
        self.active.clear();
        self.next_seq = 0;
        self.last_admission = None;
        self.stats = ReplayStats::default();
    }

    /// Consume every event with `time <= target`, then settle at `target`.
    fn advance_to(&mut self, target: f64) {
        let trace = Arc::clone(&self.trace);
        while let Some(event) = trace.events.get(self.next_event) {
            if event.time > target {
                break;
            }
            self.settle(event.time);
            self.next_event += 1;
            self.stats.consumed += 1;
            if event.kind.starts_transit() {
                self.admit(event);
            }
        }
        self.settle(target);
        self.cursor = target;
    }

    fn admit(&mut self, event: &TraceEvent) {
        if self.active.len() >= self.config.hard_cap {
            self.stats.dropped += 1;
            debug!(
                time = event.time,
                src = event.src,
                dst = event.dst,
                cap = self.config.hard_cap,
                "Dropped packet admission at hard cap"
            );
            return;
        }
        self.active.push(AnimatedPacket::admit(event, self.next_seq));
        self.next_seq += 1;
        self.stats.admitted += 1;
        self.last_admission = Some(event.time);
    }

    /// Bring the active set up to date at time `at`.
    fn settle(&mut self, at: f64) {
        let duration = self.config.transit_duration;
        let retire = self.config.retire_progress;

        for packet in &mut self.active {
            packet.progress = ((at - packet.start_time) / duration).clamp(0.0, 1.0);
        }
        let before = self.active.len();
        self.active.retain(|p| p.progress < retire);
        self.stats.retired += (before - self.active.len()) as u64;

        let past_admissions = self.last_admission.map_or(true, |t| at > t);
        if past_admissions && self.active.len() > self.config.soft_cap {
            // Admission order is (start_time, seq) order: the oldest come first.
            let excess = self.active.len() - self.config.soft_cap;
            self.active.drain(..excess);
            self.stats.evicted += excess as u64;
            debug!(
                at,
                evicted = excess,
                cap = self.config.soft_cap,
                "Evicted packets over soft cap"
            );
        }
    }
}
