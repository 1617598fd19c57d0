//! Replay engine: re-synthesizes a recording against a live page tree
//!
//! Strictly sequential; every failure mode (missing path, locator miss,
//! dispatch error) is reported per event and replay continues. Only the
//! external force-stop flag halts a run early.

use crate::events::{EventData, InteractionEvent, Recording};
use crate::recorder::ModeFlags;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uireplay_core::error::Result;
use uireplay_core::locator::Locator;
use uireplay_core::page::{NodeId, PageTree};

/// Fixed pacing for synthesized interactions. A condition-based wait
/// can replace these without changing the external contract.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Wait after scrolling a click target into view.
    pub settle_ms: u64,
    /// Wait between consecutive events.
    pub step_delay_ms: u64,
    /// Simulated wait for a recorded network call.
    pub network_wait_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            settle_ms: 500,
            step_delay_ms: 500,
            network_wait_ms: 1000,
        }
    }
}

impl ReplayConfig {
    /// Zero delays, for tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            step_delay_ms: 0,
            network_wait_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub clicks: usize,
    pub inputs: usize,
    pub keys: usize,
    pub scrolls: usize,
    pub network_waits: usize,
    pub skipped: usize,
    pub misses: usize,
    pub failures: usize,
}

pub struct Replayer {
    flags: Arc<ModeFlags>,
    config: ReplayConfig,
    speed: f64,
    stop: Arc<AtomicBool>,
}

impl Replayer {
    /// Standalone replayer with its own mode flags.
    pub fn new() -> Self {
        Self::with_flags(Arc::new(ModeFlags::default()))
    }

    /// Share flags with a capture session so recording and replay are
    /// mutually exclusive.
    pub fn with_flags(flags: Arc<ModeFlags>) -> Self {
        Self {
            flags,
            config: ReplayConfig::default(),
            speed: 1.0,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Playback speed (1.0 = recorded pacing, 2.0 = twice as fast).
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Force-stop flag, checked between events. Wire to Ctrl-C or a UI.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.flags.is_playing()
    }

    /// Replay the recording's interaction events in stored order. A
    /// second call while one is in flight is a no-op.
    pub fn play(&self, recording: &Recording, page: &mut PageTree) -> ReplayStats {
        if self.flags.playing.swap(true, Ordering::SeqCst) {
            debug!("replay already in progress, ignoring");
            return ReplayStats::default();
        }

        info!(id = recording.id, events = recording.events.len(), "replay started");
        let mut stats = ReplayStats::default();

        for event in &recording.events {
            if self.stop.load(Ordering::SeqCst) {
                warn!("replay force-stopped");
                break;
            }
            self.play_event(event, page, &mut stats);
            self.pause(self.config.step_delay_ms);
        }

        self.flags.playing.store(false, Ordering::SeqCst);
        self.stop.store(false, Ordering::SeqCst);
        info!(?stats, "replay finished");
        stats
    }

    fn play_event(&self, event: &InteractionEvent, page: &mut PageTree, stats: &mut ReplayStats) {
        // Network markers are logged and waited out, never re-issued.
        if let EventData::Network { method, url, .. } = &event.data {
            info!(%method, %url, "waiting for recorded network step");
            self.pause(self.config.network_wait_ms);
            stats.network_waits += 1;
            return;
        }

        let Some(path) = &event.path else {
            warn!(t = event.t, "event has no structural path, skipping");
            stats.skipped += 1;
            return;
        };

        let node = match Locator::new(page).resolve_str(path) {
            Ok(node) => node,
            Err(e) => {
                warn!(%path, error = %e, "element not found, continuing");
                stats.misses += 1;
                return;
            }
        };

        match self.dispatch(&event.data, node, page) {
            Ok(()) => match &event.data {
                EventData::PointerDown { .. } | EventData::Touch { .. } => stats.clicks += 1,
                EventData::Input { .. } | EventData::Change { .. } => stats.inputs += 1,
                EventData::Key { .. } => stats.keys += 1,
                EventData::Scroll { .. } => stats.scrolls += 1,
                EventData::Network { .. } => {}
            },
            Err(e) => {
                warn!(%path, error = %e, "dispatch failed, continuing");
                stats.failures += 1;
            }
        }
    }

    fn dispatch(&self, data: &EventData, node: NodeId, page: &mut PageTree) -> Result<()> {
        match data {
            EventData::PointerDown { .. } | EventData::Touch { .. } => {
                page.scroll_into_view(node);
                self.pause(self.config.settle_ms);
                page.click(node)
            }
            EventData::Input {
                value,
                selection_start,
                selection_end,
            } => {
                page.set_value(node, value)?;
                if let (Some(start), Some(end)) = (selection_start, selection_end) {
                    page.set_selection(node, *start, *end)?;
                }
                page.dispatch_input(node)?;
                page.dispatch_change(node)
            }
            EventData::Change {
                value,
                selected_index,
            } => {
                page.set_value(node, value)?;
                if let Some(index) = selected_index {
                    page.set_selected_index(node, *index)?;
                }
                page.dispatch_input(node)?;
                page.dispatch_change(node)
            }
            EventData::Key { key, .. } => page.dispatch_key(node, key),
            EventData::Scroll { top, left } => page.set_scroll(node, *top, *left),
            EventData::Network { .. } => unreachable!("network events never reach dispatch"),
        }
    }

    fn pause(&self, ms: u64) {
        if ms == 0 {
            return;
        }
        let scaled = (ms as f64 / self.speed.max(0.01)) as u64;
        std::thread::sleep(Duration::from_millis(scaled));
    }
}

impl Default for Replayer {
    fn default() -> Self {
        Self::new()
    }
}
