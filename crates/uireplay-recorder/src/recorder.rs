//! Capture pipeline: turns live interaction signals into a recording
//!
//! A session is created explicitly, started, fed signals, and stopped;
//! stopping yields the immutable [`Recording`]. Handlers run to
//! completion synchronously and are disabled while a replay is active so
//! synthetic signals are never captured as genuine ones.

use crate::events::{EventData, InteractionEvent, NetworkEvent, Quadrant, Recording, TouchPhase};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use uireplay_core::locator::Locator;
use uireplay_core::page::{NodeId, PageTree};

/// Capture/replay mode flags, shared between a session and its replayer.
/// Exclusion is enforced by flag checks at the top of every handler;
/// execution is single-threaded, so no lock is needed.
#[derive(Debug, Default)]
pub struct ModeFlags {
    pub recording: AtomicBool,
    pub playing: AtomicBool,
}

impl ModeFlags {
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

/// Notification hook for the external overlay. Called after every
/// capture mutation with the full ordered event list; rendering is the
/// overlay's problem and capture never depends on it.
pub trait OverlayHook {
    fn recording_updated(&self, events: &[InteractionEvent]);
}

/// An interaction signal arriving at the capture boundary.
#[derive(Debug, Clone)]
pub enum Signal {
    PointerDown {
        x: f64,
        y: f64,
        target: NodeId,
    },
    /// Touch coordinates may be absent (single-point reads can miss);
    /// the handler then omits coordinates and quadrant.
    TouchStart {
        at: Option<(f64, f64)>,
        target: NodeId,
    },
    TouchEnd {
        at: Option<(f64, f64)>,
        target: NodeId,
    },
    Input {
        target: NodeId,
        genuine: bool,
    },
    Change {
        target: NodeId,
        genuine: bool,
    },
    KeyDown {
        target: NodeId,
        key: String,
    },
    Scroll {
        target: NodeId,
    },
}

pub struct RecorderSession {
    flags: Arc<ModeFlags>,
    events: Mutex<Vec<InteractionEvent>>,
    http_events: Mutex<Vec<NetworkEvent>>,
    overlay: Option<Box<dyn OverlayHook>>,
    network_rx: Option<Receiver<NetworkEvent>>,
    epoch: Mutex<Instant>,
}

impl RecorderSession {
    pub fn new() -> Self {
        Self {
            flags: Arc::new(ModeFlags::default()),
            events: Mutex::new(Vec::new()),
            http_events: Mutex::new(Vec::new()),
            overlay: None,
            network_rx: None,
            epoch: Mutex::new(Instant::now()),
        }
    }

    pub fn with_overlay(mut self, overlay: Box<dyn OverlayHook>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Attach the receiving end of an intercepting transport; completed
    /// network calls drain from here into the recording.
    pub fn with_network_source(mut self, rx: Receiver<NetworkEvent>) -> Self {
        self.network_rx = Some(rx);
        self
    }

    /// The shared mode flags, for constructing a mutually exclusive
    /// [`crate::replay::Replayer`].
    pub fn flags(&self) -> Arc<ModeFlags> {
        self.flags.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.flags.is_recording()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    /// Begin a fresh capture. Any previously buffered events are gone.
    pub fn start(&self) {
        self.events.lock().clear();
        self.http_events.lock().clear();
        *self.epoch.lock() = Instant::now();
        self.flags.recording.store(true, Ordering::SeqCst);
    }

    /// End capture and produce the immutable recording.
    pub fn stop(&self) -> Recording {
        self.drain_network();
        self.flags.recording.store(false, Ordering::SeqCst);
        let events = std::mem::take(&mut *self.events.lock());
        let http_events = std::mem::take(&mut *self.http_events.lock());
        Recording::new(events, http_events)
    }

    /// Entry point for every interaction signal. Inactive capture or an
    /// active replay drops the signal at the door.
    pub fn on_signal(&self, page: &PageTree, signal: Signal) {
        if !self.flags.is_recording() || self.flags.is_playing() {
            debug!(?signal, "signal ignored (not recording or replay active)");
            return;
        }

        match signal {
            Signal::PointerDown { x, y, target } => self.handle_pointer(page, x, y, target),
            Signal::TouchStart { at, target } => {
                self.handle_touch(page, TouchPhase::Start, at, target)
            }
            Signal::TouchEnd { at, target } => self.handle_touch(page, TouchPhase::End, at, target),
            Signal::Input { target, genuine } => self.handle_input(page, target, genuine),
            Signal::Change { target, genuine } => self.handle_change(page, target, genuine),
            Signal::KeyDown { target, key } => self.handle_key(page, target, &key),
            Signal::Scroll { target } => self.handle_scroll(page, target),
        }

        self.drain_network();
    }

    fn handle_pointer(&self, page: &PageTree, x: f64, y: f64, target: NodeId) {
        let (descriptor, path) = describe(page, target);
        self.push(InteractionEvent {
            t: self.now_ms(),
            target: descriptor,
            path,
            data: EventData::PointerDown {
                x,
                y,
                quadrant: Quadrant::of(x, y, page.viewport()),
            },
        });
    }

    fn handle_touch(&self, page: &PageTree, phase: TouchPhase, at: Option<(f64, f64)>, target: NodeId) {
        let (descriptor, path) = describe(page, target);
        let quadrant = at.map(|(x, y)| Quadrant::of(x, y, page.viewport()));
        self.push(InteractionEvent {
            t: self.now_ms(),
            target: descriptor,
            path,
            data: EventData::Touch {
                phase,
                x: at.map(|(x, _)| x),
                y: at.map(|(_, y)| y),
                quadrant,
            },
        });
    }

    fn handle_input(&self, page: &PageTree, target: NodeId, genuine: bool) {
        if !genuine {
            debug!("synthetic input signal suppressed");
            return;
        }
        let Some(el) = page.element(target) else {
            return;
        };
        if !el.is_text_capable() {
            return;
        }
        let value = el.value.clone().unwrap_or_default();
        let selection = el.selection;
        let (descriptor, path) = describe(page, target);
        self.push(InteractionEvent {
            t: self.now_ms(),
            target: descriptor,
            path,
            data: EventData::Input {
                value,
                selection_start: selection.map(|(s, _)| s),
                selection_end: selection.map(|(_, e)| e),
            },
        });
    }

    fn handle_change(&self, page: &PageTree, target: NodeId, genuine: bool) {
        if !genuine {
            debug!("synthetic change signal suppressed");
            return;
        }
        let Some(el) = page.element(target) else {
            return;
        };
        if !el.is_select() {
            return;
        }
        let value = el.value.clone().unwrap_or_default();
        let selected_index = el.selected_index;
        let (descriptor, path) = describe(page, target);
        self.push(InteractionEvent {
            t: self.now_ms(),
            target: descriptor,
            path,
            data: EventData::Change {
                value,
                selected_index,
            },
        });
    }

    fn handle_key(&self, page: &PageTree, target: NodeId, key: &str) {
        let Some(el) = page.element(target) else {
            return;
        };
        if !el.is_text_capable() {
            return;
        }
        let value = el.value.clone();
        let (descriptor, path) = describe(page, target);
        self.push(InteractionEvent {
            t: self.now_ms(),
            target: descriptor,
            path,
            data: EventData::Key {
                key: key.to_string(),
                value,
            },
        });
    }

    fn handle_scroll(&self, page: &PageTree, target: NodeId) {
        // Document-level capture sees every container scroll; the root
        // itself is not a target.
        if target == page.root() {
            return;
        }
        let Some(el) = page.element(target) else {
            return;
        };
        let (top, left) = (el.scroll_top, el.scroll_left);
        let (descriptor, path) = describe(page, target);
        self.push(InteractionEvent {
            t: self.now_ms(),
            target: descriptor,
            path,
            data: EventData::Scroll { top, left },
        });
    }

    /// Append a completed network call. Active capture only; otherwise
    /// the event is dropped.
    pub fn record_network_event(&self, event: NetworkEvent) {
        if !self.flags.is_recording() {
            debug!(url = %event.url, "network event dropped (not recording)");
            return;
        }
        self.http_events.lock().push(event);
    }

    /// Pull everything the transport seam has emitted so far, in
    /// completion order.
    pub fn drain_network(&self) {
        let Some(rx) = &self.network_rx else {
            return;
        };
        while let Ok(event) = rx.try_recv() {
            self.record_network_event(event);
        }
    }

    fn push(&self, event: InteractionEvent) {
        let snapshot = {
            let mut events = self.events.lock();
            events.push(event);
            self.overlay.is_some().then(|| events.clone())
        };
        // Fire-and-forget: the overlay renders, capture moves on.
        if let (Some(overlay), Some(snapshot)) = (&self.overlay, snapshot) {
            overlay.recording_updated(&snapshot);
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.lock().elapsed().as_millis() as u64
    }
}

impl Default for RecorderSession {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(
    page: &PageTree,
    target: NodeId,
) -> (Option<uireplay_core::ElementDescriptor>, Option<String>) {
    let locator = Locator::new(page);
    let descriptor = locator.descriptor(target);
    let path = descriptor.as_ref().and_then(|d| d.path.clone());
    (descriptor, path)
}
