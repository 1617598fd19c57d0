//! Recorded event types
//!
//! Flat structs with a flattened tagged union so recordings serialize to
//! compact, readable JSON.

use serde::{Deserialize, Serialize};
use uireplay_core::element::ElementDescriptor;

/// Screen quadrant relative to the viewport midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub fn of(x: f64, y: f64, viewport: (f64, f64)) -> Self {
        let center_x = viewport.0 / 2.0;
        let center_y = viewport.1 / 2.0;
        match (x < center_x, y < center_y) {
            (true, true) => Self::TopLeft,
            (false, true) => Self::TopRight,
            (true, false) => Self::BottomLeft,
            (false, false) => Self::BottomRight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    Start,
    End,
}

/// One captured interaction. `t` is milliseconds since capture start;
/// events within a recording are append-only and ordered by `t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub t: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(flatten)]
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventData {
    PointerDown {
        x: f64,
        y: f64,
        quadrant: Quadrant,
    },
    Touch {
        phase: TouchPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quadrant: Option<Quadrant>,
    },
    Input {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection_start: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selection_end: Option<u32>,
    },
    Change {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected_index: Option<i32>,
    },
    Key {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Scroll {
        top: f64,
        left: f64,
    },
    /// Marker for a network call; replay logs it and applies a fixed
    /// simulated wait instead of re-issuing the call.
    Network {
        method: String,
        url: String,
        status: u16,
        duration_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    Fetch,
    Xhr,
}

/// A completed outbound call observed by the transport seam. Delivered
/// exactly once, after completion; a transport error shows as status 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEvent {
    #[serde(rename = "type")]
    pub kind: NetworkKind,
    pub method: String,
    pub url: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    pub start_time: u64,
    pub duration_ms: u64,
}

/// One captured session: interaction events and network events, each
/// ordered within their own sequence. Created atomically when capture
/// stops; immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: i64,
    pub timestamp: String,
    pub events: Vec<InteractionEvent>,
    #[serde(rename = "httpEvents", default)]
    pub http_events: Vec<NetworkEvent>,
}

impl Recording {
    pub fn new(events: Vec<InteractionEvent>, http_events: Vec<NetworkEvent>) -> Self {
        Self {
            id: chrono::Utc::now().timestamp_millis(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            events,
            http_events,
        }
    }
}
