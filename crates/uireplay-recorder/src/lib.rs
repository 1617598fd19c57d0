//! uireplay-recorder - interaction capture and replay sessions
//!
//! Builds on `uireplay-core`: a capture session turns interaction
//! signals into an ordered recording, the replay engine re-synthesizes
//! one against the live tree, and the transport seam reports completed
//! network calls into the active recording.

pub mod events;
pub mod recorder;
pub mod replay;
pub mod storage;
pub mod transport;

pub use events::{
    EventData, InteractionEvent, NetworkEvent, NetworkKind, Quadrant, Recording, TouchPhase,
};
pub use recorder::{ModeFlags, OverlayHook, RecorderSession, Signal};
pub use replay::{ReplayConfig, ReplayStats, Replayer};
pub use storage::RecordingStore;
pub use transport::{InterceptingTransport, NetworkRequest, NetworkResponse, Transport};

pub mod prelude {
    pub use crate::events::{
        EventData, InteractionEvent, NetworkEvent, NetworkKind, Quadrant, Recording, TouchPhase,
    };
    pub use crate::recorder::{ModeFlags, OverlayHook, RecorderSession, Signal};
    pub use crate::replay::{ReplayConfig, ReplayStats, Replayer};
    pub use crate::storage::RecordingStore;
    pub use crate::transport::{InterceptingTransport, NetworkRequest, NetworkResponse, Transport};
}
