//! uireplay-core - element re-location and page-tree primitives
//!
//! The foundation of the record/replay engine: a page-tree substrate,
//! structural paths for exact element re-location, a weighted fallback
//! matcher for drifted trees, and the editable-element registry.

pub mod element;
pub mod error;
pub mod locator;
pub mod page;
pub mod path;
pub mod registry;

pub use element::{Bounds, Element, ElementDescriptor};
pub use error::{Error, ErrorCode, Result};
pub use locator::{Locator, MatchCriteria};
pub use page::{NodeId, PageTree, SyntheticSignal};
pub use path::StructuralPath;
pub use registry::EditableRegistry;

pub mod prelude {
    pub use crate::element::{Bounds, Element, ElementDescriptor};
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::locator::{Locator, MatchCriteria};
    pub use crate::page::{NodeId, PageTree, SyntheticSignal};
    pub use crate::path::StructuralPath;
    pub use crate::registry::EditableRegistry;
}
