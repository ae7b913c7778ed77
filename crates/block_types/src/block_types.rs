//! Block Types - Core data structures for the visual block editor
//!
//! This crate contains the pure data side of the block system: the shapes
//! block types declare (fields, value inputs, statement inputs, connectivity),
//! the registry those shapes live in, and the block graph document the editor
//! produces. Nothing here knows how code is generated from a document.

mod document;
mod registry;
mod types;
mod workspace;

pub use document::*;
pub use registry::*;
pub use types::*;
pub use workspace::*;
