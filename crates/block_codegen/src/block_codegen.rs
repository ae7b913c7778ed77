//! Block Codegen - Turns block documents into Python source for the Invent runtime
//!
//! This crate contains the generator registry, the graph walker and the
//! built-in rules for every palette category. A `GeneratorContext` bundles
//! the block shapes, the rules and the output settings; `generate` walks a
//! document with it and returns the main text plus hoisted declarations.

pub use block_types;

mod allocator;
pub mod blocks;
mod context;
mod error;
mod fragment;
mod registry;
mod walker;

pub use allocator::*;
pub use context::*;
pub use error::*;
pub use fragment::*;
pub use registry::*;
pub use walker::*;
