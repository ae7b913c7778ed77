//! PyScript Export
//!
//! Packages a project's generated code as a browser app.

mod packager;
pub mod templates;

pub use packager::*;
