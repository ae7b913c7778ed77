//! Invent Builder - Command-line builder for Invent block projects
//!
//! This crate provides the application side of the block code generator:
//! - Project loading and saving (`project.toml` plus block documents)
//! - Packaging generated code as a runnable PyScript app
//! - Watching a project and re-exporting on change

// Re-export core crates
pub use block_codegen;
pub use block_types;

// Project management
pub mod project;

// PyScript export
pub mod export;
