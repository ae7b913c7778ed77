//! Project Management
//!
//! Handles loading, saving and watching project files on disk.

mod config;
mod loader;
mod watcher;

pub use config::*;
pub use loader::*;
pub use watcher::*;
