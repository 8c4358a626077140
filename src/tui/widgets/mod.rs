//! Reusable TUI widgets

pub mod header;
pub mod shortcuts;

pub use header::*;
pub use shortcuts::*;
