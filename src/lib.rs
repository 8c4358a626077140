//! hostwatch library crate
//!
//! The binary is a thin wrapper around [`cli::Cli`]. The pieces are usable on
//! their own: the metric, process, directory and command components, the
//! [`controller::Controller`] that multiplexes them, and the terminal front
//! end in [`tui`].

#[cfg(not(unix))]
compile_error!("hostwatch supports Linux and other Unix-like hosts only");

pub mod browser;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processes;
pub mod runner;
pub mod sources;
pub mod tui;
pub mod utils;
pub mod worker;
