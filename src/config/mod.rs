// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod client;
pub mod config;
pub mod guard;
pub mod logging;

pub use client::*;
pub use config::*;
pub use guard::*;
pub use logging::*;
