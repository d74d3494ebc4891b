//! I/O helpers for mend commands.

pub mod config;
pub mod context;
pub mod installer;
pub mod process;
