//! Stable exit codes for mend CLI commands.

/// The wrapped command succeeded, possibly after dependency installs.
pub const OK: i32 = 0;
/// Invalid usage/config or an internal error outside the wrapped command.
pub const INVALID: i32 = 1;
/// The wrapped command failed and no dependency rule matched its output.
pub const FAILED: i32 = 2;
/// A missing dependency was identified but could not be resolved.
pub const UNRESOLVED: i32 = 3;
