//! Self-healing command execution.
//!
//! Mend runs a command that depends on external tools. When the command
//! fails because one of those tools is missing, mend recognizes the failure
//! from its output, installs the missing package through the platform
//! package manager, and runs the command again. The architecture enforces a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (the rule table and classifier).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (process execution, binary
//!   probing, package installs, configuration). Isolated to enable mocking
//!   in tests.
//!
//! The orchestration module ([`heal`]) coordinates core logic with I/O to
//! implement the retry loop; [`ui`] renders operator-facing output and
//! `main` maps loop outcomes to [`exit_codes`].

pub mod core;
pub mod exit_codes;
pub mod heal;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod ui;
