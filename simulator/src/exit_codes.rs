//! Stable exit codes for simulator CLI commands.

/// Command succeeded; evaluation produced a value.
pub const OK: i32 = 0;
/// Command failed due to invalid input/config/graph or other errors.
pub const INVALID: i32 = 1;
/// Evaluation short-circuited (`skip-type` or `skip-qty`).
pub const SKIPPED: i32 = 2;
/// A result did not match its expected value.
pub const MISMATCH: i32 = 3;
