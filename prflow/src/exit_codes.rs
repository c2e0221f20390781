//! Stable exit codes for prflow CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// An action reported failure, or a git/config error occurred.
pub const FAILED: i32 = 1;
/// `cancel` was chosen; the repository was not touched.
pub const CANCELLED: i32 = 2;
