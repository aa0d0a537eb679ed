//! Stable exit codes for listing CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid project layout, config, store or arguments, or any other error.
pub const INVALID: i32 = 1;
/// `listing wizard` was blocked by validation or the persistence call failed.
pub const SUBMISSION_FAILED: i32 = 2;
/// A favorite mutation was attempted without a resolvable user.
pub const UNAUTHENTICATED: i32 = 3;
