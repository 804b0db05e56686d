//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - invalid input file or malformed resource
pub const VALIDATION_ERROR: i32 = 2;

/// Unauthorized - the user may not act on the target
pub const UNAUTHORIZED: i32 = 3;

/// Invalid state - the target cannot be acted on right now
pub const INVALID_STATE: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
