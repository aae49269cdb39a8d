/*!
 * Error Types
 * Wait outcomes with thiserror and serde support
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Non-success outcomes of a wait.
///
/// A timeout is the dominant non-success return and is not a failure; a
/// broken mutex or condition variable below us is treated as fatal by the
/// locking layer and never surfaces here.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum WaitError {
    #[error("Wait operation timed out")]
    Timeout,
}
