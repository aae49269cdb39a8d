/*!
 * Core Module
 * Shared error types and tunables
 */

pub mod errors;
pub mod limits;

pub use errors::{WaitError, WaitResult};
