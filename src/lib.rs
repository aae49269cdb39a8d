/*!
 * wakesync
 * Manual- and auto-reset events with composite waits for native threads
 *
 * # Architecture
 *
 * Two layers:
 * - `event` owns the signallable primitive: an atomic state flag for the
 *   lock-free paths, a mutex/condvar pair for everything else, and (with the
 *   `multiwait` feature) a queue of registered composite waits.
 * - `multi` owns the per-call composite-wait machinery: wake on the first
 *   signalled event (`wait_any`) or claim every event of a set in one
 *   atomic step (`wait_all`).
 *
 * Timeouts are `Option<Duration>`: `None` waits forever,
 * `Some(Duration::ZERO)` probes without blocking.
 */

pub mod core;
pub mod event;
#[cfg(feature = "multiwait")]
pub mod multi;

pub use crate::core::{WaitError, WaitResult};
pub use event::Event;
#[cfg(feature = "multiwait")]
pub use multi::{wait_all, wait_any, wait_multiple, WaitMode};
