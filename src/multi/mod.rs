/*!
 * Composite Waits
 * Wait on several events at once, first-of or all-of
 *
 * # Architecture
 *
 * Each call builds one short-lived waiter object, registers an edge with
 * every event it must sleep on, and parks on its own condition variable
 * until a signaller satisfies its predicate or the deadline expires. Edges
 * keep the waiter alive after the call returns; whoever drops the last one
 * frees it. The all-of mode claims its full event set in one atomic step,
 * so a timed-out or competing wait never half-consumes anything.
 */

mod record;
mod wait;
mod waiter;

pub use wait::{wait_all, wait_any, wait_multiple, WaitMode};

pub(crate) use record::WaitRecord;
pub(crate) use waiter::Waiter;
