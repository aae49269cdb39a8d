/*!
 * Event Primitive
 * Manual- and auto-reset signallable events
 *
 * # Architecture
 *
 * Every event owns one atomic state flag, one mutex, and one condition
 * variable. The atomic flag is the only field ever read outside the mutex;
 * it carries the lock-free probe and the signalled manual-reset fast path.
 * Everything else, including the registered-wait queue used by composite
 * waits, is serialized by the mutex.
 */

mod handle;
mod inner;

pub use handle::Event;

#[cfg(feature = "multiwait")]
pub(crate) use inner::purge_defunct;
