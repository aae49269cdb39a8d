/*!
 * Composite Waiter
 * The per-call object a composite wait parks on
 */

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize};

/// Mutable waiter state, guarded by the waiter mutex.
pub(crate) struct WaitState {
    /// Slot index of the event that completed a first-of wait.
    pub(crate) fired: Option<usize>,
}

/// One composite wait in flight.
///
/// Shared between the calling thread and every event holding an edge to it;
/// each holder owns one `Arc` clone, and the last drop frees the waiter.
/// Signallers probe `still_waiting` without the mutex and only commit to a
/// hand-off after re-checking it with the mutex held.
pub(crate) struct Waiter {
    pub(crate) lock: Mutex<WaitState>,
    pub(crate) cond: Condvar,
    /// All-of versus first-of. Immutable after construction.
    pub(crate) wait_all: bool,
    /// Latches false once the wait has decided its fate. Writers that
    /// intend to signal hold the mutex; readers may probe relaxed and skip.
    pub(crate) still_waiting: AtomicBool,
    /// All-of mode: events not yet signalled for this waiter. Counted
    /// edges decrement it, rollbacks increment it back.
    pub(crate) events_left: AtomicUsize,
}

impl Waiter {
    pub(crate) fn new(wait_all: bool, count: usize) -> Self {
        Self {
            lock: Mutex::new(WaitState { fired: None }),
            cond: Condvar::new(),
            wait_all,
            still_waiting: AtomicBool::new(true),
            events_left: AtomicUsize::new(if wait_all { count } else { 0 }),
        }
    }
}
