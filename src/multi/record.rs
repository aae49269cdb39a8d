/*!
 * Wait Record
 * The edge from an event to a registered composite wait
 */

use crate::multi::Waiter;
use std::sync::Arc;

/// One (event, waiter) edge, stored in the event's registered-wait queue
/// and mutated only under that event's mutex.
pub(crate) struct WaitRecord {
    /// The waiter to notify; this clone is the edge's keep-alive reference.
    pub(crate) waiter: Arc<Waiter>,
    /// Slot this event occupies in the waiter's input array.
    pub(crate) index: usize,
    /// All-of bookkeeping: whether this event currently counts as
    /// signalled for the waiter. Flips back when the signal it counted
    /// disappears before the waiter claims it.
    pub(crate) signalled: bool,
}
