/*!
 * Event Handle
 * Public cloneable handle over the shared event core
 */

use crate::core::WaitResult;
use crate::event::inner::EventInner;
use log::trace;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// A waitable event.
///
/// An auto-reset event hands each signal to exactly one waiter: a
/// successful wait consumes the signal. A manual-reset event keeps its
/// signal until an explicit [`reset`], releasing every waiter in the
/// meantime.
///
/// Clones share one underlying event and are the intended way to hand it to
/// other threads. The event is torn down when the last clone drops; waits
/// borrow the handle, so teardown cannot race an in-flight wait.
///
/// # Examples
///
/// ```
/// use wakesync::Event;
/// use std::time::Duration;
///
/// let event = Event::new_auto(false);
/// let waiter = event.clone();
///
/// let handle = std::thread::spawn(move || waiter.wait(None));
/// event.set();
/// assert!(handle.join().unwrap().is_ok());
/// ```
///
/// [`reset`]: Event::reset
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    /// Creates an auto-reset event. `initially_set` behaves exactly like a
    /// `set` performed before the first wait.
    pub fn new_auto(initially_set: bool) -> Self {
        Self::new(true, initially_set)
    }

    /// Creates a manual-reset event.
    pub fn new_manual(initially_set: bool) -> Self {
        Self::new(false, initially_set)
    }

    fn new(auto_reset: bool, initially_set: bool) -> Self {
        trace!(
            "event created: auto_reset={} initially_set={}",
            auto_reset,
            initially_set
        );
        Self {
            inner: Arc::new(EventInner::new(auto_reset, initially_set)),
        }
    }

    /// Signals the event.
    ///
    /// Auto-reset: at most one waiter is released; with no waiter the
    /// signal is stored for the next one. Manual-reset: all current and
    /// future waiters are released until [`reset`].
    ///
    /// [`reset`]: Event::reset
    pub fn set(&self) {
        self.inner.set();
    }

    /// Returns the event to the unsignalled state.
    ///
    /// No ordering is promised against a concurrent [`set`]; callers who
    /// need one must provide it externally.
    ///
    /// [`set`]: Event::set
    pub fn reset(&self) {
        self.inner.reset();
    }

    /// Signals and immediately unsignals the event.
    ///
    /// Which waiters observe the blink is timing-dependent and must not be
    /// relied upon; the only guarantee is that the event ends unsignalled.
    #[cfg(feature = "pulse")]
    pub fn pulse(&self) {
        self.inner.pulse();
    }

    /// Blocks until the event is signalled or the timeout elapses.
    ///
    /// `None` waits forever. `Some(Duration::ZERO)` probes without
    /// blocking and may report a stale timeout under contention, which is
    /// indistinguishable from losing the race.
    pub fn wait(&self, timeout: Option<Duration>) -> WaitResult<()> {
        self.inner.wait(timeout)
    }

    /// Non-blocking probe; shorthand for `wait(Some(Duration::ZERO))`.
    pub fn try_wait(&self) -> WaitResult<()> {
        self.inner.wait(Some(Duration::ZERO))
    }

    /// Number of composite waits currently registered with this event.
    /// Observational only; the value may be stale by the time it returns.
    #[cfg(feature = "multiwait")]
    pub fn registered_waits(&self) -> usize {
        self.inner.registered_waits()
    }

    pub(crate) fn inner(&self) -> &EventInner {
        &self.inner
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("auto_reset", &self.inner.auto_reset)
            .field("set", &self.inner.state.load(Ordering::Relaxed))
            .finish()
    }
}
