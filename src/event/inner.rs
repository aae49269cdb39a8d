/*!
 * Event Internals
 * State machine, locking discipline, and signaller walks
 *
 * # Design: Atomic Flag Plus Mutex
 *
 * The signalled flag is an atomic so the two fast paths (zero-timeout probe,
 * already-signalled manual-reset wait) never touch the mutex. All mutation
 * happens with the mutex held; the atomic orderings on the fast paths are
 * the only ones that matter, everything under the mutex can be relaxed.
 *
 * # Lock order
 *
 * Signallers take the event mutex first and a registered waiter's mutex
 * second, never the other way around. Composite waits invert this during
 * registration, which is safe because their records are not yet visible to
 * signallers, and use try-locks during the claim step (see `multi::wait`).
 */

use crate::core::{WaitError, WaitResult};
#[cfg(feature = "multiwait")]
use crate::multi::{WaitRecord, Waiter};
use parking_lot::{Condvar, Mutex, MutexGuard};
#[cfg(feature = "multiwait")]
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "multiwait")]
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Composite waits registered with an event, oldest first. Signallers hand
/// signals to the front; departed waiters are purged lazily by whoever holds
/// the mutex next.
#[cfg(feature = "multiwait")]
pub(crate) type Registry = VecDeque<WaitRecord>;
#[cfg(not(feature = "multiwait"))]
pub(crate) type Registry = ();

/// Shared core of an event; handles hold it behind an `Arc`.
pub(crate) struct EventInner {
    /// Immutable after construction. A successful wait on an auto-reset
    /// event consumes the signal.
    pub(crate) auto_reset: bool,
    /// Whether the event is currently signalled. The only field read
    /// without holding the mutex.
    pub(crate) state: AtomicBool,
    /// Serializes all slow-path mutation and guards the registered waits.
    pub(crate) lock: Mutex<Registry>,
    cond: Condvar,
}

impl EventInner {
    pub(crate) fn new(auto_reset: bool, initially_set: bool) -> Self {
        Self {
            auto_reset,
            state: AtomicBool::new(initially_set),
            lock: Mutex::new(Registry::default()),
            cond: Condvar::new(),
        }
    }

    /// Blocks until the event is signalled or the timeout elapses.
    pub(crate) fn wait(&self, timeout: Option<Duration>) -> WaitResult<()> {
        // A signalled manual-reset event never needs the mutex. The relaxed
        // read filters the unsignalled case without a barrier; the acquire
        // re-read synchronizes with the producer's release store.
        if !self.auto_reset
            && self.state.load(Ordering::Relaxed)
            && self.state.load(Ordering::Acquire)
        {
            return Ok(());
        }

        // Zero-timeout probe. A stale negative is indistinguishable from
        // losing the race, so the relaxed read is enough.
        if timeout == Some(Duration::ZERO) && !self.state.load(Ordering::Relaxed) {
            return Err(WaitError::Timeout);
        }

        let mut waits = self.lock.lock();
        #[cfg(feature = "multiwait")]
        purge_defunct(&mut waits);
        self.wait_locked(&mut waits, timeout)
    }

    /// Slow-path wait. The event mutex is held on entry and on exit.
    fn wait_locked(
        &self,
        waits: &mut MutexGuard<'_, Registry>,
        timeout: Option<Duration>,
    ) -> WaitResult<()> {
        // Ordering under the mutex is supplied by the mutex.
        if !self.state.load(Ordering::Relaxed) {
            if timeout == Some(Duration::ZERO) {
                return Err(WaitError::Timeout);
            }

            // The absolute deadline is computed once; a deadline past the
            // end of the clock degrades to an infinite wait.
            let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
            loop {
                match deadline {
                    Some(at) => {
                        if self.cond.wait_until(waits, at).timed_out() {
                            return Err(WaitError::Timeout);
                        }
                    }
                    None => self.cond.wait(waits),
                }
                if self.state.load(Ordering::Relaxed) {
                    break;
                }
            }
        }

        if self.auto_reset {
            self.consume_locked(&mut **waits);
        }
        Ok(())
    }

    /// Flips a signalled auto-reset event back to unsignalled. Registered
    /// all-of waiters that had counted this signal are rolled back in the
    /// same critical section, so their remaining-event counts stay in step
    /// with reality.
    pub(crate) fn consume_locked(&self, waits: &mut Registry) {
        self.state.store(false, Ordering::Relaxed);
        #[cfg(feature = "multiwait")]
        roll_back_counted(waits, None);
        #[cfg(not(feature = "multiwait"))]
        let _ = waits;
    }

    /// Same as [`consume_locked`], for the waiter that is claiming the
    /// signal; its own count must not be rolled back.
    ///
    /// [`consume_locked`]: Self::consume_locked
    #[cfg(feature = "multiwait")]
    pub(crate) fn consume_locked_for(&self, waits: &mut Registry, winner: &Arc<Waiter>) {
        self.state.store(false, Ordering::Relaxed);
        roll_back_counted(waits, Some(winner));
    }

    /// Signals the event: wakes every waiter of a manual-reset event, hands
    /// the signal to exactly one consumer of an auto-reset event.
    pub(crate) fn set(&self) {
        #[cfg(feature = "multiwait")]
        let mut waits = self.lock.lock();
        #[cfg(not(feature = "multiwait"))]
        let waits = self.lock.lock();

        if self.auto_reset {
            #[cfg(feature = "multiwait")]
            {
                if self.transfer_signal(&mut waits) {
                    // A registered first-of waiter took the signal; the
                    // event stays unsignalled.
                    return;
                }
            }
            // No composite consumer claimed it. Publish the signal and wake
            // one single-event waiter; the release store pairs with the
            // acquire loads on the lock-free paths.
            self.state.store(true, Ordering::Release);
            drop(waits);
            self.cond.notify_one();
        } else {
            #[cfg(feature = "multiwait")]
            self.notify_registered(&mut waits);
            self.state.store(true, Ordering::Release);
            drop(waits);
            self.cond.notify_all();
        }
    }

    /// Returns the event to the unsignalled state. Racy against a
    /// concurrent `set` by contract; callers needing an ordering between
    /// the two must provide it themselves.
    pub(crate) fn reset(&self) {
        #[cfg(feature = "multiwait")]
        {
            let mut waits = self.lock.lock();
            self.state.store(false, Ordering::Relaxed);
            roll_back_counted(&mut waits, None);
        }
        #[cfg(not(feature = "multiwait"))]
        {
            let _waits = self.lock.lock();
            self.state.store(false, Ordering::Relaxed);
        }
    }

    /// Set immediately followed by reset. Which waiters observe the blink
    /// is timing-dependent; the event is always left unsignalled.
    #[cfg(feature = "pulse")]
    pub(crate) fn pulse(&self) {
        self.set();
        self.reset();
    }

    /// Current length of the registered-wait queue, for diagnostics only.
    #[cfg(feature = "multiwait")]
    pub(crate) fn registered_waits(&self) -> usize {
        self.lock.lock().len()
    }

    /// Auto-reset signal hand-off: walks the registered waits front to back
    /// looking for a live composite waiter to take the pending signal.
    ///
    /// All-of edges are counted and stay queued, since their waiter claims
    /// the actual signal later. A first-of edge takes the signal outright;
    /// whatever was counted before it in the walk is rolled back, because
    /// the signal it counted no longer exists.
    ///
    /// Returns true if the signal was handed to a first-of waiter.
    #[cfg(feature = "multiwait")]
    fn transfer_signal(&self, waits: &mut MutexGuard<'_, Registry>) -> bool {
        let mut idx = 0;
        while idx < waits.len() {
            // Cheap relaxed probe; departed waiters are reaped in passing
            // without taking their mutex.
            if !waits[idx].waiter.still_waiting.load(Ordering::Relaxed) {
                let _ = waits.remove(idx);
                continue;
            }

            let waiter = waits[idx].waiter.clone();
            let mut st = waiter.lock.lock();
            // The waiter may have departed between the probe and the lock.
            if !waiter.still_waiting.load(Ordering::Relaxed) {
                drop(st);
                let _ = waits.remove(idx);
                continue;
            }

            if waiter.wait_all {
                if !waits[idx].signalled {
                    waits[idx].signalled = true;
                    let left = waiter.events_left.fetch_sub(1, Ordering::AcqRel);
                    debug_assert!(left > 0);
                    if left == 1 {
                        drop(st);
                        waiter.cond.notify_one();
                    }
                }
                idx += 1;
                continue;
            }

            // First-of waiter: transfer the signal to exactly this one.
            st.fired = Some(waits[idx].index);
            waiter.still_waiting.store(false, Ordering::Relaxed);
            drop(st);
            waiter.cond.notify_one();
            let _ = waits.remove(idx);

            self.state.store(false, Ordering::Relaxed);
            roll_back_counted(waits, None);
            return true;
        }
        false
    }

    /// Manual-reset signal fan-out: every registered composite wait sees
    /// the event signalled. All-of edges are counted and stay queued so a
    /// later reset can be rolled back; first-of edges complete outright.
    #[cfg(feature = "multiwait")]
    fn notify_registered(&self, waits: &mut MutexGuard<'_, Registry>) {
        let mut idx = 0;
        while idx < waits.len() {
            if !waits[idx].waiter.still_waiting.load(Ordering::Relaxed) {
                let _ = waits.remove(idx);
                continue;
            }

            let waiter = waits[idx].waiter.clone();
            let mut st = waiter.lock.lock();
            if !waiter.still_waiting.load(Ordering::Relaxed) {
                drop(st);
                let _ = waits.remove(idx);
                continue;
            }

            if waiter.wait_all {
                if !waits[idx].signalled {
                    waits[idx].signalled = true;
                    let left = waiter.events_left.fetch_sub(1, Ordering::AcqRel);
                    debug_assert!(left > 0);
                    if left == 1 {
                        drop(st);
                        waiter.cond.notify_one();
                    }
                }
                idx += 1;
            } else {
                st.fired = Some(waits[idx].index);
                waiter.still_waiting.store(false, Ordering::Relaxed);
                drop(st);
                waiter.cond.notify_one();
                let _ = waits.remove(idx);
            }
        }
    }
}

/// Drops edges whose waiter has already departed. Runs on every slow path
/// that takes the event mutex, amortizing cleanup over normal traffic; no
/// dedicated reaper is needed. Dropping a record drops the edge's reference
/// to the waiter, and the last reference frees it.
#[cfg(feature = "multiwait")]
pub(crate) fn purge_defunct(waits: &mut Registry) {
    waits.retain(|rec| rec.waiter.still_waiting.load(Ordering::Relaxed));
}

/// Rolls back every counted all-of edge after the signal it was counting
/// disappeared: the edge is unmarked and the waiter's remaining-event count
/// is raised again. `keep` names the waiter that consumed the signal, whose
/// own bookkeeping must survive. Departed waiters are reaped in passing.
#[cfg(feature = "multiwait")]
pub(crate) fn roll_back_counted(waits: &mut Registry, keep: Option<&Arc<Waiter>>) {
    waits.retain_mut(|rec| {
        if !rec.waiter.still_waiting.load(Ordering::Relaxed) {
            return false;
        }
        if !rec.signalled || keep.map_or(false, |w| Arc::ptr_eq(w, &rec.waiter)) {
            return true;
        }

        let st = rec.waiter.lock.lock();
        if !rec.waiter.still_waiting.load(Ordering::Relaxed) {
            drop(st);
            return false;
        }
        rec.signalled = false;
        rec.waiter.events_left.fetch_add(1, Ordering::AcqRel);
        drop(st);
        true
    });
}
