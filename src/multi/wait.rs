/*!
 * Composite Wait Entry Points
 * Registration sweep, blocking loop, and the all-of claim protocol
 *
 * # Design: Claim Late, Never Half-Consume
 *
 * The registration sweep records which events are already signalled but
 * consumes nothing in all-of mode. Only once every slot is signalled does
 * the waiter claim the full set, holding every event mutex at once so the
 * states it verified cannot shift under it. A claim that loses a race
 * releases everything and goes back to sleep, leaving each event exactly as
 * it found it.
 *
 * Lock acquisition during the claim is trylock-only, in slot order, with a
 * release-all-and-retry on collision. Two claims over the same events in
 * different orders therefore cannot deadlock; they can only make each other
 * retry, which ends as soon as one of them wins.
 */

use crate::core::{limits, WaitError, WaitResult};
use crate::event::{purge_defunct, Event};
use crate::multi::{WaitRecord, Waiter};
use log::trace;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Completion mode of a composite wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Wake when the first event of the set is signalled.
    Any,
    /// Wake when every event of the set is signalled at once.
    All,
}

/// Waits until any one of `events` is signalled, returning its index.
///
/// An auto-reset event that completes the wait is consumed; the remaining
/// events are left untouched. Which index wins when several events are
/// signalled is unspecified.
pub fn wait_any(events: &[&Event], timeout: Option<Duration>) -> WaitResult<usize> {
    wait_multiple(events, WaitMode::Any, timeout)
}

/// Waits until all of `events` are signalled at the same time.
///
/// On success every auto-reset event of the set is consumed as one atomic
/// step. On timeout nothing is consumed, even if some events were
/// signalled along the way.
pub fn wait_all(events: &[&Event], timeout: Option<Duration>) -> WaitResult<()> {
    wait_multiple(events, WaitMode::All, timeout).map(|_| ())
}

/// Composite wait over `events` in the given mode.
///
/// The returned index identifies the completing event in [`WaitMode::Any`];
/// in [`WaitMode::All`] it is meaningless and always zero. Each event may
/// appear at most once per call, and the set must not be empty.
pub fn wait_multiple(
    events: &[&Event],
    mode: WaitMode,
    timeout: Option<Duration>,
) -> WaitResult<usize> {
    debug_assert!(!events.is_empty(), "composite wait over an empty event set");
    debug_assert!(
        distinct(events),
        "an event may appear only once per composite wait"
    );
    trace!("composite wait: {} events, {:?}", events.len(), mode);

    let wait_all = mode == WaitMode::All;
    let waiter = Arc::new(Waiter::new(wait_all, events.len()));
    let mut st = waiter.lock.lock();

    let mut done = false;
    let mut pre_signalled = 0usize;

    // Registration sweep: record interest with every event that is not
    // already decisive, purging departed waits while the lock is held
    // anyway. All-of mode copies the observed state into the edge without
    // consuming anything; the claim below takes the whole set at once.
    for (i, event) in events.iter().enumerate() {
        let inner = event.inner();

        // A signalled manual-reset event ends a first-of sweep without its
        // mutex; relaxed filters, acquire pairs with the producer's
        // release store.
        if !wait_all
            && !inner.auto_reset
            && inner.state.load(Ordering::Relaxed)
            && inner.state.load(Ordering::Acquire)
        {
            st.fired = Some(i);
            done = true;
            break;
        }

        let mut waits = inner.lock.lock();
        purge_defunct(&mut waits);

        let signalled = inner.state.load(Ordering::Relaxed);
        if signalled && !wait_all {
            if inner.auto_reset {
                inner.consume_locked(&mut waits);
            }
            st.fired = Some(i);
            done = true;
            break;
        }

        if signalled {
            pre_signalled += 1;
        }
        waits.push_back(WaitRecord {
            waiter: waiter.clone(),
            index: i,
            signalled,
        });
    }

    // Settle the pre-signalled slots in one subtraction; signallers and
    // rollbacks may have been adjusting the counter since registration and
    // every adjustment pairs with exactly one edge transition.
    if wait_all && pre_signalled > 0 {
        waiter
            .events_left
            .fetch_sub(pre_signalled, Ordering::AcqRel);
    }

    // An all-of wait satisfied during the sweep still has to claim its
    // events before the no-wait short-circuit below may declare a timeout.
    if !done && wait_all && waiter.events_left.load(Ordering::Acquire) == 0 {
        drop(st);
        done = claim_all(events, &waiter);
        st = waiter.lock.lock();
    }

    let mut result = Ok(());
    let mut deadline = None;
    if !done {
        match timeout {
            Some(Duration::ZERO) => result = Err(WaitError::Timeout),
            Some(t) => deadline = Instant::now().checked_add(t),
            None => {}
        }
    }

    while !done && result.is_ok() {
        let satisfied = if wait_all {
            waiter.events_left.load(Ordering::Acquire) == 0
        } else {
            st.fired.is_some()
        };

        if satisfied {
            if wait_all {
                // The claim takes event mutexes, so the waiter mutex must
                // not be held across it: a signaller blocked on this
                // waiter while holding an event mutex would starve the
                // trylock sweep forever.
                drop(st);
                let claimed = claim_all(events, &waiter);
                st = waiter.lock.lock();
                if !claimed {
                    // A competing consumer stole one of the counted
                    // signals and rolled our count back up; re-evaluate.
                    continue;
                }
            }
            done = true;
            break;
        }

        match deadline {
            Some(at) => {
                if waiter.cond.wait_until(&mut st, at).timed_out() {
                    result = Err(WaitError::Timeout);
                }
            }
            None => waiter.cond.wait(&mut st),
        }
    }

    let fired = st.fired;
    // Latch departure with the mutex held; signallers that saw true through
    // the relaxed probe re-check under this mutex before committing.
    waiter.still_waiting.store(false, Ordering::Relaxed);
    drop(st);

    result.map(|_| fired.unwrap_or(0))
}

/// Claims every event of a satisfied all-of wait in one atomic step.
///
/// Trylocks the whole set in slot order; any collision releases everything
/// acquired in the pass and retries. With all locks held the states are
/// re-verified, since a competing consumer may have stolen a signal between
/// the counter hitting zero and the locks landing; a failed verify consumes
/// nothing. On success every auto-reset event is consumed and the all-of
/// bookkeeping of competing waiters is rolled back under the same locks.
fn claim_all(events: &[&Event], waiter: &Arc<Waiter>) -> bool {
    'sweep: loop {
        let mut guards = Vec::with_capacity(events.len());
        for event in events {
            match event.inner().lock.try_lock() {
                Some(guard) => guards.push(guard),
                None => {
                    drop(guards);
                    for _ in 0..limits::CLAIM_BACKOFF_SPINS {
                        std::hint::spin_loop();
                    }
                    continue 'sweep;
                }
            }
        }

        // The mutexes order these reads.
        if events
            .iter()
            .any(|event| !event.inner().state.load(Ordering::Relaxed))
        {
            return false;
        }

        for (event, guard) in events.iter().zip(guards.iter_mut()) {
            if event.inner().auto_reset {
                event.inner().consume_locked_for(&mut **guard, waiter);
            }
        }
        return true;
    }
}

fn distinct(events: &[&Event]) -> bool {
    events.iter().enumerate().all(|(i, event)| {
        events[..i]
            .iter()
            .all(|prior| !std::ptr::eq(prior.inner(), event.inner()))
    })
}
