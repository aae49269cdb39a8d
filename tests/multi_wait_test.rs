/*!
 * Composite-Wait Integration Tests
 *
 * First-of and all-of semantics, atomic claiming of auto-reset sets,
 * rollback on reset, queue hygiene, and crossing all-of waits
 */

#![cfg(feature = "multiwait")]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use wakesync::{wait_all, wait_any, Event, WaitError};

#[test]
fn test_wait_all_claims_presignalled_set() {
    // Sixty-three auto-reset events, all set up front: the no-wait all-of
    // call must succeed and consume every one of them.
    let events: Vec<Event> = (0..63).map(|_| Event::new_auto(true)).collect();
    let refs: Vec<&Event> = events.iter().collect();

    assert!(wait_all(&refs, Some(Duration::ZERO)).is_ok());
    for event in &events {
        assert_eq!(event.try_wait(), Err(WaitError::Timeout));
    }
}

#[test]
fn test_failed_wait_all_consumes_nothing() {
    // Signalled, unsignalled, signalled: the all-of wait times out and the
    // two signalled events keep their signals.
    let events = [
        Event::new_auto(true),
        Event::new_auto(false),
        Event::new_auto(true),
    ];
    let refs: Vec<&Event> = events.iter().collect();

    assert_eq!(wait_all(&refs, Some(Duration::ZERO)), Err(WaitError::Timeout));

    assert!(events[0].try_wait().is_ok());
    assert_eq!(events[1].try_wait(), Err(WaitError::Timeout));
    assert!(events[2].try_wait().is_ok());

    // Once everything is set, the same call succeeds and drains the set.
    for event in &events {
        event.set();
    }
    assert!(wait_all(&refs, Some(Duration::ZERO)).is_ok());
    for event in &events {
        assert_eq!(event.try_wait(), Err(WaitError::Timeout));
    }
}

#[test]
fn test_wait_any_short_circuits_on_signalled_event() {
    // The sweep stops at the first signalled slot; later events are never
    // inspected closely enough to matter.
    let events = [
        Event::new_auto(false),
        Event::new_manual(true),
        Event::new_auto(true),
    ];
    let refs: Vec<&Event> = events.iter().collect();

    assert_eq!(wait_any(&refs, Some(Duration::ZERO)), Ok(1));
    // Manual-reset winner keeps its signal, the later auto-reset slot was
    // not consumed.
    assert!(events[1].try_wait().is_ok());
    assert!(events[2].try_wait().is_ok());
}

#[test]
fn test_wait_any_consumes_auto_reset_winner() {
    let events = [Event::new_auto(true), Event::new_auto(true)];
    let refs: Vec<&Event> = events.iter().collect();

    assert_eq!(wait_any(&refs, Some(Duration::ZERO)), Ok(0));
    assert_eq!(events[0].try_wait(), Err(WaitError::Timeout));
    assert!(events[1].try_wait().is_ok());
}

#[test]
fn test_wait_any_wakes_on_later_set() {
    let events: Vec<Event> = (0..3).map(|_| Event::new_auto(false)).collect();
    let movable: Vec<Event> = events.clone();

    let handle = thread::spawn(move || {
        let refs: Vec<&Event> = movable.iter().collect();
        wait_any(&refs, Some(Duration::from_secs(5)))
    });

    thread::sleep(Duration::from_millis(100));
    events[2].set();

    assert_eq!(handle.join().unwrap(), Ok(2));
    // The signal was transferred to the waiter, not left in the event.
    assert_eq!(events[2].try_wait(), Err(WaitError::Timeout));
}

#[test]
fn test_wait_all_blocks_until_last_event() {
    let a = Event::new_auto(false);
    let b = Event::new_auto(false);
    let finished = Arc::new(AtomicBool::new(false));

    let handle = {
        let (a, b, finished) = (a.clone(), b.clone(), finished.clone());
        thread::spawn(move || {
            let result = wait_all(&[&a, &b], Some(Duration::from_secs(5)));
            finished.store(true, Ordering::SeqCst);
            result
        })
    };

    thread::sleep(Duration::from_millis(50));
    a.set();
    thread::sleep(Duration::from_millis(150));
    assert!(!finished.load(Ordering::SeqCst), "one event must not satisfy an all-of wait");

    b.set();
    assert!(handle.join().unwrap().is_ok());
    assert!(finished.load(Ordering::SeqCst));

    // Both auto-reset events were consumed by the completed wait.
    assert_eq!(a.try_wait(), Err(WaitError::Timeout));
    assert_eq!(b.try_wait(), Err(WaitError::Timeout));
}

#[test]
fn test_wait_all_rolls_back_manual_reset() {
    // A manual-reset event that un-signals before the set completes must
    // put the all-of wait back to sleep instead of letting it pass.
    let m = Event::new_manual(true);
    let gate = Event::new_auto(false);
    let finished = Arc::new(AtomicBool::new(false));

    let handle = {
        let (m, gate, finished) = (m.clone(), gate.clone(), finished.clone());
        thread::spawn(move || {
            let result = wait_all(&[&m, &gate], Some(Duration::from_secs(5)));
            finished.store(true, Ordering::SeqCst);
            result
        })
    };

    thread::sleep(Duration::from_millis(50));
    m.reset();
    gate.set();
    thread::sleep(Duration::from_millis(150));
    assert!(!finished.load(Ordering::SeqCst), "a reset slot must keep the wait blocked");

    m.set();
    assert!(handle.join().unwrap().is_ok());
}

#[test]
fn test_wait_all_mixed_kinds() {
    let manual = Event::new_manual(true);
    let auto = Event::new_auto(true);

    assert!(wait_all(&[&manual, &auto], Some(Duration::ZERO)).is_ok());
    // Only the auto-reset member is consumed by the claim.
    assert!(manual.try_wait().is_ok());
    assert_eq!(auto.try_wait(), Err(WaitError::Timeout));
}

#[test]
fn test_timed_out_waits_are_purged() {
    let e = Event::new_auto(false);
    let refs = [&e];

    for _ in 0..50 {
        assert_eq!(wait_any(&refs, Some(Duration::from_millis(1))), Err(WaitError::Timeout));
        // Each registration sweeps out the previous departed waiter, so the
        // queue never accumulates.
        assert!(e.registered_waits() <= 2);
    }

    // A signal hand-off walk reaps the last straggler.
    e.set();
    assert_eq!(e.registered_waits(), 0);
    assert!(e.try_wait().is_ok());
}

#[test]
fn test_signal_transfers_to_exactly_one_of_two_any_waits() {
    let e = Event::new_auto(false);
    let successes = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let e = e.clone();
            let successes = successes.clone();
            thread::spawn(move || {
                if wait_any(&[&e], Some(Duration::from_millis(500))).is_ok() {
                    successes.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(100));
    e.set();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(successes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_crossing_wait_alls_make_progress() {
    // Two all-of waits over the same pair in opposite orders, with a third
    // thread feeding signals: both must eventually complete.
    let e0 = Event::new_auto(false);
    let e1 = Event::new_auto(false);
    let completions = Arc::new(AtomicUsize::new(0));

    let forward = {
        let (e0, e1, completions) = (e0.clone(), e1.clone(), completions.clone());
        thread::spawn(move || {
            wait_all(&[&e0, &e1], None).unwrap();
            completions.fetch_add(1, Ordering::SeqCst);
        })
    };
    let backward = {
        let (e0, e1, completions) = (e0.clone(), e1.clone(), completions.clone());
        thread::spawn(move || {
            wait_all(&[&e1, &e0], None).unwrap();
            completions.fetch_add(1, Ordering::SeqCst);
        })
    };

    let deadline = Instant::now() + Duration::from_secs(10);
    while completions.load(Ordering::SeqCst) < 2 {
        assert!(Instant::now() < deadline, "crossing all-of waits starved each other");
        e0.set();
        e1.set();
        thread::sleep(Duration::from_millis(1));
    }

    forward.join().unwrap();
    backward.join().unwrap();
}

#[test]
fn test_wait_any_timeout_reports_elapsed() {
    let events = [Event::new_auto(false), Event::new_manual(false)];
    let refs: Vec<&Event> = events.iter().collect();

    let start = Instant::now();
    assert_eq!(
        wait_any(&refs, Some(Duration::from_millis(50))),
        Err(WaitError::Timeout)
    );
    assert!(start.elapsed() >= Duration::from_millis(50));
}
