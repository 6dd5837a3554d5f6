use quiesce::sync::SingleExecution;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_sequential_calls_run_once() {
    let once = SingleExecution::new();
    let mut counter = 0;

    once.execute_once(|| counter += 1);
    once.execute_once(|| counter += 1);
    once.execute_once(|| counter += 1);

    assert_eq!(counter, 1);
    assert!(once.is_finished());
}

#[test]
fn test_three_concurrent_callers_increment_once() {
    let once = Arc::new(SingleExecution::new());
    let counter = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(3));

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let once = once.clone();
            let counter = counter.clone();
            let barrier = barrier.clone();

            thread::spawn(move || {
                barrier.wait();
                once.execute_once(|| {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_losers_wait_for_completion() {
    let once = Arc::new(SingleExecution::new());
    let done = Arc::new(AtomicBool::new(false));
    let entered = Arc::new(Barrier::new(2));

    let winner = {
        let once = once.clone();
        let done = done.clone();
        let entered = entered.clone();

        thread::spawn(move || {
            once.execute_once(|| {
                entered.wait();
                thread::sleep(Duration::from_millis(50));
                done.store(true, Ordering::Relaxed);
            });
        })
    };

    // The winner is inside the action once the barrier releases.
    entered.wait();

    let losers: Vec<_> = (0..8)
        .map(|_| {
            let once = once.clone();
            let done = done.clone();

            thread::spawn(move || {
                once.execute_once(|| panic!("action must not run twice"));
                done.load(Ordering::Relaxed)
            })
        })
        .collect();

    for h in losers {
        assert!(h.join().unwrap(), "loser returned before the action finished");
    }
    winner.join().unwrap();
}

#[test]
fn test_many_callers_observe_effects() {
    const CALLERS: usize = 32;

    let once = Arc::new(SingleExecution::new());
    let value = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let once = once.clone();
            let value = value.clone();
            let barrier = barrier.clone();

            thread::spawn(move || {
                barrier.wait();
                once.execute_once(|| {
                    thread::sleep(Duration::from_millis(5));
                    value.store(42, Ordering::Relaxed);
                });
                value.load(Ordering::Relaxed)
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), 42);
    }
}

#[test]
fn test_static_guard() {
    static INIT: SingleExecution = SingleExecution::new();
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                INIT.execute_once(|| {
                    CALLS.fetch_add(1, Ordering::Relaxed);
                });
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert!(INIT.is_finished());
}
