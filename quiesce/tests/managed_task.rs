use quiesce::StartError;
use quiesce::task::{ManagedTask, Priority, TaskBuilder};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

fn poll_until_quit(handle: &quiesce::task::TaskHandle) {
    while !handle.should_quit() {
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_start_then_stop() {
    let task = ManagedTask::new();
    let worked = Arc::new(AtomicBool::new(false));
    let w = worked.clone();

    task.start(&TaskBuilder::new().name("start-stop"), move |handle| {
        if handle.should_quit() {
            return;
        }
        w.store(true, Ordering::Relaxed);
        poll_until_quit(handle);
    })
    .unwrap();

    assert!(task.is_running());
    assert!(!task.should_quit());

    task.stop();

    assert!(!task.is_running());
    assert!(task.should_quit());
}

#[test]
fn test_stop_immediately_after_start_terminates() {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let task = TaskBuilder::new()
            .spawn(|handle| {
                if handle.should_quit() {
                    return;
                }
                poll_until_quit(handle);
            })
            .unwrap();

        task.stop();
        tx.send(task.is_running()).unwrap();
    });

    let running = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("stop did not return in bounded time");
    assert!(!running);
}

#[test]
fn test_concurrent_stop_single_teardown() {
    let exits = Arc::new(AtomicUsize::new(0));
    let e = exits.clone();

    let task = Arc::new(
        TaskBuilder::new()
            .name("double-stop")
            .spawn(move |handle| {
                poll_until_quit(handle);
                thread::sleep(Duration::from_millis(20));
                e.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap(),
    );

    let barrier = Arc::new(Barrier::new(2));
    let stoppers: Vec<_> = (0..2)
        .map(|_| {
            let task = task.clone();
            let barrier = barrier.clone();
            let exits = exits.clone();
            thread::spawn(move || {
                barrier.wait();
                task.stop();
                // Both callers return only after the body has exited.
                exits.load(Ordering::Relaxed)
            })
        })
        .collect();

    for h in stoppers {
        assert_eq!(h.join().unwrap(), 1);
    }
    assert!(!task.is_running());

    task.stop();
    assert_eq!(exits.load(Ordering::Relaxed), 1);
}

#[test]
fn test_start_with_copies_stack_context() {
    let received = Arc::new(AtomicUsize::new(0));
    let r = received.clone();

    let task = {
        let on_stack = vec![1usize, 2, 3, 4];

        TaskBuilder::new()
            .spawn_with(&on_stack, move |handle, handoff| {
                let sum = handoff.receive(|values| values.iter().sum::<usize>());
                r.store(sum, Ordering::Relaxed);
                poll_until_quit(handle);
            })
            .unwrap()
        // `on_stack` is dropped here, after the handshake.
    };

    assert_eq!(received.load(Ordering::Relaxed), 10);
    task.stop();
}

#[test]
fn test_start_blocks_until_handoff() {
    let released = Arc::new(AtomicBool::new(false));
    let r = released.clone();
    let value = String::from("config");

    let task = ManagedTask::new();
    task.start_with(&TaskBuilder::new(), &value, move |handle, handoff| {
        thread::sleep(Duration::from_millis(30));
        r.store(true, Ordering::Release);
        let copy = handoff.cloned();
        assert_eq!(copy, "config");
        poll_until_quit(handle);
    })
    .unwrap();

    assert!(released.load(Ordering::Acquire));
    task.stop();
}

#[test]
fn test_forgotten_handoff_does_not_hang_start() {
    let task = TaskBuilder::new()
        .spawn_with(&7u32, |_handle, handoff| {
            std::mem::forget(handoff);
        })
        .unwrap();

    task.stop();
    assert!(!task.is_running());
}

#[test]
fn test_body_exit_clears_running() {
    let task = TaskBuilder::new().spawn(|_handle| {}).unwrap();

    while task.is_running() {
        thread::sleep(Duration::from_millis(1));
    }

    task.stop();
    assert!(!task.is_running());
}

#[test]
fn test_invalid_name_leaves_task_retryable() {
    let task = ManagedTask::new();

    let err = task
        .start(&TaskBuilder::new().name("bad\0name"), |_| {})
        .unwrap_err();
    assert!(matches!(err, StartError::InvalidName { .. }));
    assert_eq!(err.as_label(), "start_invalid_name");
    assert!(!task.is_running());
    assert!(task.should_quit());

    task.start(&TaskBuilder::new().name("good"), poll_until_quit)
        .unwrap();
    assert!(task.is_running());
    task.stop();
}

#[test]
fn test_second_start_is_rejected() {
    let task = TaskBuilder::new().spawn(poll_until_quit).unwrap();

    let err = task.start(&TaskBuilder::new(), |_| {}).unwrap_err();
    assert!(matches!(err, StartError::AlreadyStarted));

    task.stop();

    let err = task.start(&TaskBuilder::new(), |_| {}).unwrap_err();
    assert!(matches!(err, StartError::AlreadyStarted));
}

#[test]
fn test_never_started_defaults() {
    let task = ManagedTask::new();

    assert!(task.should_quit());
    assert!(!task.is_running());

    task.stop();
}

#[test]
fn test_detach_makes_body_quit() {
    let (tx, rx) = mpsc::channel();

    let task = TaskBuilder::new()
        .name("detached")
        .spawn(move |handle| {
            poll_until_quit(handle);
            tx.send(handle.is_running()).unwrap();
        })
        .unwrap();

    task.detach();

    let running = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("detached body never observed should_quit");
    assert!(!running);
}

#[test]
fn test_panicking_body_still_stops() {
    let task = TaskBuilder::new()
        .name("panicky")
        .spawn(|_handle| panic!("task body failure"))
        .unwrap();

    task.stop();
    assert!(!task.is_running());
}

#[test]
fn test_drop_stops_running_task() {
    let exited = Arc::new(AtomicBool::new(false));
    let e = exited.clone();

    let task = TaskBuilder::new()
        .spawn(move |handle| {
            poll_until_quit(handle);
            e.store(true, Ordering::Release);
        })
        .unwrap();

    drop(task);
    assert!(exited.load(Ordering::Acquire));
}

#[test]
fn test_builder_parameters_are_best_effort() {
    let name = Arc::new(std::sync::Mutex::new(None));
    let n = name.clone();

    let task = TaskBuilder::new()
        .name("tuned")
        .stack_size(256 * 1024)
        .priority(Priority::BelowNormal)
        .affinity(0)
        .spawn(move |handle| {
            *n.lock().unwrap() = thread::current().name().map(str::to_owned);
            poll_until_quit(handle);
        })
        .unwrap();

    task.stop();
    assert_eq!(name.lock().unwrap().as_deref(), Some("tuned"));
}

#[test]
fn test_stop_during_start_waits_for_handshake() {
    let task = Arc::new(ManagedTask::new());
    let runs = Arc::new(AtomicUsize::new(0));
    let (entered_tx, entered_rx) = mpsc::channel();

    let starter = {
        let task = task.clone();
        let runs = runs.clone();
        thread::spawn(move || {
            let context = 5u32;
            task.start_with(&TaskBuilder::new(), &context, move |handle, handoff| {
                runs.fetch_add(1, Ordering::Relaxed);
                entered_tx.send(()).unwrap();
                // Hold the handoff so the starter stays blocked.
                thread::sleep(Duration::from_millis(50));
                assert_eq!(handoff.cloned(), 5);
                poll_until_quit(handle);
            })
        })
    };

    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("task body never ran");

    let stopper = {
        let task = task.clone();
        thread::spawn(move || task.stop())
    };

    stopper.join().unwrap();
    starter.join().unwrap().unwrap();

    assert!(!task.is_running());
    assert!(task.should_quit());
    assert_eq!(runs.load(Ordering::Relaxed), 1);
}
