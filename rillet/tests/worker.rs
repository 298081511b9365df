mod common;

use common::{TIMEOUT, init_tracing, wait_until};
use rillet::{Disposable, Handle, ParallelScheduler, ParallelWorker, Scheduler, Worker};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

/// Occupies the worker's lane until the returned sender is used or dropped.
fn block_worker(worker: &ParallelWorker) -> (Handle, mpsc::Sender<()>) {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel();

    let handle = worker.schedule(move || {
        started_tx.send(()).unwrap();
        let _ = release_rx.recv();
    });

    started_rx.recv_timeout(TIMEOUT).unwrap();
    (handle, release_tx)
}

/// Waits until everything queued so far on a single-lane scheduler ran.
fn drain(scheduler: &ParallelScheduler) {
    let (done_tx, done_rx) = mpsc::channel();
    scheduler.schedule(move || done_tx.send(()).unwrap());
    done_rx.recv_timeout(TIMEOUT).unwrap();
}

#[test]
fn test_worker_runs_in_submission_order() {
    let scheduler = ParallelScheduler::new(4).unwrap();
    let worker = scheduler.create_worker();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..50 {
        let order = order.clone();
        worker.schedule(move || order.lock().unwrap().push(i));
    }

    assert!(wait_until(TIMEOUT, || order.lock().unwrap().len() == 50));
    assert_eq!(*order.lock().unwrap(), (0..50).collect::<Vec<_>>());
}

#[test]
fn test_worker_stays_on_one_lane() {
    let scheduler = ParallelScheduler::new(4).unwrap();
    let worker = scheduler.create_worker();
    let (tx, rx) = mpsc::channel();

    for _ in 0..10 {
        let tx = tx.clone();
        worker.schedule(move || {
            tx.send(thread::current().id()).unwrap();
        });
    }

    let lanes: HashSet<_> = (0..10)
        .map(|_| rx.recv_timeout(TIMEOUT).unwrap())
        .collect();
    assert_eq!(lanes.len(), 1);
}

#[test]
fn test_completed_tasks_leave_live_set() {
    init_tracing();
    let scheduler = ParallelScheduler::new(4).unwrap();
    let workers: Vec<_> = (0..4).map(|_| scheduler.create_worker()).collect();
    let counter = Arc::new(AtomicUsize::new(0));

    for i in 0..1000 {
        let counter = counter.clone();
        workers[i % 4].schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    assert!(wait_until(TIMEOUT, || counter.load(Ordering::SeqCst) == 1000));
    assert!(wait_until(TIMEOUT, || {
        workers.iter().all(|w| w.pending_count() == 0)
    }));
}

#[test]
fn test_pending_count_tracks_queued_tasks() {
    let scheduler = ParallelScheduler::new(1).unwrap();
    let worker = scheduler.create_worker();
    let (_blocker, release) = block_worker(&worker);

    let handles: Vec<_> = (0..3).map(|_| worker.schedule(|| {})).collect();
    assert_eq!(worker.pending_count(), 4);

    handles[1].dispose();
    assert_eq!(worker.pending_count(), 3);

    release.send(()).unwrap();
    assert!(wait_until(TIMEOUT, || worker.pending_count() == 0));
}

#[test]
fn test_shutdown_cancels_every_pending_task_once() {
    let scheduler = ParallelScheduler::new(1).unwrap();
    let worker = scheduler.create_worker();
    let (blocker, release) = block_worker(&worker);

    let ran = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ran = ran.clone();
            worker.schedule(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();
    assert_eq!(worker.pending_count(), 9);

    worker.shutdown();
    worker.shutdown();

    assert!(worker.is_shutdown());
    assert_eq!(worker.pending_count(), 0);
    assert!(blocker.is_disposed());
    assert!(handles.iter().all(|h| h.is_disposed()));

    release.send(()).unwrap();
    drain(&scheduler);

    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_shutdown_now_counts_each_pending_task() {
    let scheduler = ParallelScheduler::new(1).unwrap();
    let worker = scheduler.create_worker();
    let (_blocker, release) = block_worker(&worker);

    let handles: Vec<_> = (0..5).map(|_| worker.schedule(|| {})).collect();
    handles[2].dispose();
    assert_eq!(worker.pending_count(), 5);

    assert_eq!(worker.shutdown_now(), 5);
    assert_eq!(worker.shutdown_now(), 0);

    release.send(()).unwrap();
    drain(&scheduler);
}

#[test]
fn test_scheduler_shutdown_cancels_queued_worker_task() {
    init_tracing();
    let scheduler = ParallelScheduler::new(1).unwrap();
    let worker = scheduler.create_worker();
    let (blocker, release) = block_worker(&worker);

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let queued = worker.schedule(move || flag.store(true, Ordering::SeqCst));
    assert_eq!(worker.pending_count(), 2);

    scheduler.shutdown();

    assert!(queued.is_disposed());
    assert!(!blocker.is_disposed());
    assert_eq!(worker.pending_count(), 1);

    release.send(()).unwrap();
    scheduler.join();

    assert!(queued.is_disposed());
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(worker.pending_count(), 0);
    assert_eq!(worker.shutdown_now(), 0);
}

#[test]
fn test_schedule_after_worker_shutdown_is_rejected() {
    let scheduler = ParallelScheduler::new(2).unwrap();
    let worker = scheduler.create_worker();
    worker.shutdown();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let handle = worker.schedule(move || flag.store(true, Ordering::SeqCst));

    assert!(handle.is_rejected());
    assert!(handle.is_disposed());

    thread::sleep(Duration::from_millis(20));
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn test_worker_of_shut_down_scheduler_rejects() {
    let scheduler = ParallelScheduler::new(2).unwrap();
    scheduler.shutdown();

    let worker = scheduler.create_worker();

    assert!(worker.is_shutdown());
    assert_eq!(worker.shutdown_now(), 0);
    assert!(worker.schedule(|| {}).is_rejected());
}

#[test]
fn test_worker_on_terminated_lane_rejects() {
    let scheduler = ParallelScheduler::new(2).unwrap();
    let worker = scheduler.create_worker();

    scheduler.shutdown();

    assert!(worker.schedule(|| {}).is_rejected());
    assert_eq!(worker.pending_count(), 0);
}

#[test]
fn test_dispose_is_idempotent() {
    let scheduler = ParallelScheduler::new(1).unwrap();
    let worker = scheduler.create_worker();
    let (_blocker, release) = block_worker(&worker);

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let handle = worker.schedule(move || flag.store(true, Ordering::SeqCst));
    let other = handle.clone();

    handle.dispose();
    other.dispose();
    handle.dispose();

    assert!(handle.is_disposed());
    assert_eq!(worker.pending_count(), 1);

    release.send(()).unwrap();
    drain(&scheduler);
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn test_dispose_after_completion_is_noop() {
    let scheduler = ParallelScheduler::new(1).unwrap();
    let worker = scheduler.create_worker();

    let handle = worker.schedule(|| {});
    drain(&scheduler);

    handle.dispose();
    assert!(!handle.is_disposed());
    assert_eq!(worker.pending_count(), 0);
}

#[test]
fn test_drop_shuts_worker_down() {
    let scheduler = ParallelScheduler::new(1).unwrap();
    let worker = scheduler.create_worker();
    let (_blocker, release) = block_worker(&worker);

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let handle = worker.schedule(move || flag.store(true, Ordering::SeqCst));

    drop(worker);
    assert!(handle.is_disposed());

    release.send(()).unwrap();
    drain(&scheduler);
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn test_panicking_task_still_leaves_live_set() {
    let (tx, rx) = mpsc::channel();
    let scheduler = ParallelScheduler::builder()
        .lanes(1)
        .on_error_dropped(move |fault| {
            let _ = tx.send(fault.message().map(str::to_owned));
        })
        .build()
        .unwrap();
    let worker = scheduler.create_worker();

    worker.schedule(|| panic!("worker boom"));

    assert_eq!(
        rx.recv_timeout(TIMEOUT).unwrap().as_deref(),
        Some("worker boom")
    );
    assert_eq!(worker.pending_count(), 0);
}

#[test]
fn test_completion_racing_shutdown_loses_no_task() {
    init_tracing();

    for _ in 0..50 {
        let scheduler = ParallelScheduler::new(1).unwrap();
        let worker = scheduler.create_worker();

        let tasks: Vec<(Handle, Arc<AtomicBool>)> = (0..64)
            .map(|_| {
                let ran = Arc::new(AtomicBool::new(false));
                let flag = ran.clone();
                let handle = worker.schedule(move || flag.store(true, Ordering::SeqCst));
                (handle, ran)
            })
            .collect();

        worker.shutdown();
        drain(&scheduler);

        for (handle, ran) in &tasks {
            assert!(
                ran.load(Ordering::SeqCst) || handle.is_disposed(),
                "task neither ran nor was cancelled"
            );
        }
        assert_eq!(worker.pending_count(), 0);
    }
}

#[test]
fn test_shutdown_signals_match_unrun_tasks() {
    init_tracing();

    for _ in 0..50 {
        let scheduler = ParallelScheduler::new(1).unwrap();
        let worker = scheduler.create_worker();
        let ran = Arc::new(AtomicUsize::new(0));

        let handles: Vec<Handle> = (0..64)
            .map(|_| {
                let ran = ran.clone();
                worker.schedule(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        let signals = worker.shutdown_now();
        drain(&scheduler);

        let ran = ran.load(Ordering::SeqCst);
        let disposed = handles.iter().filter(|h| h.is_disposed()).count();

        assert_eq!(signals, disposed);
        // At most one task was already running when the signal landed.
        assert!(signals + ran == 64 || signals + ran == 65);
        assert_eq!(worker.shutdown_now(), 0);
    }
}
