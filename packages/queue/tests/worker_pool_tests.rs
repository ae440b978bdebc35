#![allow(clippy::disallowed_methods)]

use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jqueue::{QueueError, WorkerPool};
use parking_lot::Mutex;

#[test]
fn every_task_runs_exactly_once() -> Result<(), Box<dyn Error>> {
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    let pool = WorkerPool::new("pool", 4, move |_worker, task: u32| {
        sink.lock().push(task);
        Ok::<(), String>(())
    })?;
    assert_eq!(pool.worker_count(), 4);

    for task in 0..100 {
        pool.add_task(task)?;
    }
    pool.shutdown();

    let mut seen = seen.lock().clone();
    seen.sort();
    assert_eq!(seen, (0..100).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn errors_and_panics_do_not_kill_workers() -> Result<(), Box<dyn Error>> {
    let done = Arc::new(Mutex::new(Vec::new()));

    let sink = done.clone();
    let pool = WorkerPool::new("flaky", 1, move |_worker, task: u32| {
        match task % 3 {
            0 => Err(format!("task {task} failed")),
            1 => panic!("task {task} panicked"),
            _ => {
                sink.lock().push(task);
                Ok(())
            }
        }
    })?;

    for task in 0..9 {
        pool.add_task(task)?;
    }
    pool.shutdown();

    assert_eq!(*done.lock(), vec![2, 5, 8]);
    Ok(())
}

#[test]
fn tasks_spread_across_workers() -> Result<(), Box<dyn Error>> {
    let workers = Arc::new(Mutex::new(HashSet::new()));

    let sink = workers.clone();
    let pool = WorkerPool::new("spread", 3, move |worker, _task: ()| {
        sink.lock().insert(worker);
        std::thread::sleep(Duration::from_millis(20));
        Ok::<(), String>(())
    })?;

    for _ in 0..9 {
        pool.add_task(())?;
    }
    pool.shutdown();

    let workers = workers.lock();
    assert!(workers.len() > 1);
    assert!(workers.iter().all(|id| (1..=3).contains(id)));
    Ok(())
}

#[test]
fn shutdown_drains_then_rejects() -> Result<(), Box<dyn Error>> {
    let done = Arc::new(Mutex::new(0u32));

    let sink = done.clone();
    let pool = WorkerPool::new("drain", 2, move |_worker, _task: ()| {
        std::thread::sleep(Duration::from_millis(10));
        *sink.lock() += 1;
        Ok::<(), String>(())
    })?;

    for _ in 0..10 {
        pool.add_task(())?;
    }
    assert!(pool.is_accepting());

    pool.shutdown();
    assert_eq!(*done.lock(), 10);
    assert!(!pool.is_accepting());
    assert!(matches!(pool.add_task(()), Err(QueueError::ShutDown)));

    // A second shutdown is a no-op.
    pool.shutdown();
    Ok(())
}

#[test]
fn concurrent_shutdowns_both_wait_for_running_tasks() -> Result<(), Box<dyn Error>> {
    let started = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));

    let (started_flag, finished_flag) = (started.clone(), finished.clone());
    let pool = Arc::new(WorkerPool::new("slow", 1, move |_worker, _task: ()| {
        started_flag.store(true, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(300));
        finished_flag.store(true, Ordering::SeqCst);
        Ok::<(), String>(())
    })?);

    pool.add_task(())?;
    while !started.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(1));
    }

    let first = {
        let pool = pool.clone();
        std::thread::spawn(move || pool.shutdown())
    };
    std::thread::sleep(Duration::from_millis(20));

    pool.shutdown();
    assert!(finished.load(Ordering::SeqCst));

    first.join().map_err(|_| "first shutdown panicked")?;
    assert!(finished.load(Ordering::SeqCst));
    assert_eq!(pool.worker_count(), 0);
    Ok(())
}
