#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use jqueue::{
    FieldValue, Feedback, FnHandler, JobId, JobQueue, JobStatus, OpcodeRegistry, ProcessorError,
    QueueConfig,
};
use parking_lot::{Condvar, Mutex};
use serde_json::{Value, json};

/// A latch that blocks opcodes until the test opens it.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock() = true;
        self.cv.notify_all();
    }

    pub fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.cv.wait(&mut open);
        }
    }
}

/// Shared state observed by the test opcodes.
#[derive(Default)]
pub struct Harness {
    pub gate: Gate,
    pub counted: AtomicUsize,
}

impl Harness {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.counted.load(Ordering::SeqCst)
    }

    /// Registry with the test opcodes:
    /// - `OP_ECHO` returns its `msg`
    /// - `OP_FAIL` fails with its `msg`
    /// - `OP_COUNT` bumps the counter
    /// - `OP_WAIT` blocks on the gate
    /// - `OP_SLEEP` sleeps `ms` milliseconds
    /// - `OP_PANIC` panics
    /// - `OP_FEEDBACK` sends its `msg` to the feedback sink
    pub fn registry(self: &Arc<Self>) -> OpcodeRegistry {
        let mut registry = OpcodeRegistry::new();

        registry.register(FnHandler::new("OP_ECHO", |op: &Value, _: &dyn Feedback| {
            Ok(op.get("msg").cloned().unwrap_or(Value::Null))
        }));
        registry.register(FnHandler::new("OP_FAIL", |op: &Value, _: &dyn Feedback| {
            let msg = op.get("msg").and_then(Value::as_str).unwrap_or("failed");
            Err(ProcessorError::new(msg))
        }));

        let harness = self.clone();
        registry.register(FnHandler::new("OP_COUNT", move |_: &Value, _: &dyn Feedback| {
            harness.counted.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        }));

        let harness = self.clone();
        registry.register(FnHandler::new("OP_WAIT", move |_: &Value, _: &dyn Feedback| {
            harness.gate.wait();
            Ok(json!("released"))
        }));

        registry.register(FnHandler::new("OP_SLEEP", |op: &Value, _: &dyn Feedback| {
            let ms = op.get("ms").and_then(Value::as_u64).unwrap_or(10);
            std::thread::sleep(Duration::from_millis(ms));
            Ok(json!(ms))
        }));
        registry.register(FnHandler::new("OP_PANIC", |_: &Value, _: &dyn Feedback| {
            panic!("opcode blew up")
        }));
        registry.register(FnHandler::new("OP_FEEDBACK", |op: &Value, feedback: &dyn Feedback| {
            let msg = op.get("msg").and_then(Value::as_str).unwrap_or("");
            feedback.feedback(msg);
            Ok(Value::Null)
        }));

        registry
    }

    pub fn start_queue(self: &Arc<Self>, workers: usize) -> Result<JobQueue, jqueue::QueueError> {
        let registry = self.registry();
        let config = QueueConfig::default()
            .with_worker_count(workers)
            .with_thread_name("test");
        JobQueue::start(&config, move || registry.clone())
    }
}

pub fn op(op_id: &str) -> Value {
    json!({ "OP_ID": op_id })
}

pub fn op_with(op_id: &str, key: &str, value: Value) -> Value {
    let mut op = op(op_id);
    op[key] = value;
    op
}

/// Aggregate status of one job, or `None` if the queue does not know it.
pub fn status_of(queue: &JobQueue, id: JobId) -> Option<JobStatus> {
    let rows = queue.query(Some(&[id]), &["status"]).ok()?;
    match rows.into_iter().next()??.into_iter().next()? {
        FieldValue::Status(status) => Some(status),
        _ => None,
    }
}

/// Poll until `check` holds or five seconds pass.
pub fn wait_until(mut check: impl FnMut() -> bool) -> Result<(), String> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if check() {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    Err("condition not reached within 5s".to_string())
}
