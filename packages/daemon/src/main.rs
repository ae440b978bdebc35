//! Job queue daemon.
//!
//! Reads jobs from stdin, one per line, each a JSON array of opcodes. Every
//! accepted job id is printed as it is submitted. At end of input the queue
//! drains and the final query rows are printed as JSON.
//!
//! ```text
//! jqueued [FIELD...]        (default fields: id status result)
//! ```

use std::io::{BufRead, Write};
use std::process::ExitCode;

use jqueue::{JobQueue, QueueConfig};
use serde_json::Value;

mod handlers;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut fields: Vec<String> = std::env::args().skip(1).collect();
    if fields.is_empty() {
        fields = vec!["id".into(), "status".into(), "result".into()];
    }

    let config = QueueConfig::from_env()?;
    tracing::info!("Starting job queue with {} workers", config.worker_count);

    let registry = handlers::demo_registry();
    let queue = JobQueue::start_with_feedback(
        &config,
        move || registry.clone(),
        |msg: &str| tracing::info!("feedback: {}", msg),
    )?;

    let stdout = std::io::stdout();
    for (lineno, line) in std::io::stdin().lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let ops: Vec<Value> = match serde_json::from_str(&line) {
            Ok(ops) => ops,
            Err(e) => {
                tracing::warn!("Line {}: not a JSON array of opcodes: {}", lineno + 1, e);
                continue;
            }
        };

        match queue.submit(ops) {
            Ok(id) => writeln!(stdout.lock(), "{id}")?,
            Err(e) => tracing::warn!("Line {}: job rejected: {}", lineno + 1, e),
        }
    }

    queue.shutdown();

    let rows = queue.query(None, fields.as_slice())?;
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &rows)?;
    writeln!(out)?;

    tracing::info!("Job queue stopped");
    Ok(())
}
