//! Demo opcode handlers.

use std::time::Duration;

use jqueue::{Feedback, FnHandler, OpcodeRegistry, ProcessorError};
use serde_json::Value;

/// Registry with the test opcodes the daemon understands.
pub fn demo_registry() -> OpcodeRegistry {
    let mut registry = OpcodeRegistry::new();

    // Echo: returns `msg`, or the whole opcode when there is none
    registry.register(FnHandler::new(
        "OP_TEST_ECHO",
        |op: &Value, _: &dyn Feedback| Ok(op.get("msg").cloned().unwrap_or_else(|| op.clone())),
    ));

    // Delay: sleeps `duration` seconds, reporting progress
    registry.register(FnHandler::new(
        "OP_TEST_DELAY",
        |op: &Value, feedback: &dyn Feedback| {
            let seconds = op.get("duration").and_then(Value::as_f64).unwrap_or(1.0);
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ProcessorError::new(format!("invalid duration {seconds}")));
            }
            feedback.feedback(&format!("sleeping for {seconds}s"));
            std::thread::sleep(Duration::from_secs_f64(seconds));
            Ok(Value::Bool(true))
        },
    ));

    // Fail: always fails with `msg`
    registry.register(FnHandler::new(
        "OP_TEST_FAIL",
        |op: &Value, _: &dyn Feedback| {
            let msg = op
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("Intentional failure");
            Err(ProcessorError::new(msg))
        },
    ));

    registry
}
