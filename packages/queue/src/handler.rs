//! Opcode handler trait and a registry that dispatches on `OP_ID`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::processor::{Feedback, Processor, ProcessorError};

/// Key naming the opcode type inside an opcode payload.
pub const OP_ID_KEY: &str = "OP_ID";

/// Result type for opcode handlers.
pub type HandlerResult = Result<Value, ProcessorError>;

/// Trait for opcode handlers.
///
/// Implement this trait to define how opcodes of a specific type are executed.
pub trait OpcodeHandler: Send + Sync + 'static {
    /// The `OP_ID` this handler executes.
    fn op_id(&self) -> &str;

    /// Execute an opcode and return its result.
    fn handle(&self, opcode: &Value, feedback: &dyn Feedback) -> HandlerResult;
}

/// Registry for opcode handlers.
///
/// Also a [`Processor`]: each opcode is routed to the handler registered for
/// its `OP_ID`. Cloning is cheap, so one registry can back every worker.
#[derive(Clone, Default)]
pub struct OpcodeRegistry {
    handlers: HashMap<String, Arc<dyn OpcodeHandler>>,
}

impl OpcodeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an opcode type, replacing any previous one.
    pub fn register<H: OpcodeHandler>(&mut self, handler: H) {
        let op_id = handler.op_id().to_string();
        self.handlers.insert(op_id, Arc::new(handler));
    }

    /// Get the handler for an opcode type.
    pub fn get(&self, op_id: &str) -> Option<Arc<dyn OpcodeHandler>> {
        self.handlers.get(op_id).cloned()
    }

    pub fn has_handler(&self, op_id: &str) -> bool {
        self.handlers.contains_key(op_id)
    }

    /// List all registered opcode types.
    pub fn op_ids(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }
}

impl std::fmt::Debug for OpcodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpcodeRegistry")
            .field("op_ids", &self.op_ids())
            .finish()
    }
}

impl Processor for OpcodeRegistry {
    fn execute(&mut self, opcode: &Value, feedback: &dyn Feedback) -> HandlerResult {
        let op_id = opcode
            .get(OP_ID_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| ProcessorError::new(format!("opcode has no {OP_ID_KEY}: {opcode}")))?;

        let handler = self
            .get(op_id)
            .ok_or_else(|| ProcessorError::new(format!("unknown opcode {op_id}")))?;

        handler.handle(opcode, feedback)
    }
}

/// A simple function-based opcode handler.
pub struct FnHandler<F>
where
    F: Fn(&Value, &dyn Feedback) -> HandlerResult + Send + Sync + 'static,
{
    op_id: String,
    handler: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Value, &dyn Feedback) -> HandlerResult + Send + Sync + 'static,
{
    /// Create a new function-based handler.
    pub fn new(op_id: impl Into<String>, handler: F) -> Self {
        Self {
            op_id: op_id.into(),
            handler,
        }
    }
}

impl<F> OpcodeHandler for FnHandler<F>
where
    F: Fn(&Value, &dyn Feedback) -> HandlerResult + Send + Sync + 'static,
{
    fn op_id(&self) -> &str {
        &self.op_id
    }

    fn handle(&self, opcode: &Value, feedback: &dyn Feedback) -> HandlerResult {
        (self.handler)(opcode, feedback)
    }
}
