//! The boundary to whatever actually executes opcodes.

use thiserror::Error;

/// Failure raised by a processor while executing one opcode.
///
/// Opaque to the queue: only the message is kept, as the slot's result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProcessorError {
    message: String,
}

impl ProcessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ProcessorError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProcessorError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Sink for progress messages emitted while an opcode runs.
pub trait Feedback: Send + Sync {
    fn feedback(&self, message: &str);
}

/// Feedback sink that drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn feedback(&self, _message: &str) {}
}

impl<F> Feedback for F
where
    F: Fn(&str) + Send + Sync,
{
    fn feedback(&self, message: &str) {
        self(message)
    }
}

/// Executes a single opcode.
pub trait Processor: Send {
    fn execute(
        &mut self,
        opcode: &serde_json::Value,
        feedback: &dyn Feedback,
    ) -> Result<serde_json::Value, ProcessorError>;
}

/// Creates a fresh processor for each job a worker picks up.
pub trait ProcessorFactory: Send + Sync + 'static {
    fn new_processor(&self) -> Box<dyn Processor>;
}

impl<F, P> ProcessorFactory for F
where
    F: Fn() -> P + Send + Sync + 'static,
    P: Processor + 'static,
{
    fn new_processor(&self) -> Box<dyn Processor> {
        Box::new(self())
    }
}
