//! Job domain types: identifiers, opcode slots and status values.

use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier for a job, allocated by the queue in strictly increasing order.
///
/// Ordering is numeric, so `JobId(2) < JobId(10)`. On the wire the id is a
/// decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl JobId {
    /// The id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl Serialize for JobId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Execution status of a single opcode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpStatus {
    /// Not started yet. Opcodes after a failed one stay here for good.
    #[default]
    Queued,
    Running,
    Success,
    Error,
}

impl OpStatus {
    /// Check if the opcode has finished, successfully or not.
    pub fn is_resolved(self) -> bool {
        matches!(self, OpStatus::Success | OpStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OpStatus::Queued => "queued",
            OpStatus::Running => "running",
            OpStatus::Success => "success",
            OpStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for OpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate status of a job, derived from its opcode statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Success,
    Error,
}

impl JobStatus {
    /// Derive the job status from the statuses of its opcodes.
    ///
    /// Every opcode successful gives `Success`. Otherwise the highest of
    /// `Error`, `Running`, `Queued` present among the opcodes wins, so a job
    /// holding both a successful and a failed opcode reports `Error`.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = OpStatus>,
    {
        let mut all_success = true;
        let mut any_running = false;

        for status in statuses {
            match status {
                OpStatus::Success => {}
                OpStatus::Error => return JobStatus::Error,
                OpStatus::Running => {
                    all_success = false;
                    any_running = true;
                }
                OpStatus::Queued => all_success = false,
            }
        }

        if all_success {
            JobStatus::Success
        } else if any_running {
            JobStatus::Running
        } else {
            JobStatus::Queued
        }
    }

    /// Check if the job will not change status any more.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome stored in a resolved opcode slot.
///
/// Serialized untagged: either the processor's output, or the error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpcodeResult {
    Output(serde_json::Value),
    Error(String),
}

impl OpcodeResult {
    pub fn is_error(&self) -> bool {
        matches!(self, OpcodeResult::Error(_))
    }
}

/// An opcode together with its execution state.
///
/// Holds no synchronization of its own; the owning job guards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpcodeSlot {
    /// The submitted opcode payload.
    pub input: serde_json::Value,
    pub status: OpStatus,
    /// Set once the opcode has resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OpcodeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ts: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ts: Option<DateTime<Utc>>,
}

impl OpcodeSlot {
    /// Wrap a freshly submitted opcode.
    pub fn new(input: serde_json::Value) -> Self {
        Self {
            input,
            status: OpStatus::Queued,
            result: None,
            start_ts: None,
            end_ts: None,
        }
    }

    /// Move the slot from `Queued` to `Running`.
    pub fn mark_running(&mut self, now: DateTime<Utc>) {
        debug_assert_eq!(self.status, OpStatus::Queued);
        self.status = OpStatus::Running;
        self.start_ts = Some(now);
    }

    /// Resolve a running slot with the processor's output.
    pub fn mark_success(&mut self, output: serde_json::Value, now: DateTime<Utc>) {
        debug_assert_eq!(self.status, OpStatus::Running);
        self.status = OpStatus::Success;
        self.result = Some(OpcodeResult::Output(output));
        self.end_ts = Some(now);
    }

    /// Resolve a running slot with a failure description.
    pub fn mark_error(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        debug_assert_eq!(self.status, OpStatus::Running);
        self.status = OpStatus::Error;
        self.result = Some(OpcodeResult::Error(message.into()));
        self.end_ts = Some(now);
    }
}
