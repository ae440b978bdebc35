//! Query projection fields and values.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{JobId, JobStatus, OpStatus, OpcodeResult, QueueError};

/// A field that can be requested from a job query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryField {
    Id,
    Status,
    /// Per-opcode results, `None` for opcodes that have not resolved.
    Result,
    /// The submitted opcode payloads.
    Ops,
    /// Per-opcode statuses.
    OpStatus,
    ReceivedTs,
    StartTs,
    EndTs,
}

impl QueryField {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryField::Id => "id",
            QueryField::Status => "status",
            QueryField::Result => "result",
            QueryField::Ops => "ops",
            QueryField::OpStatus => "opstatus",
            QueryField::ReceivedTs => "received_ts",
            QueryField::StartTs => "start_ts",
            QueryField::EndTs => "end_ts",
        }
    }

    /// Parse a list of field names, failing on the first unknown one.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, QueueError> {
        names.iter().map(|name| name.as_ref().parse()).collect()
    }
}

impl FromStr for QueryField {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(QueryField::Id),
            "status" => Ok(QueryField::Status),
            "result" => Ok(QueryField::Result),
            "ops" => Ok(QueryField::Ops),
            "opstatus" => Ok(QueryField::OpStatus),
            "received_ts" => Ok(QueryField::ReceivedTs),
            "start_ts" => Ok(QueryField::StartTs),
            "end_ts" => Ok(QueryField::EndTs),
            other => Err(QueueError::UnknownField(other.to_string())),
        }
    }
}

impl std::fmt::Display for QueryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One projected value in a query row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Id(JobId),
    Status(JobStatus),
    Results(Vec<Option<OpcodeResult>>),
    Ops(Vec<serde_json::Value>),
    OpStatuses(Vec<OpStatus>),
    Timestamp(Option<DateTime<Utc>>),
}

/// Values for the requested fields, in request order.
pub type JobRow = Vec<FieldValue>;
