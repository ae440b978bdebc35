//! Mapping between the internal vCPU record and QMP wire objects.
//!
//! Stateless. The record itself round-trips through serde with its own
//! field names; the two QMP shapes use hyphenated keys:
//!
//! - `device_add` arguments: `{id, driver, socket-id, core-id, thread-id}`
//! - `query-hotpluggable-cpus` entries: `{type, props: {socket-id, core-id, thread-id}}`

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcpuError {
    #[error("malformed vcpu object: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A hot-pluggable virtual CPU as tracked in the instance runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QmpVcpu {
    pub cpu_id: String,
    pub driver: String,
    pub socket_id: i64,
    pub core_id: i64,
    pub thread_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeviceAddArgs {
    id: String,
    driver: String,
    #[serde(rename = "socket-id")]
    socket_id: i64,
    #[serde(rename = "core-id")]
    core_id: i64,
    #[serde(rename = "thread-id")]
    thread_id: i64,
}

#[derive(Debug, Deserialize)]
struct HotpluggableCpu {
    #[serde(rename = "type")]
    driver: String,
    props: HotpluggableProps,
}

#[derive(Debug, Deserialize)]
struct HotpluggableProps {
    #[serde(rename = "socket-id")]
    socket_id: i64,
    #[serde(rename = "core-id")]
    core_id: i64,
    #[serde(rename = "thread-id")]
    thread_id: i64,
}

impl QmpVcpu {
    /// Arguments for the `device_add` QMP command.
    pub fn to_device_add(&self) -> Result<serde_json::Value, VcpuError> {
        let args = DeviceAddArgs {
            id: self.cpu_id.clone(),
            driver: self.driver.clone(),
            socket_id: self.socket_id,
            core_id: self.core_id,
            thread_id: self.thread_id,
        };
        Ok(serde_json::to_value(args)?)
    }

    /// Build a record from one entry of a `query-hotpluggable-cpus` reply.
    ///
    /// The cpu id is synthesized from the socket: `cpu-<socket-id>`.
    pub fn from_hotpluggable(entry: &serde_json::Value) -> Result<Self, VcpuError> {
        let cpu = HotpluggableCpu::deserialize(entry)?;
        Ok(Self {
            cpu_id: format!("cpu-{}", cpu.props.socket_id),
            driver: cpu.driver,
            socket_id: cpu.props.socket_id,
            core_id: cpu.props.core_id,
            thread_id: cpu.props.thread_id,
        })
    }

    /// Serialize to the runtime-file record form.
    pub fn to_record(&self) -> Result<serde_json::Value, VcpuError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Load from the runtime-file record form.
    pub fn from_record(record: &serde_json::Value) -> Result<Self, VcpuError> {
        Ok(Self::deserialize(record)?)
    }
}
