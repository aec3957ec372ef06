//! Container runtime seam
//!
//! Every public operation asks a [`Connector`] for a fresh
//! [`RuntimeSession`], performs its calls, and drops the session before it
//! returns. Pooling, if any, belongs to the connector.

pub mod classify;
pub mod docker;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use docker::{DockerConnector, DockerSession};

/// Raw tar bytes streamed out of a container.
pub type ArchiveStream = BoxStream<'static, Result<Bytes, RuntimeError>>;

/// Errors reported by a runtime session, already classified.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("No such container: {0}")]
    NoSuchContainer(String),

    #[error("No such path in container {name}: {path}")]
    NoSuchPath { name: String, path: String },

    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed inspection document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One short-lived connection to the container runtime.
///
/// All calls address containers by name.
#[async_trait]
pub trait RuntimeSession: Send + Sync {
    async fn inspect(&self, name: &str) -> Result<ContainerSnapshot, RuntimeError>;

    async fn start(&self, name: &str) -> Result<(), RuntimeError>;

    /// Stop, giving the container `timeout_secs` before it is killed (runtime
    /// default when `None`).
    async fn stop(&self, name: &str, timeout_secs: Option<i64>) -> Result<(), RuntimeError>;

    async fn remove(&self, name: &str) -> Result<(), RuntimeError>;

    /// Stream a tar archive of `path` inside the container.
    ///
    /// Not-found conditions surface as the first item of the stream.
    fn copy_from(&self, name: &str, path: &str) -> ArchiveStream;
}

/// Opens runtime sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RuntimeSession>, RuntimeError>;
}

/// Inspection metadata captured when an environment was looked up.
///
/// This is a point-in-time copy; operations never consult it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    /// Container ID
    pub id: String,

    /// Image reference from the container config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// State string ("running", "exited", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    pub running: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Full inspection document as returned by the runtime
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl ContainerSnapshot {
    /// Build a snapshot from a Docker-style inspection document.
    pub fn from_inspect_json(raw: serde_json::Value) -> Self {
        let text = |pointer: &str| {
            raw.pointer(pointer)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };

        let created = text("/Created").and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|d| d.with_timezone(&Utc))
        });

        ContainerSnapshot {
            id: text("/Id").unwrap_or_default(),
            image: text("/Config/Image"),
            status: text("/State/Status"),
            running: raw
                .pointer("/State/Running")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            created,
            raw,
        }
    }
}
