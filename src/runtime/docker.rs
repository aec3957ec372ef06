//! Docker Engine API sessions (bollard)

use super::classify::{copy_error, is_not_modified, lifecycle_error};
use super::{ArchiveStream, Connector, ContainerSnapshot, RuntimeError, RuntimeSession};
use async_trait::async_trait;
use bollard::container::{
    DownloadFromContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Connects to a Docker daemon once per operation.
#[derive(Debug, Clone)]
pub struct DockerConnector {
    host: Option<String>,
    timeout: Duration,
}

impl DockerConnector {
    /// `host` is a `unix://`, `tcp://` or `http://` address, or `None` for
    /// the local defaults (`DOCKER_HOST`, then the platform socket).
    pub fn new(host: Option<String>, timeout: Duration) -> Self {
        DockerConnector { host, timeout }
    }

    fn open(&self) -> Result<Docker, bollard::errors::Error> {
        let secs = self.timeout.as_secs();
        match self.host.as_deref() {
            None => Ok(Docker::connect_with_local_defaults()?.with_timeout(self.timeout)),
            Some(host) if host.starts_with("tcp://") || host.starts_with("http://") => {
                Docker::connect_with_http(host, secs, API_DEFAULT_VERSION)
            }
            Some(host) => Docker::connect_with_socket(host, secs, API_DEFAULT_VERSION),
        }
    }
}

#[async_trait]
impl Connector for DockerConnector {
    async fn connect(&self) -> Result<Box<dyn RuntimeSession>, RuntimeError> {
        debug!(host = ?self.host, "connecting to docker");
        let docker = self.open()?;
        Ok(Box::new(DockerSession { docker }))
    }
}

/// A single Docker client, dropped with the operation that opened it.
pub struct DockerSession {
    docker: Docker,
}

impl DockerSession {
    pub fn new(docker: Docker) -> Self {
        DockerSession { docker }
    }
}

fn snapshot_from_response<T: Serialize>(response: &T) -> Result<ContainerSnapshot, RuntimeError> {
    let raw = serde_json::to_value(response)?;
    Ok(ContainerSnapshot::from_inspect_json(raw))
}

#[async_trait]
impl RuntimeSession for DockerSession {
    async fn inspect(&self, name: &str) -> Result<ContainerSnapshot, RuntimeError> {
        let response = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .map_err(|e| lifecycle_error(name, e))?;
        snapshot_from_response(&response)
    }

    async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        match self
            .docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if is_not_modified(&e) => Ok(()),
            Err(e) => Err(lifecycle_error(name, e)),
        }
    }

    async fn stop(&self, name: &str, timeout_secs: Option<i64>) -> Result<(), RuntimeError> {
        let options = timeout_secs.map(|t| StopContainerOptions { t });
        match self.docker.stop_container(name, options).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_modified(&e) => Ok(()),
            Err(e) => Err(lifecycle_error(name, e)),
        }
    }

    async fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        self.docker
            .remove_container(name, None::<RemoveContainerOptions>)
            .await
            .map_err(|e| lifecycle_error(name, e))
    }

    fn copy_from(&self, name: &str, path: &str) -> ArchiveStream {
        let options = DownloadFromContainerOptions {
            path: path.to_string(),
        };
        let stream = self.docker.download_from_container(name, Some(options));
        let (name, path) = (name.to_string(), path.to_string());
        stream
            .map(move |chunk| chunk.map_err(|e| copy_error(&name, &path, e)))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_snapshot_from_response() {
        let response = serde_json::json!({
            "Id": "abc123",
            "State": { "Status": "running", "Running": true }
        });
        let snapshot = snapshot_from_response(&response).unwrap();
        assert_eq!(snapshot.id, "abc123");
        assert!(snapshot.running);
    }

    #[test]
    fn test_unserializable_response_is_an_error() {
        // JSON object keys must be strings
        let mut response = HashMap::new();
        response.insert((1u8, 2u8), "x");
        let err = snapshot_from_response(&response).unwrap_err();
        assert!(matches!(err, RuntimeError::Decode(_)));
    }
}
