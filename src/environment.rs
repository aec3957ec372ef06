//! Environment handles and lifecycle operations

use crate::config::Config;
use crate::error::{EnvError, Operation, Result};
use crate::runtime::{Connector, ContainerSnapshot, DockerConnector, RuntimeSession};
use dockenv_archive::StripMode;
use std::ffi::OsStr;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// A named environment and the inspection data captured when it was found.
///
/// Operations address the runtime by name; the snapshot is never refreshed
/// and may be stale. Dropping a handle leaves the container alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    name: String,
    snapshot: ContainerSnapshot,
}

impl Environment {
    pub(crate) fn new(name: impl Into<String>, snapshot: ContainerSnapshot) -> Self {
        Environment {
            name: name.into(),
            snapshot,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot(&self) -> &ContainerSnapshot {
        &self.snapshot
    }
}

/// Entry point for environment operations.
///
/// Each call opens its own runtime session through the connector and drops
/// it before returning. Cancellation is the caller's: dropping a returned
/// future abandons the in-flight request, and deadlines are applied with
/// `tokio::time::timeout`.
#[derive(Clone)]
pub struct Client {
    connector: Arc<dyn Connector>,
    pub(crate) strip_mode: StripMode,
    docker_binary: String,
    docker_host: Option<String>,
    stop_timeout_secs: Option<i64>,
}

impl Client {
    /// Client over an arbitrary connector, with default settings.
    pub fn new<C: Connector + 'static>(connector: C) -> Self {
        let defaults = Config::default();
        Client {
            connector: Arc::new(connector),
            strip_mode: defaults.strip_mode,
            docker_binary: defaults.docker_binary,
            docker_host: None,
            stop_timeout_secs: None,
        }
    }

    /// Docker-backed client configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let connector = DockerConnector::new(config.docker_host.clone(), config.timeout());
        Ok(Client {
            connector: Arc::new(connector),
            strip_mode: config.strip_mode,
            docker_binary: config.docker_binary.clone(),
            docker_host: config.docker_host.clone(),
            stop_timeout_secs: config.stop_timeout_secs,
        })
    }

    pub fn with_strip_mode(mut self, mode: StripMode) -> Self {
        self.strip_mode = mode;
        self
    }

    pub fn with_docker_binary(mut self, binary: impl Into<String>) -> Self {
        self.docker_binary = binary.into();
        self
    }

    pub fn with_stop_timeout(mut self, secs: Option<i64>) -> Self {
        self.stop_timeout_secs = secs;
        self
    }

    pub fn strip_mode(&self) -> StripMode {
        self.strip_mode
    }

    pub(crate) async fn session(&self, name: &str) -> Result<Box<dyn RuntimeSession>> {
        self.connector
            .connect()
            .await
            .map_err(|e| EnvError::runtime(Operation::Connect, name, e))
    }

    /// Look up an environment by name and start it.
    ///
    /// A missing container yields [`EnvError::MissingEnvironment`] without
    /// any start attempt.
    pub async fn find(&self, name: &str) -> Result<Environment> {
        let snapshot = {
            let session = self.session(name).await?;
            debug!(name, "inspecting container");
            session.inspect(name).await.map_err(|e| {
                let err = EnvError::runtime(Operation::Inspect, name, e);
                if err.is_not_found() {
                    warn!(name, "environment container not found");
                }
                err
            })?
        };

        let env = Environment::new(name, snapshot);
        self.start(&env).await?;
        Ok(env)
    }

    pub async fn start(&self, env: &Environment) -> Result<()> {
        let session = self.session(env.name()).await?;
        session
            .start(env.name())
            .await
            .map_err(|e| EnvError::runtime(Operation::Start, env.name(), e))?;
        info!(name = env.name(), "environment started");
        Ok(())
    }

    pub async fn stop(&self, env: &Environment) -> Result<()> {
        let session = self.session(env.name()).await?;
        session
            .stop(env.name(), self.stop_timeout_secs)
            .await
            .map_err(|e| EnvError::runtime(Operation::Stop, env.name(), e))?;
        info!(name = env.name(), "environment stopped");
        Ok(())
    }

    pub async fn remove(&self, env: &Environment) -> Result<()> {
        let session = self.session(env.name()).await?;
        session
            .remove(env.name())
            .await
            .map_err(|e| EnvError::runtime(Operation::Remove, env.name(), e))?;
        info!(name = env.name(), "environment removed");
        Ok(())
    }

    /// Stop then remove. A failed stop is returned as is and nothing is
    /// removed.
    pub async fn purge(&self, env: &Environment) -> Result<()> {
        self.stop(env).await?;
        self.remove(env).await
    }

    /// Command running `cmd args...` inside the environment, not yet spawned.
    ///
    /// Standard streams default to null; wire them before spawning.
    pub fn exec<I, S>(&self, env: &Environment, cmd: &str, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = self.docker_command(env, "-i", cmd, args);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }

    /// Like [`Client::exec`] with a pseudo-terminal attached to the
    /// caller's own terminal.
    pub fn exec_interactive<I, S>(&self, env: &Environment, cmd: &str, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = self.docker_command(env, "-it", cmd, args);
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }

    fn docker_command<I, S>(&self, env: &Environment, flags: &str, cmd: &str, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.docker_binary);
        command.args(["exec", flags, env.name(), cmd]).args(args);
        if let Some(host) = &self.docker_host {
            command.env("DOCKER_HOST", host);
        }
        command
    }
}
