//! # dockenv - Named Container Environments
//!
//! `dockenv` manages a single named container used as a development
//! environment:
//!
//! - **Lookup** by name, which also starts the container
//! - **Lifecycle**: start, stop, remove, purge
//! - **Exec**: ready-to-spawn `docker exec` commands, with or without a TTY
//! - **Path extraction**: a file or directory copied out as a tar archive
//!   rooted at the requested path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dockenv::{Client, Config, EnvError, Result};
//!
//! # async fn run() -> Result<()> {
//! let client = Client::from_config(&Config::default())?;
//!
//! let env = match client.find("web1").await {
//!     Ok(env) => env,
//!     Err(EnvError::MissingEnvironment(name)) => {
//!         eprintln!("{} does not exist yet", name);
//!         return Ok(());
//!     }
//!     Err(e) => return Err(e),
//! };
//!
//! // Entries are named "a.log", "b.log", ... not "logs/a.log"
//! let _archive = client.extract_path(&env, "/data/logs").await?;
//!
//! let _status = client
//!     .exec(&env, "ls", ["-la", "/data"])
//!     .status()
//!     .await
//!     .expect("docker exec");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod environment;
pub mod error;
mod extract;
pub mod runtime;

pub use config::{Config, ConfigError};
pub use environment::{Client, Environment};
pub use error::{EnvError, Operation, Result};
pub use runtime::{
    ArchiveStream, Connector, ContainerSnapshot, DockerConnector, RuntimeError, RuntimeSession,
};

pub use dockenv_archive::{summarize, EntryKind, EntrySummary, RebaseContext, StripMode};
