//! Path extraction
//!
//! Copies a path out of an environment and re-roots the archive so that its
//! top level is the contents of the requested directory.

use crate::environment::{Client, Environment};
use crate::error::{EnvError, Operation, Result};
use dockenv_archive::{rebase, RebaseContext};
use futures::{stream, StreamExt, TryStreamExt};
use std::io;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

impl Client {
    /// Extract `path` from the environment as an in-memory tar archive.
    ///
    /// Entries are named relative to `path`: extracting `/data/logs` gives
    /// `a.log`, not `logs/a.log`. The whole archive is buffered, so memory
    /// use grows with the size of the subtree.
    ///
    /// Returns [`EnvError::NoSuchPath`] when the path does not exist and
    /// [`EnvError::MissingEnvironment`] when the container is gone. Any
    /// failure discards the partial archive.
    pub async fn extract_path(&self, env: &Environment, path: &str) -> Result<Vec<u8>> {
        let name = env.name();
        let session = self.session(name).await?;

        debug!(name, path, "copying path out of container");
        let mut incoming = session.copy_from(name, path);

        // The runtime reports a missing path or container before any archive
        // bytes, so the first item settles the classification.
        let first = match incoming.next().await {
            Some(Ok(chunk)) => Some(chunk),
            Some(Err(e)) => {
                let err = EnvError::runtime(Operation::Copy, name, e);
                if err.is_not_found() {
                    warn!(name, path, "path not found in environment");
                }
                return Err(err);
            }
            None => None,
        };

        // The blocking rebase cannot be aborted. Dropping this call cancels
        // the token, which ends the body and lets the task wind down.
        let cancel = CancellationToken::new();
        let _cancel_on_drop = cancel.clone().drop_guard();
        let body = stream::iter(first.map(Ok))
            .chain(incoming)
            .take_until(cancel.cancelled_owned())
            .map_err(io::Error::other)
            .boxed();
        let reader = SyncIoBridge::new(StreamReader::new(body));

        let ctx = RebaseContext::new(path, self.strip_mode);
        let archive = tokio::task::spawn_blocking(move || rebase(reader, &ctx))
            .await?
            .map_err(|source| EnvError::Archive {
                name: name.to_string(),
                path: path.to_string(),
                source,
            })?;

        drop(session);
        info!(name, path, bytes = archive.len(), "path extracted");
        Ok(archive)
    }
}
