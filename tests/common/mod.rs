//! In-memory container runtime for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use dockenv::{
    ArchiveStream, Client, Connector, ContainerSnapshot, RuntimeError, RuntimeSession,
};
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tar::{Builder, EntryType, Header};

/// Chunk size used when streaming archives, small enough to split headers
const CHUNK: usize = 97;

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub running: bool,
    /// Archives returned by copy, keyed by absolute path
    pub archives: HashMap<String, Vec<u8>>,
}

/// How a copy should misbehave
#[derive(Debug, Clone)]
pub enum CopyFault {
    /// Fail before any bytes
    Refused,
    /// Fail after this many bytes
    BreakAfter(usize),
    /// Never produce anything
    Hang,
    /// Produce this many bytes, then never anything more
    StallAfter(usize),
}

#[derive(Default)]
pub struct State {
    pub containers: HashMap<String, FakeContainer>,
    pub calls: Vec<String>,
    pub connects: usize,
    pub open_sessions: usize,
    pub live_streams: usize,
    pub fail_ops: HashMap<&'static str, String>,
    pub copy_fault: Option<CopyFault>,
}

#[derive(Clone, Default)]
pub struct FakeRuntime {
    pub state: Arc<Mutex<State>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(self, name: &str, running: bool) -> Self {
        self.state.lock().containers.insert(
            name.to_string(),
            FakeContainer {
                running,
                archives: HashMap::new(),
            },
        );
        self
    }

    pub fn with_archive(self, name: &str, path: &str, archive: Vec<u8>) -> Self {
        self.state
            .lock()
            .containers
            .get_mut(name)
            .expect("container must exist")
            .archives
            .insert(path.to_string(), archive);
        self
    }

    /// Make `op` fail with a transport error
    pub fn fail(&self, op: &'static str, message: &str) {
        self.state.lock().fail_ops.insert(op, message.to_string());
    }

    pub fn copy_fault(&self, fault: CopyFault) {
        self.state.lock().copy_fault = Some(fault);
    }

    pub fn client(&self) -> Client {
        Client::new(self.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    pub fn open_sessions(&self) -> usize {
        self.state.lock().open_sessions
    }

    /// Copy streams that have not been dropped yet
    pub fn live_streams(&self) -> usize {
        self.state.lock().live_streams
    }

    pub fn is_running(&self, name: &str) -> Option<bool> {
        self.state.lock().containers.get(name).map(|c| c.running)
    }
}

#[async_trait]
impl Connector for FakeRuntime {
    async fn connect(&self) -> Result<Box<dyn RuntimeSession>, RuntimeError> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_ops.get("connect") {
            return Err(RuntimeError::Io(std::io::Error::other(message.clone())));
        }
        state.connects += 1;
        state.open_sessions += 1;
        Ok(Box::new(FakeSession {
            state: self.state.clone(),
        }))
    }
}

pub struct FakeSession {
    state: Arc<Mutex<State>>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.lock().open_sessions -= 1;
    }
}

/// Decrements `live_streams` when the owning stream is dropped
struct StreamGuard(Arc<Mutex<State>>);

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.lock().live_streams -= 1;
    }
}

impl FakeSession {
    fn track(&self, inner: ArchiveStream) -> ArchiveStream {
        self.state.lock().live_streams += 1;
        let guard = StreamGuard(self.state.clone());
        inner
            .map(move |chunk| {
                let _held = &guard;
                chunk
            })
            .boxed()
    }

    fn enter(&self, op: &'static str, name: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        state.calls.push(format!("{} {}", op, name));
        if let Some(message) = state.fail_ops.get(op) {
            return Err(RuntimeError::Io(std::io::Error::other(message.clone())));
        }
        if !state.containers.contains_key(name) {
            return Err(RuntimeError::NoSuchContainer(name.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RuntimeSession for FakeSession {
    async fn inspect(&self, name: &str) -> Result<ContainerSnapshot, RuntimeError> {
        self.enter("inspect", name)?;
        let running = self.state.lock().containers[name].running;
        Ok(ContainerSnapshot::from_inspect_json(serde_json::json!({
            "Id": format!("id-{}", name),
            "Config": { "Image": "busybox:latest" },
            "State": {
                "Status": if running { "running" } else { "exited" },
                "Running": running
            }
        })))
    }

    async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        self.enter("start", name)?;
        self.state.lock().containers.get_mut(name).unwrap().running = true;
        Ok(())
    }

    async fn stop(&self, name: &str, _timeout_secs: Option<i64>) -> Result<(), RuntimeError> {
        self.enter("stop", name)?;
        self.state.lock().containers.get_mut(name).unwrap().running = false;
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        self.enter("remove", name)?;
        self.state.lock().containers.remove(name);
        Ok(())
    }

    fn copy_from(&self, name: &str, path: &str) -> ArchiveStream {
        let stream = self.archive_stream(name, path);
        self.track(stream)
    }
}

impl FakeSession {
    fn archive_stream(&self, name: &str, path: &str) -> ArchiveStream {
        if let Err(e) = self.enter("copy", name) {
            return stream::iter([Err(e)]).boxed();
        }

        let state = self.state.lock();
        let archive = match state.containers[name].archives.get(path) {
            Some(archive) => archive.clone(),
            None => {
                return stream::iter([Err(RuntimeError::NoSuchPath {
                    name: name.to_string(),
                    path: path.to_string(),
                })])
                .boxed()
            }
        };

        let chunks: Vec<Result<Bytes, RuntimeError>> = archive
            .chunks(CHUNK)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        match state.copy_fault.clone() {
            None => stream::iter(chunks).boxed(),
            Some(CopyFault::Refused) => stream::iter([Err(RuntimeError::Io(
                std::io::Error::other("connection reset by peer"),
            ))])
            .boxed(),
            Some(CopyFault::BreakAfter(bytes)) => {
                let keep = bytes / CHUNK;
                let mut chunks: Vec<_> = chunks.into_iter().take(keep).collect();
                chunks.push(Err(RuntimeError::Io(std::io::Error::other(
                    "unexpected EOF from daemon",
                ))));
                stream::iter(chunks).boxed()
            }
            Some(CopyFault::Hang) => stream::pending().boxed(),
            Some(CopyFault::StallAfter(bytes)) => {
                let keep = bytes.div_ceil(CHUNK);
                stream::iter(chunks.into_iter().take(keep))
                    .chain(stream::pending())
                    .boxed()
            }
        }
    }
}

/// Archive of a directory as a runtime returns it: `root/` followed by
/// `root/<file>` entries.
pub fn dir_archive(root: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());

    let mut dir = Header::new_ustar();
    dir.set_entry_type(EntryType::Directory);
    dir.set_mode(0o755);
    dir.set_size(0);
    builder
        .append_data(&mut dir, format!("{}/", root), std::io::empty())
        .unwrap();

    for (name, data) in files {
        let mut header = Header::new_ustar();
        header.set_entry_type(EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(data.len() as u64);
        builder
            .append_data(&mut header, format!("{}/{}", root, name), *data)
            .unwrap();
    }

    builder.into_inner().unwrap()
}
