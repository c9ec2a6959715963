//! One-shot in-process worker over a throwaway store.
//!
//! The local commands (`probe`, `strip`, `normalize`) stage their input
//! file in a temporary store, talk to a worker spawned on an in-memory
//! channel, and copy the result back out. The scratch directory is
//! removed when the session drops.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;
use vidlink_channel::memory;
use vidlink_media::{worker, MediaClient, MediaEngine, MediaStore};
use vidlink_proto::{ClientMessage, WorkerMessage};

use crate::exit::{client_error, io_error, media_error, CliResult};

pub struct ScratchWorker {
    root: PathBuf,
    store: MediaStore,
    client: MediaClient,
}

impl ScratchWorker {
    pub const STORE: &'static str = "scratch";
    pub const INPUT: &'static str = "input";
    pub const OUTPUT: &'static str = "output";

    pub async fn start() -> CliResult<Self> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let root = std::env::temp_dir().join(format!(
            "vidlink-scratch-{}-{nanos}",
            std::process::id()
        ));

        let store = MediaStore::open(&root)
            .await
            .map_err(|err| media_error("scratch store setup failed", err))?;

        let (controller, worker_side) = memory::duplex::<ClientMessage, WorkerMessage>();
        worker::spawn(Arc::new(MediaEngine::new(store.clone())), worker_side);

        let client = MediaClient::connect(controller)
            .await
            .map_err(|err| client_error("worker handshake failed", err))?;

        Ok(Self {
            root,
            store,
            client,
        })
    }

    /// Copy a file from the filesystem into the scratch store.
    pub async fn stage(&self, name: &str, path: &Path) -> CliResult<()> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        self.store
            .save(Self::STORE, name, &bytes)
            .await
            .map_err(|err| media_error("staging failed", err))
    }

    /// Copy a store entry out to the filesystem, returning its size.
    pub async fn export(&self, name: &str, path: &Path) -> CliResult<usize> {
        let bytes = self
            .store
            .load(Self::STORE, name)
            .await
            .map_err(|err| media_error("reading the result failed", err))?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?;
        Ok(bytes.len())
    }

    pub fn client(&self) -> &MediaClient {
        &self.client
    }

    /// Close the proxy; the scratch directory goes away on drop.
    pub async fn finish(self) {
        self.client.close().await;
    }
}

impl Drop for ScratchWorker {
    fn drop(&mut self) {
        debug!(root = ?self.root, "removing scratch store");
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
