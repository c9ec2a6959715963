//! Typed controller-side wrappers for the media operations.

use serde_json::json;
use vidlink_rpc::{Client, ClientEndpoint};

use crate::error::ClientError;
use crate::probe::VideoMetadata;

/// Typed proxy for a media worker.
///
/// Each method is a pass-through to [`Client::call`] with a fixed wire
/// method name and argument order; no protocol behavior is added here.
#[derive(Debug)]
pub struct MediaClient {
    inner: Client,
}

impl MediaClient {
    /// Connect over an endpoint, waiting for the worker's readiness.
    pub async fn connect(endpoint: ClientEndpoint) -> Result<Self, ClientError> {
        Ok(Self::new(Client::connect(endpoint).await?))
    }

    /// Wrap an already-connected proxy.
    pub fn new(inner: Client) -> Self {
        Self { inner }
    }

    /// The raw proxy, for untyped calls.
    pub fn rpc(&self) -> &Client {
        &self.inner
    }

    pub async fn close(&self) {
        self.inner.close().await;
    }

    /// `dumpMetaData`: the worker logs a container summary.
    pub async fn dump_metadata(&self, store: &str, name: &str) -> Result<(), ClientError> {
        self.inner
            .call("dumpMetaData", vec![json!(store), json!(name)])
            .await?;
        Ok(())
    }

    /// `readMetaData`.
    pub async fn read_metadata(
        &self,
        store: &str,
        name: &str,
    ) -> Result<VideoMetadata, ClientError> {
        let value = self
            .inner
            .call("readMetaData", vec![json!(store), json!(name)])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `transcodeRotation`: bake the rotation out of `src`, writing `dst`.
    pub async fn transcode_rotation(
        &self,
        store: &str,
        src: &str,
        dst: &str,
    ) -> Result<(), ClientError> {
        self.inner
            .call("transcodeRotation", vec![json!(store), json!(src), json!(dst)])
            .await?;
        Ok(())
    }

    /// `transmuxStripMeta`: strip metadata from `src`, writing `dst`.
    pub async fn transmux_strip_meta(
        &self,
        store: &str,
        src: &str,
        dst: &str,
    ) -> Result<(), ClientError> {
        self.inner
            .call("transmuxStripMeta", vec![json!(store), json!(src), json!(dst)])
            .await?;
        Ok(())
    }
}
