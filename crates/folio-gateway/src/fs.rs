//! Filesystem gateway
//!
//! Stores each blob as a file at `root/<folder>/<ulid>`. The asset id is the
//! path relative to `root`, so ids are stable across restarts.

use crate::error::GatewayError;
use crate::gateway::AssetGateway;
use async_trait::async_trait;
use folio_asset::{AssetId, MediaPayload, ResourceKind, StoredBlob};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use ulid::Ulid;

/// Filesystem gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsGatewayConfig {
    /// Directory holding all blobs
    pub root: PathBuf,
    /// Prefix for minted urls
    pub public_base_url: String,
    /// Folder for images, relative to `root`
    pub image_folder: String,
    /// Folder for videos, relative to `root`
    pub video_folder: String,
}

impl FsGatewayConfig {
    /// Create config rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// With public base url
    #[inline]
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// Folder for a resource kind
    #[inline]
    #[must_use]
    pub fn folder(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Image => &self.image_folder,
            ResourceKind::Video => &self.video_folder,
        }
    }
}

impl Default for FsGatewayConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("folio-data/blobs"),
            public_base_url: "file://folio".to_string(),
            image_folder: "blogs/images".to_string(),
            video_folder: "blogs/videos".to_string(),
        }
    }
}

/// Directory-backed blob store
#[derive(Debug, Clone)]
pub struct FsGateway {
    config: FsGatewayConfig,
}

impl FsGateway {
    /// Create gateway
    #[inline]
    #[must_use]
    pub fn new(config: FsGatewayConfig) -> Self {
        Self { config }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FsGatewayConfig {
        &self.config
    }

    /// Resolve an id to its file, rejecting ids outside the kind's folder
    fn blob_path(&self, id: &AssetId, kind: ResourceKind) -> Result<PathBuf, GatewayError> {
        let relative = Path::new(id.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || !relative.starts_with(self.config.folder(kind)) {
            return Err(GatewayError::InvalidId(id.clone()));
        }
        Ok(self.config.root.join(relative))
    }
}

#[async_trait]
impl AssetGateway for FsGateway {
    async fn upload(
        &self,
        payload: &MediaPayload,
        kind: ResourceKind,
    ) -> Result<StoredBlob, GatewayError> {
        let folder = self.config.folder(kind);
        let dir = self.config.root.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| GatewayError::io(dir.display().to_string(), &e))?;

        let name = Ulid::new().to_string().to_lowercase();
        let path = dir.join(&name);
        tokio::fs::write(&path, &payload.bytes)
            .await
            .map_err(|e| GatewayError::io(path.display().to_string(), &e))?;

        let id = AssetId::new(format!("{folder}/{name}"));
        let url = format!("{}/{}", self.config.public_base_url, id);
        tracing::debug!(%id, %kind, len = payload.len(), "stored blob");
        Ok(StoredBlob::new(id, url))
    }

    async fn delete(&self, id: &AssetId, kind: ResourceKind) -> Result<(), GatewayError> {
        let path = self.blob_path(id, kind)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(%id, %kind, "removed blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(GatewayError::NotFound {
                kind,
                id: id.clone(),
            }),
            Err(e) => Err(GatewayError::io(path.display().to_string(), &e)),
        }
    }

    async fn exists(&self, id: &AssetId, kind: ResourceKind) -> Result<bool, GatewayError> {
        let path = self.blob_path(id, kind)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| GatewayError::io(path.display().to_string(), &e))
    }
}
