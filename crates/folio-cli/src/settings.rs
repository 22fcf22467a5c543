//! On-disk configuration for the `folio` binary

use anyhow::{Context, Result};
use folio_gateway::FsGatewayConfig;
use folio_reconcile::ReconcileConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Gateway table; unset keys fall back to the data directory layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub root: Option<PathBuf>,
    pub public_base_url: Option<String>,
    pub image_folder: Option<String>,
    pub video_folder: Option<String>,
}

/// Whole configuration file
///
/// ```toml
/// [reconcile]
/// max_upload_concurrency = 8
///
/// [gateway]
/// public_base_url = "https://cdn.example.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reconcile: ReconcileConfig,
    pub gateway: GatewaySettings,
}

impl Settings {
    /// Parse a TOML document
    ///
    /// # Errors
    /// Fails on malformed TOML or mistyped keys.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid configuration")
    }

    /// Read `path`, or use defaults when no file was given
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// Blob gateway configuration; blobs live under `data_dir/blobs` by default
    #[must_use]
    pub fn gateway_config(&self, data_dir: &Path) -> FsGatewayConfig {
        let root = self
            .gateway
            .root
            .clone()
            .unwrap_or_else(|| data_dir.join("blobs"));
        let mut config = FsGatewayConfig::new(root);
        if let Some(url) = &self.gateway.public_base_url {
            config = config.with_public_base_url(url.clone());
        }
        if let Some(folder) = &self.gateway.image_folder {
            config.image_folder.clone_from(folder);
        }
        if let Some(folder) = &self.gateway.video_folder {
            config.video_folder.clone_from(folder);
        }
        config
    }

    /// Directory holding one JSON file per document
    #[inline]
    #[must_use]
    pub fn documents_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("documents")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.reconcile.max_upload_concurrency, 4);
    }

    #[test]
    fn both_tables_are_read() {
        let settings = Settings::from_toml_str(
            r#"
            [reconcile]
            max_upload_concurrency = 2
            verify_kept_assets = true

            [gateway]
            public_base_url = "https://cdn.test"
            video_folder = "clips"
            "#,
        )
        .unwrap();

        assert_eq!(settings.reconcile.upload_concurrency(), 2);
        assert!(settings.reconcile.verify_kept_assets);

        let gateway = settings.gateway_config(Path::new("/data"));
        assert_eq!(gateway.root, PathBuf::from("/data/blobs"));
        assert_eq!(gateway.public_base_url, "https://cdn.test");
        assert_eq!(gateway.video_folder, "clips");
        assert_eq!(gateway.image_folder, FsGatewayConfig::default().image_folder);
    }

    #[test]
    fn explicit_root_wins_over_data_dir() {
        let settings = Settings::from_toml_str("[gateway]\nroot = \"/blobs\"").unwrap();
        assert_eq!(
            settings.gateway_config(Path::new("/data")).root,
            PathBuf::from("/blobs")
        );
    }

    #[test]
    fn mistyped_key_is_an_error() {
        let err = Settings::from_toml_str("[reconcile]\nmax_upload_concurrency = \"many\"");
        assert!(err.is_err());
    }
}
