//! Reconciliation configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration
///
/// Loaded from the `[reconcile]` table of a TOML file; every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Maximum concurrent uploads per reconciliation
    pub max_upload_concurrency: usize,

    /// Maximum concurrent deletions per reconciliation
    pub max_delete_concurrency: usize,

    /// Probe the gateway for kept references before mutating anything
    pub verify_kept_assets: bool,

    /// Per-call gateway deadline in milliseconds (0 disables)
    pub gateway_timeout_ms: u64,

    /// Accepted content types for new images
    pub allowed_image_types: Vec<String>,

    /// Accepted content types for a new video
    pub allowed_video_types: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_upload_concurrency: 4,
            max_delete_concurrency: 4,
            verify_kept_assets: false,
            gateway_timeout_ms: 30_000,
            allowed_image_types: vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            allowed_video_types: vec![
                "video/mp4".to_string(),
                "video/quicktime".to_string(),
                "video/x-msvideo".to_string(),
            ],
        }
    }
}

impl ReconcileConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `[reconcile]` table of a TOML document
    ///
    /// A document without the table yields the defaults.
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the TOML is malformed or a key has the wrong type
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct File {
            #[serde(default)]
            reconcile: ReconcileConfig,
        }

        let file: File = toml::from_str(raw)?;
        Ok(file.reconcile)
    }

    /// With upload concurrency
    #[inline]
    #[must_use]
    pub fn with_upload_concurrency(mut self, limit: usize) -> Self {
        self.max_upload_concurrency = limit;
        self
    }

    /// With deletion concurrency
    #[inline]
    #[must_use]
    pub fn with_delete_concurrency(mut self, limit: usize) -> Self {
        self.max_delete_concurrency = limit;
        self
    }

    /// With kept-reference verification
    #[inline]
    #[must_use]
    pub fn with_verify_kept_assets(mut self, verify: bool) -> Self {
        self.verify_kept_assets = verify;
        self
    }

    /// With gateway deadline
    #[inline]
    #[must_use]
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Gateway deadline (zero when disabled)
    #[inline]
    #[must_use]
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    /// Upload limit, never below one
    #[inline]
    #[must_use]
    pub fn upload_concurrency(&self) -> usize {
        self.max_upload_concurrency.max(1)
    }

    /// Deletion limit, never below one
    #[inline]
    #[must_use]
    pub fn delete_concurrency(&self) -> usize {
        self.max_delete_concurrency.max(1)
    }
}
