//! Configuration for nft-publish.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How the `image` field of a fetched metadata document is matched against
/// the image locator returned by the upload.
///
/// Gateways serve the same object under different prefixes, so exact string
/// equality is too strict. The prefix-skew rule drops a fixed number of
/// leading bytes from each side and compares the remainders; exact equality
/// is always accepted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ImageMatchRule {
    /// Strings must be identical.
    Exact,
    /// Identical, or equal after stripping `document_prefix` bytes from the
    /// document's `image` and `locator_prefix` bytes from the locator.
    PrefixSkew {
        /// Bytes stripped from the metadata document's `image` value.
        document_prefix: usize,
        /// Bytes stripped from the upload's image locator.
        locator_prefix: usize,
    },
}

impl Default for ImageMatchRule {
    fn default() -> Self {
        Self::PrefixSkew {
            document_prefix: 12,
            locator_prefix: 8,
        }
    }
}

impl ImageMatchRule {
    /// Returns true if `document_image` denotes the same resource as `locator`.
    ///
    /// Empty remainders never match, so two short strings cannot compare
    /// equal just because both were stripped to nothing.
    #[must_use]
    pub fn matches(&self, document_image: &str, locator: &str) -> bool {
        if document_image == locator {
            return true;
        }
        match *self {
            Self::Exact => false,
            Self::PrefixSkew {
                document_prefix,
                locator_prefix,
            } => match (
                document_image.get(document_prefix..),
                locator.get(locator_prefix..),
            ) {
                (Some(doc), Some(loc)) => !doc.is_empty() && doc == loc,
                _ => false,
            },
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Verification loop configuration.
    #[serde(default)]
    pub verify: VerifyConfig,
}

/// Poll loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// First backoff delay in milliseconds; doubles after every failed attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Attempt ceiling when verifying metadata and image bytes.
    #[serde(default = "default_full_ceiling")]
    pub full_ceiling: u32,

    /// Attempt ceiling when verifying the metadata document only.
    #[serde(default = "default_metadata_only_ceiling")]
    pub metadata_only_ceiling: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Optional wall-clock limit for a whole run, in seconds.
    #[serde(default)]
    pub overall_timeout_secs: Option<u64>,

    /// Rule used to compare `image` against the image locator.
    #[serde(default)]
    pub image_match: ImageMatchRule,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            verify: VerifyConfig::default(),
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            full_ceiling: default_full_ceiling(),
            metadata_only_ceiling: default_metadata_only_ceiling(),
            fetch_timeout_secs: default_fetch_timeout(),
            overall_timeout_secs: None,
            image_match: ImageMatchRule::default(),
        }
    }
}

impl VerifyConfig {
    /// First backoff delay.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Per-request timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Wall-clock envelope for a run, if any.
    #[must_use]
    pub fn overall_timeout(&self) -> Option<Duration> {
        self.overall_timeout_secs.map(Duration::from_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_base_delay_ms() -> u64 {
    1000
}

const fn default_full_ceiling() -> u32 {
    8
}

const fn default_metadata_only_ceiling() -> u32 {
    14
}

const fn default_fetch_timeout() -> u64 {
    30
}

/// Default location of the configuration file.
#[must_use]
pub fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "nft-publish")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("nft-publish.toml"))
}

impl PublishConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject ceilings that would never poll.
    ///
    /// # Errors
    ///
    /// Returns an error if either attempt ceiling is zero.
    pub fn validate(&self) -> crate::Result<()> {
        if self.verify.full_ceiling == 0 || self.verify.metadata_only_ceiling == 0 {
            return Err(crate::Error::Config(
                "attempt ceilings must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
