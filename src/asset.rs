//! Local asset loading.

use crate::error::{Error, Result};
use crate::verify::ContentDigest;
use bytes::Bytes;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Raw image bytes and their digest, computed once at load.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    raw: Bytes,
    digest: ContentDigest,
}

impl AssetBundle {
    /// Wrap bytes, computing the digest.
    #[must_use]
    pub fn new(raw: impl Into<Bytes>) -> Self {
        let raw = raw.into();
        let digest = ContentDigest::of(&raw);
        Self { raw, digest }
    }

    /// Read an asset from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bundle = Self::new(std::fs::read(path)?);
        info!("img md5 = {} ({})", bundle.digest, path.display());
        Ok(bundle)
    }

    /// Raw bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.raw
    }

    /// Digest of the original local bytes.
    #[must_use]
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }
}

/// An image plus the metadata manifest to publish alongside it.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Image asset.
    pub asset: AssetBundle,
    /// Parsed manifest.
    pub manifest: Value,
    /// Compact serialization of `manifest`, as handed to the uploader.
    pub manifest_bytes: Bytes,
}

impl PublishRequest {
    /// Build a request from an in-memory asset and manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is not a JSON object.
    pub fn new(asset: AssetBundle, manifest: Value) -> Result<Self> {
        if !manifest.is_object() {
            return Err(Error::Manifest("manifest must be a JSON object".to_string()));
        }
        let manifest_bytes = serde_json::to_vec(&manifest)
            .map_err(|e| Error::Manifest(e.to_string()))?
            .into();
        Ok(Self {
            asset,
            manifest,
            manifest_bytes,
        })
    }

    /// Load the image and manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read or the manifest is not
    /// a JSON object.
    pub fn from_files(image: &Path, manifest: &Path) -> Result<Self> {
        info!("pic = {}", image.display());
        info!("json = {}", manifest.display());

        let asset = AssetBundle::from_file(image)?;
        let content = std::fs::read(manifest)?;
        let doc: Value = serde_json::from_slice(&content)
            .map_err(|e| Error::Manifest(format!("{}: {e}", manifest.display())))?;
        Self::new(asset, doc)
    }
}
