//! Binary asset download and image format checks.
//!
//! Emoji, sticker, avatar, and workspace profile assets are fetched by
//! URL from the source platform's CDN. The fetcher is a trait so the
//! engine can be exercised without network access.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::{GatewayError, Result};

/// Downloads a binary asset by URL.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch the asset at `url`, returning its raw bytes.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// [`AssetFetcher`] backed by a shared `reqwest` client.
pub struct HttpAssetFetcher {
    client: reqwest::Client,
}

impl HttpAssetFetcher {
    /// Create a fetcher whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self { client }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Network { msg: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                msg: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network { msg: e.to_string() })
    }
}

/// Image container formats recognized by magic-number sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG.
    Jpeg,
    /// GIF (static or animated).
    Gif,
    /// WebP.
    WebP,
}

impl ImageFormat {
    /// Classify raw bytes by their leading magic number.
    pub fn sniff(data: &[u8]) -> Option<ImageFormat> {
        if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageFormat::WebP)
        } else {
            None
        }
    }

    /// Whether the workspace profile update endpoint accepts this format
    /// for icon/splash/banner assets.
    pub fn is_profile_asset(&self) -> bool {
        matches!(self, ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif)
    }
}
