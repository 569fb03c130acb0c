//! Image hosting integration.
//!
//! Delivery URLs are rewritten with transformation segments (a pure string
//! operation); uploads are delegated to a Cloudinary-style unsigned upload
//! endpoint over HTTP.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::types::ImageUrl;
use crate::models::config::MediaSettings;

/// Errors produced by the media client.
#[derive(Debug, Error)]
pub enum MediaError {
    /// No CDN settings are configured for this deployment.
    #[error("image hosting is not configured")]
    NotConfigured,
    /// The upload request could not be sent.
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The CDN answered with a non-success status.
    #[error("upload rejected with status {0}")]
    Rejected(u16),
    /// The CDN answered without a usable URL.
    #[error("upload response missing secure_url")]
    MalformedResponse,
}

/// Delivery transformation applied to a hosted image URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transform {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<&'static str>,
    pub blur: bool,
}

impl Transform {
    /// Card-sized variant used on listing pages.
    pub const fn card() -> Self {
        Self {
            width: Some(600),
            height: Some(250),
            quality: Some("auto:good"),
            blur: false,
        }
    }

    /// Tiny blurred placeholder for lazy loading.
    pub const fn lazy_placeholder() -> Self {
        Self {
            width: Some(40),
            height: Some(20),
            quality: Some("auto:low"),
            blur: true,
        }
    }

    /// Square thumbnail.
    pub const fn thumbnail(size: u32) -> Self {
        Self {
            width: Some(size),
            height: Some(size),
            quality: Some("auto:good"),
            blur: false,
        }
    }

    fn segment(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(width) = self.width {
            parts.push(format!("w_{width}"));
        }
        if let Some(height) = self.height {
            parts.push(format!("h_{height}"));
        }
        if self.width.is_some() || self.height.is_some() {
            parts.push("c_fill".to_string());
        }
        if let Some(quality) = self.quality {
            parts.push(format!("q_{quality}"));
        }
        if self.blur {
            parts.push("e_blur:100".to_string());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }
}

/// Rewrite a hosted image URL with a transformation segment.
///
/// URLs that do not contain an `/upload/` path component (external images,
/// already-transformed URLs from older records) pass through unchanged.
pub fn transformed_url(url: &str, transform: &Transform) -> String {
    const MARKER: &str = "/upload/";
    match (transform.segment(), url.find(MARKER)) {
        (Some(segment), Some(position)) => {
            let insert_at = position + MARKER.len();
            format!("{}{}/{}", &url[..insert_at], segment, &url[insert_at..])
        }
        _ => url.to_string(),
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// HTTP client for the image CDN's unsigned upload endpoint.
#[derive(Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    settings: Option<MediaSettings>,
}

impl MediaClient {
    pub fn new(settings: Option<MediaSettings>) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Whether uploads can succeed for this deployment.
    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }

    /// Upload an image and return its hosted URL.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: &str,
    ) -> Result<ImageUrl, MediaError> {
        let settings = self.settings.as_ref().ok_or(MediaError::NotConfigured)?;
        let endpoint = format!(
            "{}/{}/image/upload",
            settings.api_base.trim_end_matches('/'),
            settings.cloud_name
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("upload_preset", settings.upload_preset.clone())
            .text("folder", folder.to_string())
            .part("file", part);

        let response = self.http.post(&endpoint).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(MediaError::Rejected(response.status().as_u16()));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|_| MediaError::MalformedResponse)?;

        ImageUrl::new(body.secure_url).map_err(|_| MediaError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSTED: &str = "https://res.example-cdn.com/demo/image/upload/v17/businesses/salon.jpg";

    #[test]
    fn inserts_card_transform_after_upload_segment() {
        let url = transformed_url(HOSTED, &Transform::card());
        assert_eq!(
            url,
            "https://res.example-cdn.com/demo/image/upload/w_600,h_250,c_fill,q_auto:good/v17/businesses/salon.jpg"
        );
    }

    #[test]
    fn lazy_placeholder_adds_blur() {
        let url = transformed_url(HOSTED, &Transform::lazy_placeholder());
        assert!(url.contains("w_40,h_20,c_fill,q_auto:low,e_blur:100/"));
    }

    #[test]
    fn external_urls_pass_through() {
        let external = "https://example.com/images/shopfront.png";
        assert_eq!(transformed_url(external, &Transform::card()), external);
    }

    #[test]
    fn empty_transform_is_identity() {
        assert_eq!(transformed_url(HOSTED, &Transform::default()), HOSTED);
    }

    #[test]
    fn unconfigured_client_rejects_uploads() {
        let client = MediaClient::new(None);
        assert!(!client.is_configured());
    }
}
