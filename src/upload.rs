//! Multipart upload of the image and recording, and interpretation of the
//! server's reply.

use crate::audio::AudioBlob;
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url, header};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Why an upload did not produce a playable audio resource
#[derive(Debug, Clone, PartialEq)]
pub enum UploadError {
    /// Network/HTTP transport error
    Transport(String),
    TimedOut,
    /// Server answered with a non-success status
    BadStatus { status: u16, reason: String },
    /// Success status, but no usable `audio_url`
    MalformedResponse,
    UnreadableImage { path: PathBuf, message: String },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Transport(e) => write!(f, "Network error: {}", e),
            UploadError::TimedOut => write!(f, "Upload timed out"),
            UploadError::BadStatus { status, reason } => {
                write!(f, "Server error ({}): {}", status, reason)
            }
            UploadError::MalformedResponse => write!(f, "malformed response"),
            UploadError::UnreadableImage { path, message } => {
                write!(f, "Failed to read image {:?}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for UploadError {}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UploadError::TimedOut
        } else {
            UploadError::Transport(err.to_string())
        }
    }
}

/// Sends one (image, audio) pair and resolves the playable audio URL
#[async_trait(?Send)]
pub trait Uploader {
    async fn submit(&self, image: Option<PathBuf>, audio: AudioBlob) -> Result<Url, UploadError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    audio_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct UploadClient {
    http: Client,
    endpoint: Url,
    session_cookie: Option<String>,
}

impl UploadClient {
    pub fn new(http: Client, endpoint: Url, session_cookie: Option<String>) -> Self {
        Self {
            http,
            endpoint,
            session_cookie,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.upload_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::new(
            http,
            config.upload_url()?,
            config.session_cookie.clone(),
        ))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl Uploader for UploadClient {
    async fn submit(&self, image: Option<PathBuf>, audio: AudioBlob) -> Result<Url, UploadError> {
        let mut form = Form::new();

        if let Some(path) = image {
            form = form.part("image", image_part(&path).await?);
        }

        let audio_name = audio.file_name();
        let audio_type = audio.media_type();
        tracing::info!(
            "Uploading {} ({} bytes) to {}",
            audio_name,
            audio.len(),
            self.endpoint
        );

        let audio_part = Part::bytes(audio.into_bytes())
            .file_name(audio_name)
            .mime_str(audio_type)
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        form = form.part("audio", audio_part);

        let mut request = self.http.post(self.endpoint.clone()).multipart(form);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string();
            tracing::error!("Server error ({}): {}", status.as_u16(), reason);
            return Err(UploadError::BadStatus {
                status: status.as_u16(),
                reason,
            });
        }

        // Relative references resolve against wherever redirects ended up
        let base = response.url().clone();
        let body = response.bytes().await?;

        let audio_url = parse_audio_url(&body)?;
        base.join(&audio_url).map_err(|e| {
            tracing::error!("Unusable audio_url {:?}: {}", audio_url, e);
            UploadError::MalformedResponse
        })
    }
}

fn parse_audio_url(body: &[u8]) -> Result<String, UploadError> {
    let response: UploadResponse = serde_json::from_slice(body).map_err(|e| {
        tracing::error!("Failed to parse server response: {}", e);
        UploadError::MalformedResponse
    })?;

    tracing::debug!("Server response message: {:?}", response.message);

    match response.audio_url {
        Some(url) if !url.trim().is_empty() => Ok(url),
        _ => {
            tracing::error!("Server response has no audio_url");
            Err(UploadError::MalformedResponse)
        }
    }
}

async fn image_part(path: &Path) -> Result<Part, UploadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| UploadError::UnreadableImage {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(image_media_type(path))
        .map_err(|e| UploadError::Transport(e.to_string()))
}

fn image_media_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
