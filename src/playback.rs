use crate::config::Config;
use crate::ui::Surface;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use rodio::{Decoder, OutputStreamBuilder, Sink};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const MAX_VOLUME: f32 = 1.0;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Could not download the audio resource
    Fetch(String),
    /// The resource is not a format the decoder understands
    Unsupported(String),
    /// No output device to play on
    Device(String),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::Fetch(e) => write!(f, "Failed to fetch audio: {}", e),
            PlaybackError::Unsupported(e) => write!(f, "Unsupported audio: {}", e),
            PlaybackError::Device(e) => write!(f, "Audio output unavailable: {}", e),
        }
    }
}

impl std::error::Error for PlaybackError {}

/// Plays an audio resource; resolves once playback has ended
#[async_trait(?Send)]
pub trait Player {
    async fn play(&self, source: &Url, volume: f32) -> Result<(), PlaybackError>;
}

/// Downloads the resource and plays it on the default output device
pub struct RodioPlayer {
    http: Client,
}

impl RodioPlayer {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Downloads share the upload timeout so a stalled resource cannot hold
    /// the page in playback forever
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.upload_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(http))
    }

    async fn fetch(&self, source: &Url) -> Result<Vec<u8>, PlaybackError> {
        let response = self
            .http
            .get(source.clone())
            .send()
            .await
            .map_err(|e| PlaybackError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlaybackError::Fetch(format!("server returned {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlaybackError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait(?Send)]
impl Player for RodioPlayer {
    async fn play(&self, source: &Url, volume: f32) -> Result<(), PlaybackError> {
        let bytes = self.fetch(source).await?;
        tracing::debug!("Fetched {} bytes of audio from {}", bytes.len(), source);

        // Dropping this future (quit, Ctrl+C) stops the blocking playback
        let cancelled = Arc::new(AtomicBool::new(false));
        let _cancel = CancelOnDrop(cancelled.clone());

        tokio::task::spawn_blocking(move || play_blocking(bytes, volume, &cancelled))
            .await
            .map_err(|e| PlaybackError::Device(format!("playback task failed: {}", e)))?
    }
}

struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

fn play_blocking(bytes: Vec<u8>, volume: f32, cancelled: &AtomicBool) -> Result<(), PlaybackError> {
    let stream_handle = OutputStreamBuilder::open_default_stream()
        .map_err(|e| PlaybackError::Device(e.to_string()))?;

    let source =
        Decoder::new(Cursor::new(bytes)).map_err(|e| PlaybackError::Unsupported(e.to_string()))?;

    let sink = Sink::connect_new(stream_handle.mixer());
    sink.set_volume(volume);
    sink.append(source);

    if wait_for_end(|| sink.empty(), cancelled) {
        tracing::debug!("Playback cancelled");
        sink.stop();
    }

    Ok(())
}

/// Block until `finished` or cancellation; returns true if cancelled
fn wait_for_end(finished: impl Fn() -> bool, cancelled: &AtomicBool) -> bool {
    loop {
        if cancelled.load(Ordering::Acquire) {
            return true;
        }
        if finished() {
            return false;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Append a timestamp query pair so every play fetches a fresh resource
pub fn cache_busted(url: &Url, timestamp_millis: u128) -> Url {
    let mut busted = url.clone();
    busted
        .query_pairs_mut()
        .append_pair("t", &timestamp_millis.to_string());
    busted
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

pub struct PlaybackController<P> {
    player: P,
}

impl<P: Player> PlaybackController<P> {
    pub fn new(player: P) -> Self {
        Self { player }
    }

    /// Present the response audio and return once playback is over.
    ///
    /// Full-screen and playback failures are logged only; the caller resets
    /// the page afterwards either way.
    pub async fn present(&self, surface: &mut dyn Surface, url: &Url) {
        let source = cache_busted(url, now_millis());
        tracing::info!("Playing response audio from {}", source);

        surface.show_player(true);

        if let Err(e) = surface.request_fullscreen() {
            tracing::debug!("{}", e);
        }

        match self.player.play(&source, MAX_VOLUME).await {
            Ok(()) => tracing::info!("Audio playback completed"),
            Err(e) => tracing::error!("Error playing audio: {}", e),
        }
    }
}
