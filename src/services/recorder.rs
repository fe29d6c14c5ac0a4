use crate::audio::{
    AudioBlob, AudioEncoder, AudioFormat, CaptureError, CaptureSession, CaptureStatus,
    InputBackend,
};
use crate::messages::RecorderCommand;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const CHUNK_CHANNEL_CAPACITY: usize = 100;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Microphone capture as seen by the interaction controller
#[async_trait(?Send)]
pub trait MediaCapture {
    /// Acquire the input device and start accumulating chunks
    async fn begin(&self) -> Result<(), CaptureError>;

    /// Stop, flush, and assemble the recording
    async fn stop(&self) -> Result<AudioBlob, CaptureError>;

    /// Drop any session and its chunks
    async fn reset(&self);

    async fn status(&self) -> CaptureStatus;
}

/// Owns the capture session and accumulates chunks
///
/// This service:
/// - Opens and releases the input device through an [`InputBackend`]
/// - Appends chunks as they arrive, in order
/// - Encodes the finished chunk sequence on stop
///
/// Note: the cpal backend's stream is !Send, so this service must be spawned
/// on a LocalSet using tokio::task::spawn_local.
pub struct Recorder<B: InputBackend, E> {
    format: AudioFormat,
    backend: B,
    encoder: E,
    cmd_rx: mpsc::Receiver<RecorderCommand>,
    chunk_rx: Option<mpsc::Receiver<Vec<f32>>>,
    session: Option<CaptureSession<B::Stream>>,
}

impl<B: InputBackend, E: AudioEncoder> Recorder<B, E> {
    pub fn new(
        format: AudioFormat,
        backend: B,
        encoder: E,
        cmd_rx: mpsc::Receiver<RecorderCommand>,
    ) -> Self {
        Self {
            format,
            backend,
            encoder,
            cmd_rx,
            chunk_rx: None,
            session: None,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                // Handle commands from the controller
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },

                // Append chunks while a session is open
                chunk = next_chunk(&mut self.chunk_rx) => match chunk {
                    Some(chunk) => {
                        if let Some(session) = self.session.as_mut() {
                            session.push(chunk);
                        }
                    }
                    None => {
                        tracing::debug!("Chunk channel closed");
                        self.chunk_rx = None;
                    }
                },
            }
        }

        tracing::debug!("Recorder shut down");
    }

    async fn handle_command(&mut self, cmd: RecorderCommand) {
        match cmd {
            RecorderCommand::Begin(reply) => {
                let _ = reply.send(self.begin());
            }
            RecorderCommand::Stop(reply) => {
                let _ = reply.send(self.stop().await);
            }
            RecorderCommand::Reset => {
                if let Some(session) = self.session.take() {
                    tracing::info!(
                        "Capture session discarded with {} chunks",
                        session.chunk_count()
                    );
                }
                self.chunk_rx = None;
            }
            RecorderCommand::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn status(&self) -> CaptureStatus {
        self.session
            .as_ref()
            .map_or(CaptureStatus::Idle, |session| session.status())
    }

    fn begin(&mut self) -> Result<(), CaptureError> {
        if self.session.as_ref().is_some_and(|s| s.is_active()) {
            tracing::warn!("Begin requested while a session is active");
            return Err(CaptureError::AlreadyActive);
        }

        let mut session = CaptureSession::new();
        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);

        let stream = self.backend.open(self.format, chunk_tx).inspect_err(|e| {
            tracing::error!("Failed to start capture: {}", e);
        })?;

        session.start(stream);
        self.session = Some(session);
        self.chunk_rx = Some(chunk_rx);

        tracing::info!("Recording started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<AudioBlob, CaptureError> {
        let mut session = match self.session.take() {
            Some(session) if session.status() == CaptureStatus::Recording => session,
            other => {
                self.session = other;
                tracing::debug!("Stop requested while not recording");
                return Err(CaptureError::NotRecording);
            }
        };

        // Releasing the device makes the backend flush and close the channel
        session.release_stream();

        if let Some(mut chunk_rx) = self.chunk_rx.take() {
            let drain = async {
                while let Some(chunk) = chunk_rx.recv().await {
                    session.push(chunk);
                }
            };
            if tokio::time::timeout(FLUSH_TIMEOUT, drain).await.is_err() {
                tracing::warn!("Timed out flushing audio chunks");
            }
        }

        let chunks = session.finish()?;
        tracing::info!("Recording stopped with {} chunks", chunks.len());

        let blob = self.encoder.encode(self.format, &chunks)?;
        if blob.is_empty() {
            return Err(CaptureError::EmptyRecording);
        }
        tracing::debug!("Encoded {} bytes as {}", blob.len(), blob.media_type());
        Ok(blob)
    }
}

async fn next_chunk(chunk_rx: &mut Option<mpsc::Receiver<Vec<f32>>>) -> Option<Vec<f32>> {
    match chunk_rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Handle for communicating with the Recorder
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<RecorderCommand>,
}

impl RecorderHandle {
    pub fn new(tx: mpsc::Sender<RecorderCommand>) -> Self {
        Self { tx }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RecorderCommand,
    ) -> Result<T, CaptureError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(command(reply)).await.map_err(|e| {
            CaptureError::ServiceUnavailable(format!("Failed to send command: {}", e))
        })?;

        rx.await.map_err(|e| {
            CaptureError::ServiceUnavailable(format!("Failed to receive response: {}", e))
        })
    }
}

#[async_trait(?Send)]
impl MediaCapture for RecorderHandle {
    async fn begin(&self) -> Result<(), CaptureError> {
        self.request(RecorderCommand::Begin).await?
    }

    async fn stop(&self) -> Result<AudioBlob, CaptureError> {
        self.request(RecorderCommand::Stop).await?
    }

    async fn reset(&self) {
        if let Err(e) = self.tx.send(RecorderCommand::Reset).await {
            tracing::error!("Failed to send reset command: {}", e);
        }
    }

    async fn status(&self) -> CaptureStatus {
        self.request(RecorderCommand::Status)
            .await
            .unwrap_or(CaptureStatus::Idle)
    }
}
