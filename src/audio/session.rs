use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    Acquiring,
    Recording,
    Stopped,
}

/// Errors surfaced by the capture pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// The platform refused microphone access
    PermissionDenied(String),
    /// No usable input device, or the device failed to start
    DeviceUnavailable(String),
    /// A session is already acquiring or recording
    AlreadyActive,
    /// Stop was requested with no recording in progress
    NotRecording,
    /// The session recorded but the device never delivered a fragment
    EmptyRecording,
    Encode(String),
    /// The recorder task is gone
    ServiceUnavailable(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::PermissionDenied(e) => write!(f, "Microphone permission denied: {}", e),
            CaptureError::DeviceUnavailable(e) => write!(f, "Audio input unavailable: {}", e),
            CaptureError::AlreadyActive => write!(f, "A capture session is already active"),
            CaptureError::NotRecording => write!(f, "Not recording"),
            CaptureError::EmptyRecording => write!(f, "Recording produced no audio data"),
            CaptureError::Encode(e) => write!(f, "Failed to encode recording: {}", e),
            CaptureError::ServiceUnavailable(e) => write!(f, "Recorder unavailable: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

/// One microphone recording, from device grant to finished chunk sequence.
///
/// The session owns the device stream exclusively; dropping the session (or
/// calling [`CaptureSession::release_stream`]) releases the device.
pub struct CaptureSession<S> {
    status: CaptureStatus,
    stream: Option<S>,
    chunks: Vec<Vec<f32>>,
}

impl<S> CaptureSession<S> {
    pub fn new() -> Self {
        Self {
            status: CaptureStatus::Acquiring,
            stream: None,
            chunks: Vec::new(),
        }
    }

    pub fn status(&self) -> CaptureStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            CaptureStatus::Acquiring | CaptureStatus::Recording
        )
    }

    pub fn start(&mut self, stream: S) {
        self.stream = Some(stream);
        self.status = CaptureStatus::Recording;
    }

    /// Append a fragment; zero-length fragments are discarded
    pub fn push(&mut self, chunk: Vec<f32>) {
        if chunk.is_empty() {
            return;
        }
        self.chunks.push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn release_stream(&mut self) {
        self.stream = None;
    }

    /// Release the device and hand over the recorded chunks
    pub fn finish(&mut self) -> Result<Vec<Vec<f32>>, CaptureError> {
        if self.status != CaptureStatus::Recording {
            return Err(CaptureError::NotRecording);
        }

        self.release_stream();
        self.status = CaptureStatus::Stopped;

        if self.chunks.is_empty() {
            return Err(CaptureError::EmptyRecording);
        }

        Ok(std::mem::take(&mut self.chunks))
    }
}

impl<S> Default for CaptureSession<S> {
    fn default() -> Self {
        Self::new()
    }
}
