use crate::audio::{AudioBlob, CaptureError, CaptureStatus};
use std::path::PathBuf;
use tokio::sync::oneshot;

/// Commands for the Recorder service
pub enum RecorderCommand {
    Begin(oneshot::Sender<Result<(), CaptureError>>),
    Stop(oneshot::Sender<Result<AudioBlob, CaptureError>>),
    Reset,
    Status(oneshot::Sender<CaptureStatus>),
}

/// User input delivered to the interaction controller
#[derive(Clone, Debug, PartialEq)]
pub enum UiInput {
    /// The action control was activated
    Click,
    /// An image file was chosen
    SelectImage(PathBuf),
    Quit,
}

/// Interaction state of the page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionState {
    AwaitingFirstClick,
    Recording,
    AwaitingSubmit,
    Submitting,
    WaitingForServer,
    Done,
}
