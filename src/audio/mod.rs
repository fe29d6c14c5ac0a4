pub mod blob;
pub mod capture;
pub mod encoder;
pub mod format;
pub mod session;
pub mod webm;

pub use blob::AudioBlob;
pub use capture::{CpalBackend, InputBackend};
pub use encoder::{AudioEncoder, WebmOpusEncoder};
pub use format::AudioFormat;
pub use session::{CaptureError, CaptureSession, CaptureStatus};
