pub mod recorder;

pub use recorder::{MediaCapture, Recorder, RecorderHandle};
