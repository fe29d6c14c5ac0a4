use super::blob::AudioBlob;
use super::format::AudioFormat;
use super::session::CaptureError;
use super::webm::{OpusTrack, mux_opus};
use opus::{Application, Channels};

/// Turns a finished chunk sequence into an uploadable blob.
///
/// Every encoder declares one fixed media type and file name; the upload
/// attaches the blob under exactly those values.
pub trait AudioEncoder {
    fn media_type(&self) -> &'static str;

    fn file_name(&self) -> &'static str;

    /// Encode chunks in insertion order
    fn encode(&self, format: AudioFormat, chunks: &[Vec<f32>]) -> Result<AudioBlob, CaptureError>;
}

const FRAME_MS: u64 = 20;
// Largest packet libopus recommends reserving room for
const MAX_PACKET_BYTES: usize = 4000;
// libopus encoder lookahead (6.5 ms) expressed at 48 kHz
const OPUS_PRE_SKIP: u16 = 312;

/// Opus in a WebM container, the format the upload endpoint accepts
#[derive(Debug, Default, Clone, Copy)]
pub struct WebmOpusEncoder;

impl AudioEncoder for WebmOpusEncoder {
    fn media_type(&self) -> &'static str {
        "audio/webm"
    }

    fn file_name(&self) -> &'static str {
        "recorded_audio.webm"
    }

    fn encode(&self, format: AudioFormat, chunks: &[Vec<f32>]) -> Result<AudioBlob, CaptureError> {
        let channels = match format.channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            n => {
                return Err(CaptureError::Encode(format!(
                    "Opus supports mono or stereo, not {} channels",
                    n
                )));
            }
        };

        let mut encoder = opus::Encoder::new(format.sample_rate, channels, Application::Voip)
            .map_err(|e| CaptureError::Encode(format!("Failed to create Opus encoder: {}", e)))?;

        // Interleaved samples per 20 ms frame
        let frame_len = (u64::from(format.sample_rate) * FRAME_MS / 1000) as usize
            * usize::from(format.channels);
        let samples: Vec<f32> = chunks
            .iter()
            .flatten()
            .map(|sample| sample.clamp(-1.0, 1.0))
            .collect();

        let mut packets = Vec::with_capacity(samples.len() / frame_len.max(1) + 1);
        let mut packet = [0u8; MAX_PACKET_BYTES];
        for frame in samples.chunks(frame_len.max(1)) {
            // The last frame is padded with silence to a full frame
            let mut frame = frame.to_vec();
            frame.resize(frame_len, 0.0);

            let len = encoder
                .encode_float(&frame, &mut packet)
                .map_err(|e| CaptureError::Encode(format!("Failed to encode Opus frame: {}", e)))?;
            packets.push(packet[..len].to_vec());
        }

        let track = OpusTrack {
            channels: format.channels as u8,
            input_sample_rate: format.sample_rate,
            pre_skip: OPUS_PRE_SKIP,
        };
        tracing::debug!("Encoded {} Opus frames", packets.len());

        Ok(AudioBlob::new(
            mux_opus(&track, &packets, FRAME_MS),
            self.media_type(),
            self.file_name(),
        ))
    }
}
