use super::format::AudioFormat;
use super::session::CaptureError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, BuildStreamError, SampleRate, StreamConfig};
use ringbuf::{HeapRb, traits::*};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, mpsc};

/// Opens an audio input and forwards sample chunks over `chunk_tx`.
///
/// The returned stream value keeps the device open; dropping it releases the
/// device, flushes buffered samples, and closes the chunk channel.
pub trait InputBackend {
    type Stream;

    fn open(
        &self,
        format: AudioFormat,
        chunk_tx: mpsc::Sender<Vec<f32>>,
    ) -> Result<Self::Stream, CaptureError>;
}

/// Default input device of the default cpal host
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

/// Live cpal input. Must stay on the thread that created it.
pub struct CpalInput {
    stream: Option<cpal::Stream>,
    notify: Arc<Notify>,
    closing: Arc<AtomicBool>,
}

impl Drop for CpalInput {
    fn drop(&mut self) {
        // Stop callbacks before the bridge does its final drain
        self.stream.take();
        self.closing.store(true, Ordering::Release);
        self.notify.notify_one();
    }
}

impl InputBackend for CpalBackend {
    type Stream = CpalInput;

    fn open(
        &self,
        format: AudioFormat,
        chunk_tx: mpsc::Sender<Vec<f32>>,
    ) -> Result<CpalInput, CaptureError> {
        let ring = HeapRb::<f32>::new(format.samples_for_duration(60.0));
        let (mut producer, consumer) = ring.split();

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            CaptureError::DeviceUnavailable("No input audio device available".to_string())
        })?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let notify = Arc::new(Notify::new());
        let notify_callback = notify.clone();
        let closing = Arc::new(AtomicBool::new(false));

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    producer.push_slice(data);
                    notify_callback.notify_one();
                },
                move |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(classify_build_error)?;

        stream.play().map_err(|e| {
            CaptureError::DeviceUnavailable(format!("Failed to start audio stream: {}", e))
        })?;

        let chunk_size = format.samples_for_duration(0.5);
        tokio::task::spawn_local(bridge_task(
            consumer,
            chunk_tx,
            chunk_size,
            notify.clone(),
            closing.clone(),
        ));

        tracing::info!("Audio capture started");
        Ok(CpalInput {
            stream: Some(stream),
            notify,
            closing,
        })
    }
}

/// Moves samples from the realtime ring buffer to the async side.
///
/// Full chunks are forwarded while recording; once the input is closed the
/// remainder is flushed and the task exits, dropping the sender.
async fn bridge_task(
    mut consumer: impl Consumer<Item = f32>,
    tx: mpsc::Sender<Vec<f32>>,
    chunk_size: usize,
    notify: Arc<Notify>,
    closing: Arc<AtomicBool>,
) {
    loop {
        notify.notified().await;
        let flush = closing.load(Ordering::Acquire);

        while consumer.occupied_len() >= chunk_size || (flush && consumer.occupied_len() > 0) {
            let mut chunk = vec![0.0f32; consumer.occupied_len().min(chunk_size)];
            let n = consumer.pop_slice(&mut chunk);
            if n == 0 {
                break;
            }
            chunk.truncate(n);

            if tx.send(chunk).await.is_err() {
                return;
            }
        }

        if flush {
            tracing::debug!("Audio bridge flushed and closed");
            return;
        }
    }
}

fn classify_build_error(err: BuildStreamError) -> CaptureError {
    match err {
        BuildStreamError::BackendSpecific { err } if is_permission_error(&err.description) => {
            CaptureError::PermissionDenied(err.description)
        }
        other => CaptureError::DeviceUnavailable(format!("Failed to build input stream: {}", other)),
    }
}

fn is_permission_error(description: &str) -> bool {
    let lower = description.to_lowercase();
    lower.contains("permission") || lower.contains("not permitted") || lower.contains("denied")
}
