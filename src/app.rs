use crate::audio::{AudioFormat, CpalBackend, WebmOpusEncoder};
use crate::config::Config;
use crate::controller::{InteractionController, Timing};
use crate::input;
use crate::messages::UiInput;
use crate::playback::RodioPlayer;
use crate::services::{Recorder, RecorderHandle};
use crate::shortcuts;
use crate::ui::TerminalSurface;
use crate::upload::UploadClient;

use anyhow::Result;
use tokio::sync::mpsc;

type Controller =
    InteractionController<RecorderHandle, UploadClient, RodioPlayer, TerminalSurface<std::io::Stdout>>;

pub struct App {
    controller: Controller,
}

impl App {
    /// Wire up the pipeline. Must be called inside a LocalSet.
    pub fn new(config: Config) -> Result<Self> {
        let format = AudioFormat {
            sample_rate: config.sample_rate,
            ..AudioFormat::default()
        };
        let recorder = Self::setup_audio_pipeline(format);

        let uploader = UploadClient::from_config(&config)?;
        tracing::info!("Uploading to {}", uploader.endpoint());

        let player = RodioPlayer::from_config(&config)?;

        let (input_tx, input_rx) = mpsc::channel(10);
        Self::setup_input(&config, input_tx)?;

        let timing = Timing {
            capture_ready_delay: config.capture_ready_delay(),
            reset_delay: config.reset_delay(),
        };

        let controller = InteractionController::new(
            recorder,
            uploader,
            player,
            TerminalSurface::stdout(),
            timing,
            input_rx,
        );

        Ok(Self { controller })
    }

    pub async fn run(mut self) -> Result<()> {
        tracing::info!("Ready! Press Enter to start/stop recording, type a path to choose an image");
        self.controller.run().await;
        Ok(())
    }

    fn setup_audio_pipeline(format: AudioFormat) -> RecorderHandle {
        // Create and spawn Recorder (using spawn_local because it's !Send)
        let (recorder_tx, recorder_rx) = mpsc::channel(10);
        let recorder = Recorder::new(format, CpalBackend, WebmOpusEncoder, recorder_rx);
        tokio::task::spawn_local(recorder.run());

        RecorderHandle::new(recorder_tx)
    }

    fn setup_input(config: &Config, tx: mpsc::Sender<UiInput>) -> Result<()> {
        if let Some(spec) = &config.action_shortcut {
            let shortcut = shortcuts::parse_shortcut(spec)?;
            let shortcut_tx = tx.clone();
            tokio::spawn(async move {
                if let Err(e) = shortcuts::monitor_keyboards(shortcut, shortcut_tx).await {
                    tracing::warn!("Keyboard shortcut disabled: {}", e);
                }
            });
        }

        input::spawn_stdin_reader(tx)?;

        Ok(())
    }
}
