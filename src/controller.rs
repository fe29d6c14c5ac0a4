//! The interaction state machine.
//!
//! One controller owns everything a page load owns: interaction state, image
//! selection and pending timers. A full reset throws that page away and
//! starts a fresh one; it is the only recovery path.

use crate::audio::{CaptureError, CaptureStatus};
use crate::messages::{InteractionState, UiInput};
use crate::playback::{PlaybackController, Player};
use crate::selection::SelectionStore;
use crate::services::MediaCapture;
use crate::ui::Surface;
use crate::upload::Uploader;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{Instant, sleep_until};

const STARTING_LABEL: &str = "Starting...";
const STOP_LABEL: &str = "Stop Recording";
const REQUEST_SENT_LABEL: &str = "Request Sent";
const START_OVER_LABEL: &str = "Start Over";

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Delay between a successful capture start and re-enabling the action
    pub capture_ready_delay: Duration,
    /// Delay before resetting when a submit finds nothing recorded
    pub reset_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            capture_ready_delay: Duration::from_millis(500),
            reset_delay: Duration::from_secs(1),
        }
    }
}

/// Per-page state, replaced wholesale on reset
struct Page {
    state: InteractionState,
    selection: SelectionStore,
    capture_ready_at: Option<Instant>,
    reset_at: Option<Instant>,
}

impl Page {
    fn new() -> Self {
        Self {
            state: InteractionState::AwaitingFirstClick,
            selection: SelectionStore::new(),
            capture_ready_at: None,
            reset_at: None,
        }
    }
}

struct Inputs {
    rx: mpsc::Receiver<UiInput>,
    closed: bool,
}

impl Inputs {
    /// Drive `step` to completion while keeping input flowing.
    ///
    /// Clicks that arrive meanwhile are rejected; image picks still land in
    /// the selection. A quit drops the step and returns `None`.
    async fn while_pending<F: Future>(
        &mut self,
        selection: &mut SelectionStore,
        step: F,
    ) -> Option<F::Output> {
        tokio::pin!(step);

        loop {
            tokio::select! {
                biased;

                output = &mut step => return Some(output),

                input = self.rx.recv(), if !self.closed => match input {
                    Some(UiInput::Click) => {
                        tracing::debug!("Ignoring click while a step is pending");
                    }
                    Some(UiInput::SelectImage(path)) => selection.set(path),
                    Some(UiInput::Quit) => {
                        tracing::info!("Quit requested, abandoning pending step");
                        self.closed = true;
                        return None;
                    }
                    None => self.closed = true,
                },
            }
        }
    }

    /// Drop input queued against the previous page
    fn discard_pending(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(UiInput::Quit) | Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
                Ok(input) => tracing::debug!("Discarding {:?} from previous page", input),
                Err(TryRecvError::Empty) => break,
            }
        }
    }
}

pub struct InteractionController<C, U, P, S> {
    capture: C,
    uploader: U,
    playback: PlaybackController<P>,
    surface: S,
    timing: Timing,
    inputs: Inputs,
    page: Page,
    page_loads: u32,
}

impl<C, U, P, S> InteractionController<C, U, P, S>
where
    C: MediaCapture,
    U: Uploader,
    P: Player,
    S: Surface,
{
    pub fn new(
        capture: C,
        uploader: U,
        player: P,
        surface: S,
        timing: Timing,
        inputs: mpsc::Receiver<UiInput>,
    ) -> Self {
        Self {
            capture,
            uploader,
            playback: PlaybackController::new(player),
            surface,
            timing,
            inputs: Inputs {
                rx: inputs,
                closed: false,
            },
            page: Page::new(),
            page_loads: 0,
        }
    }

    /// Process input until it is closed or the user quits
    pub async fn run(&mut self) {
        self.surface.reset();

        while !self.inputs.closed {
            let capture_ready_at = self.page.capture_ready_at;
            let reset_at = self.page.reset_at;

            tokio::select! {
                input = self.inputs.rx.recv() => match input {
                    Some(input) => self.handle_input(input).await,
                    None => self.inputs.closed = true,
                },

                _ = sleep_until(capture_ready_at.unwrap_or_else(Instant::now)),
                    if capture_ready_at.is_some() => self.on_capture_ready(),

                _ = sleep_until(reset_at.unwrap_or_else(Instant::now)),
                    if reset_at.is_some() => self.full_reset().await,
            }
        }

        tracing::debug!("Input closed, interaction loop finished");
    }

    async fn handle_input(&mut self, input: UiInput) {
        match input {
            UiInput::Click => self.on_click().await,
            UiInput::SelectImage(path) => {
                tracing::info!("Selected image {:?}", path);
                self.page.selection.set(path);
            }
            UiInput::Quit => self.inputs.closed = true,
        }
    }

    async fn on_click(&mut self) {
        tracing::debug!("Click in state {:?}", self.page.state);

        match self.page.state {
            InteractionState::AwaitingFirstClick => self.start_recording().await,
            InteractionState::AwaitingSubmit => self.stop_and_submit().await,
            state => tracing::debug!("Ignoring click in state {:?}", state),
        }
    }

    async fn start_recording(&mut self) {
        self.surface.set_action(STARTING_LABEL, false);

        let Some(started) = self
            .inputs
            .while_pending(&mut self.page.selection, self.capture.begin())
            .await
        else {
            return;
        };

        match started {
            Ok(()) => {
                tracing::info!("Recording started");
                self.page.state = InteractionState::Recording;
                self.page.capture_ready_at =
                    Some(Instant::now() + self.timing.capture_ready_delay);
            }
            Err(e) => {
                // The next click finds nothing to stop and resets the page
                tracing::error!("Error accessing audio recording: {}", e);
                self.surface.show_notice(&e.to_string());
                self.surface.set_action(START_OVER_LABEL, true);
                self.page.state = InteractionState::AwaitingSubmit;
            }
        }
    }

    fn on_capture_ready(&mut self) {
        self.page.capture_ready_at = None;

        if self.page.state == InteractionState::Recording {
            self.surface.set_action(STOP_LABEL, true);
            self.page.state = InteractionState::AwaitingSubmit;
        }
    }

    async fn stop_and_submit(&mut self) {
        self.surface.show_controls(false);
        self.surface.show_waiting(true);
        self.surface.set_action(REQUEST_SENT_LABEL, false);
        self.page.state = InteractionState::Submitting;

        let Some(stopped) = self
            .inputs
            .while_pending(&mut self.page.selection, self.capture.stop())
            .await
        else {
            return;
        };

        let audio = match stopped {
            Ok(audio) => audio,
            Err(CaptureError::NotRecording) => {
                tracing::warn!(
                    "Nothing was recorded, resetting in {:?}",
                    self.timing.reset_delay
                );
                self.page.reset_at = Some(Instant::now() + self.timing.reset_delay);
                return;
            }
            Err(e) => {
                tracing::error!("Failed to stop recording: {}", e);
                self.full_reset().await;
                return;
            }
        };
        tracing::info!("Recording stopped");

        let image = self.page.selection.take_and_clear();
        self.page.state = InteractionState::WaitingForServer;

        let Some(uploaded) = self
            .inputs
            .while_pending(
                &mut self.page.selection,
                self.uploader.submit(image, audio),
            )
            .await
        else {
            return;
        };

        match uploaded {
            Ok(url) => {
                self.surface.show_waiting(false);
                self.page.state = InteractionState::Done;

                let presented = self
                    .inputs
                    .while_pending(
                        &mut self.page.selection,
                        self.playback.present(&mut self.surface, &url),
                    )
                    .await;
                if presented.is_none() {
                    return;
                }

                tracing::info!("Playback finished, resetting page");
                self.full_reset().await;
            }
            Err(e) => {
                tracing::error!("Error sending files to server: {}", e);
                self.full_reset().await;
            }
        }
    }

    async fn full_reset(&mut self) {
        self.page_loads += 1;
        tracing::info!("Resetting page (load {})", self.page_loads);

        self.capture.reset().await;
        let status = self.capture.status().await;
        if status != CaptureStatus::Idle {
            tracing::warn!("Capture still {:?} after reset", status);
        }

        self.page = Page::new();
        self.inputs.discard_pending();
        self.surface.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioBlob;
    use crate::playback::PlaybackError;
    use crate::ui::{FullscreenError, START_LABEL};
    use crate::upload::UploadError;
    use async_trait::async_trait;
    use reqwest::Url;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use tokio::time::sleep;

    #[derive(Default)]
    struct CaptureLog {
        begins: u32,
        stops: u32,
        resets: u32,
        recording: bool,
    }

    struct FakeCapture {
        log: Rc<RefCell<CaptureLog>>,
        begin_delay: Duration,
        begin_error: Option<CaptureError>,
        stop_error: Option<CaptureError>,
    }

    #[async_trait(?Send)]
    impl MediaCapture for FakeCapture {
        async fn begin(&self) -> Result<(), CaptureError> {
            sleep(self.begin_delay).await;
            let mut log = self.log.borrow_mut();
            log.begins += 1;
            match &self.begin_error {
                Some(err) => Err(err.clone()),
                None => {
                    log.recording = true;
                    Ok(())
                }
            }
        }

        async fn stop(&self) -> Result<AudioBlob, CaptureError> {
            let mut log = self.log.borrow_mut();
            log.stops += 1;
            if !log.recording {
                return Err(CaptureError::NotRecording);
            }
            log.recording = false;
            if let Some(err) = &self.stop_error {
                return Err(err.clone());
            }
            Ok(AudioBlob::new(
                vec![7; 32],
                "audio/webm",
                "recorded_audio.webm",
            ))
        }

        async fn reset(&self) {
            let mut log = self.log.borrow_mut();
            log.resets += 1;
            log.recording = false;
        }

        async fn status(&self) -> CaptureStatus {
            if self.log.borrow().recording {
                CaptureStatus::Recording
            } else {
                CaptureStatus::Idle
            }
        }
    }

    struct FakeUploader {
        calls: Rc<RefCell<Vec<(Option<PathBuf>, usize)>>>,
        result: Result<Url, UploadError>,
        delay: Duration,
    }

    #[async_trait(?Send)]
    impl Uploader for FakeUploader {
        async fn submit(&self, image: Option<PathBuf>, audio: AudioBlob) -> Result<Url, UploadError> {
            self.calls.borrow_mut().push((image, audio.len()));
            sleep(self.delay).await;
            self.result.clone()
        }
    }

    struct FakePlayer {
        played: Rc<RefCell<Vec<(Url, f32)>>>,
        result: Result<(), PlaybackError>,
    }

    #[async_trait(?Send)]
    impl Player for FakePlayer {
        async fn play(&self, source: &Url, volume: f32) -> Result<(), PlaybackError> {
            self.played.borrow_mut().push((source.clone(), volume));
            sleep(Duration::from_secs(3)).await;
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct SurfaceLog {
        actions: Vec<(String, bool)>,
        player_shown: bool,
        waiting_shown: bool,
        fullscreen_requests: u32,
        resets: Vec<Instant>,
    }

    struct FakeSurface {
        log: Rc<RefCell<SurfaceLog>>,
        fullscreen_ok: bool,
    }

    impl Surface for FakeSurface {
        fn set_action(&mut self, label: &str, enabled: bool) {
            self.log
                .borrow_mut()
                .actions
                .push((label.to_string(), enabled));
        }

        fn show_controls(&mut self, _visible: bool) {}

        fn show_waiting(&mut self, visible: bool) {
            self.log.borrow_mut().waiting_shown = visible;
        }

        fn show_player(&mut self, visible: bool) {
            self.log.borrow_mut().player_shown = visible;
        }

        fn show_notice(&mut self, _message: &str) {}

        fn request_fullscreen(&mut self) -> Result<(), FullscreenError> {
            self.log.borrow_mut().fullscreen_requests += 1;
            if self.fullscreen_ok {
                Ok(())
            } else {
                Err(FullscreenError("blocked".to_string()))
            }
        }

        fn reset(&mut self) {
            let mut log = self.log.borrow_mut();
            log.actions.push((START_LABEL.to_string(), true));
            log.player_shown = false;
            log.waiting_shown = false;
            log.resets.push(Instant::now());
        }
    }

    struct Harness {
        capture: Rc<RefCell<CaptureLog>>,
        uploads: Rc<RefCell<Vec<(Option<PathBuf>, usize)>>>,
        played: Rc<RefCell<Vec<(Url, f32)>>>,
        surface: Rc<RefCell<SurfaceLog>>,
        begin_delay: Duration,
        begin_error: Option<CaptureError>,
        stop_error: Option<CaptureError>,
        upload_result: Result<Url, UploadError>,
        upload_delay: Duration,
        play_result: Result<(), PlaybackError>,
        fullscreen_ok: bool,
    }

    type TestController = InteractionController<FakeCapture, FakeUploader, FakePlayer, FakeSurface>;

    impl Harness {
        fn new() -> Self {
            Self {
                capture: Rc::default(),
                uploads: Rc::default(),
                played: Rc::default(),
                surface: Rc::default(),
                begin_delay: Duration::from_millis(20),
                begin_error: None,
                stop_error: None,
                upload_result: Ok(Url::parse("http://x/y.mp3").unwrap()),
                upload_delay: Duration::from_millis(200),
                play_result: Ok(()),
                fullscreen_ok: true,
            }
        }

        fn build(&self) -> (TestController, mpsc::Sender<UiInput>) {
            let (tx, rx) = mpsc::channel(16);
            let controller = InteractionController::new(
                FakeCapture {
                    log: self.capture.clone(),
                    begin_delay: self.begin_delay,
                    begin_error: self.begin_error.clone(),
                    stop_error: self.stop_error.clone(),
                },
                FakeUploader {
                    calls: self.uploads.clone(),
                    result: self.upload_result.clone(),
                    delay: self.upload_delay,
                },
                FakePlayer {
                    played: self.played.clone(),
                    result: self.play_result.clone(),
                },
                FakeSurface {
                    log: self.surface.clone(),
                    fullscreen_ok: self.fullscreen_ok,
                },
                Timing::default(),
                rx,
            );
            (controller, tx)
        }
    }

    /// Click to start, wait for the capture-ready signal, click to submit,
    /// then leave time for upload and playback.
    async fn record_and_submit(tx: mpsc::Sender<UiInput>) {
        tx.send(UiInput::Click).await.unwrap();
        sleep(Duration::from_millis(600)).await;
        tx.send(UiInput::Click).await.unwrap();
        sleep(Duration::from_secs(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn successful_round_trip_plays_then_resets() {
        let harness = Harness::new();
        let (mut controller, tx) = harness.build();

        let script = async move {
            tx.send(UiInput::SelectImage(PathBuf::from("first.png")))
                .await
                .unwrap();
            tx.send(UiInput::SelectImage(PathBuf::from("second.png")))
                .await
                .unwrap();
            record_and_submit(tx).await;
        };
        tokio::join!(controller.run(), script);

        assert_eq!(
            *harness.uploads.borrow(),
            vec![(Some(PathBuf::from("second.png")), 32)]
        );

        let played = harness.played.borrow();
        assert_eq!(played.len(), 1);
        let (source, volume) = &played[0];
        assert!(source.as_str().starts_with("http://x/y.mp3?t="));
        assert_eq!(*volume, 1.0);
        assert_eq!(harness.surface.borrow().fullscreen_requests, 1);

        assert_eq!(controller.page_loads, 1);
        assert_eq!(controller.page.state, InteractionState::AwaitingFirstClick);
        assert_eq!(controller.page.selection.current(), None);
        assert_eq!(harness.capture.borrow().resets, 1);
        assert!(!harness.capture.borrow().recording);
    }

    #[tokio::test(start_paused = true)]
    async fn action_labels_follow_the_protocol() {
        let harness = Harness::new();
        let (mut controller, tx) = harness.build();

        tokio::join!(controller.run(), record_and_submit(tx));

        let actions = harness.surface.borrow().actions.clone();
        let expected: Vec<(String, bool)> = vec![
            (START_LABEL.to_string(), true),
            (STARTING_LABEL.to_string(), false),
            (STOP_LABEL.to_string(), true),
            (REQUEST_SENT_LABEL.to_string(), false),
            (START_LABEL.to_string(), true),
        ];
        assert_eq!(actions, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn clicks_while_starting_do_not_begin_twice() {
        let mut harness = Harness::new();
        harness.begin_delay = Duration::from_millis(300);
        let (mut controller, tx) = harness.build();

        let script = async move {
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(100)).await;
            tx.send(UiInput::Click).await.unwrap();
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_secs(2)).await;
        };
        tokio::join!(controller.run(), script);

        assert_eq!(harness.capture.borrow().begins, 1);
        assert_eq!(harness.capture.borrow().stops, 0);
        assert_eq!(controller.page.state, InteractionState::AwaitingSubmit);
    }

    #[tokio::test(start_paused = true)]
    async fn clicks_before_capture_ready_are_ignored() {
        let harness = Harness::new();
        let (mut controller, tx) = harness.build();

        let script = async move {
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(200)).await;
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(100)).await;
        };
        tokio::join!(controller.run(), script);

        assert_eq!(harness.capture.borrow().stops, 0);
        assert_eq!(controller.page.state, InteractionState::Recording);
    }

    #[tokio::test(start_paused = true)]
    async fn second_click_without_recording_resets_after_a_second() {
        let mut harness = Harness::new();
        harness.begin_error = Some(CaptureError::PermissionDenied("declined".to_string()));
        let (mut controller, tx) = harness.build();
        let started = Instant::now();

        let script = async move {
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(50)).await;
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_secs(2)).await;
        };
        tokio::join!(controller.run(), script);

        assert!(harness.uploads.borrow().is_empty());
        assert_eq!(controller.page_loads, 1);
        assert_eq!(controller.page.state, InteractionState::AwaitingFirstClick);

        let resets = harness.surface.borrow().resets.clone();
        assert_eq!(resets.len(), 2);
        let elapsed = resets[1] - started;
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_stop_resets_at_once_without_uploading() {
        let mut harness = Harness::new();
        harness.stop_error = Some(CaptureError::EmptyRecording);
        let (mut controller, tx) = harness.build();
        let started = Instant::now();

        let script = async move {
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(600)).await;
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(50)).await;
        };
        tokio::join!(controller.run(), script);

        assert_eq!(harness.capture.borrow().stops, 1);
        assert!(harness.uploads.borrow().is_empty());
        assert_eq!(controller.page_loads, 1);
        assert_eq!(controller.page.state, InteractionState::AwaitingFirstClick);

        let resets = harness.surface.borrow().resets.clone();
        assert_eq!(resets.len(), 2);
        assert!(resets[1] - started < Duration::from_millis(650));
    }

    #[tokio::test(start_paused = true)]
    async fn quit_during_playback_stops_waiting_for_it() {
        let harness = Harness::new();
        let (mut controller, tx) = harness.build();
        let started = Instant::now();

        let script = async move {
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(600)).await;
            tx.send(UiInput::Click).await.unwrap();
            // Upload takes 200 ms, playback 3 s
            sleep(Duration::from_secs(1)).await;
            tx.send(UiInput::Quit).await.unwrap();
        };
        tokio::join!(controller.run(), script);

        assert_eq!(harness.played.borrow().len(), 1);
        assert!(Instant::now() - started < Duration::from_secs(2));
        assert_eq!(controller.page_loads, 0);
        assert_eq!(controller.page.state, InteractionState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn submits_audio_without_an_image() {
        let harness = Harness::new();
        let (mut controller, tx) = harness.build();

        tokio::join!(controller.run(), record_and_submit(tx));

        assert_eq!(*harness.uploads.borrow(), vec![(None, 32)]);
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_resets_without_playback() {
        let mut harness = Harness::new();
        harness.upload_result = Err(UploadError::BadStatus {
            status: 500,
            reason: "Internal Server Error".to_string(),
        });
        let (mut controller, tx) = harness.build();

        tokio::join!(controller.run(), record_and_submit(tx));

        assert_eq!(harness.uploads.borrow().len(), 1);
        assert!(harness.played.borrow().is_empty());
        assert!(!harness.surface.borrow().player_shown);
        assert_eq!(controller.page_loads, 1);
        assert_eq!(controller.page.state, InteractionState::AwaitingFirstClick);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_response_resets_like_a_failure() {
        let mut harness = Harness::new();
        harness.upload_result = Err(UploadError::MalformedResponse);
        let (mut controller, tx) = harness.build();

        tokio::join!(controller.run(), record_and_submit(tx));

        assert!(harness.played.borrow().is_empty());
        assert_eq!(controller.page_loads, 1);
        assert_eq!(controller.page.state, InteractionState::AwaitingFirstClick);
    }

    #[tokio::test(start_paused = true)]
    async fn cosmetic_failures_do_not_stop_playback() {
        let mut harness = Harness::new();
        harness.fullscreen_ok = false;
        harness.play_result = Err(PlaybackError::Unsupported("autoplay blocked".to_string()));
        let (mut controller, tx) = harness.build();

        tokio::join!(controller.run(), record_and_submit(tx));

        assert_eq!(harness.surface.borrow().fullscreen_requests, 1);
        assert_eq!(harness.played.borrow().len(), 1);
        assert_eq!(controller.page_loads, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clicks_during_upload_are_rejected() {
        let mut harness = Harness::new();
        harness.upload_delay = Duration::from_secs(2);
        let (mut controller, tx) = harness.build();

        let script = async move {
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(600)).await;
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(500)).await;
            tx.send(UiInput::Click).await.unwrap();
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_secs(10)).await;
        };
        tokio::join!(controller.run(), script);

        assert_eq!(harness.uploads.borrow().len(), 1);
        assert_eq!(harness.capture.borrow().begins, 1);
        assert_eq!(harness.capture.borrow().stops, 1);
        assert_eq!(controller.page.state, InteractionState::AwaitingFirstClick);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_selection_picked_mid_upload() {
        let mut harness = Harness::new();
        harness.upload_delay = Duration::from_secs(2);
        let (mut controller, tx) = harness.build();

        let script = async move {
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(600)).await;
            tx.send(UiInput::Click).await.unwrap();
            sleep(Duration::from_millis(500)).await;
            tx.send(UiInput::SelectImage(PathBuf::from("late.png")))
                .await
                .unwrap();
            sleep(Duration::from_secs(10)).await;
        };
        tokio::join!(controller.run(), script);

        assert_eq!(*harness.uploads.borrow(), vec![(None, 32)]);
        assert_eq!(controller.page.selection.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_ends_the_loop() {
        let harness = Harness::new();
        let (mut controller, tx) = harness.build();

        tx.send(UiInput::Quit).await.unwrap();
        controller.run().await;

        assert_eq!(controller.page.state, InteractionState::AwaitingFirstClick);
        assert_eq!(harness.capture.borrow().begins, 0);
    }
}
