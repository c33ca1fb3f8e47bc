//! Recording lifecycle controller
//!
//! Drives one capture sink through the Idle/Recording/Paused state machine,
//! collects the chunks it produces and hands the finished recording to a
//! store when the session ends.

use super::chunks::{Chunk, ChunkBuffer};
use super::countdown::Countdown;
use super::sink::{CaptureSink, SinkError};
use super::state::{
    Action, InvalidTransition, RecorderEvent, RecorderSettings, RecordingState, Transition,
};
use super::stopwatch::{ElapsedHandle, Stopwatch};
use crate::finalize::RecordingStore;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

/// Recorder errors
///
/// State is never changed when one of these is returned.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Capture failed: {0}")]
    Capture(#[from] SinkError),
}

pub type RecorderResult<T> = Result<T, RecorderError>;

/// Owns the state, timer and chunk buffer of one recording setup
pub struct Recorder {
    /// Current state, shared read-only with observers
    state: Arc<RwLock<RecordingState>>,

    settings: RecorderSettings,

    sink: Box<dyn CaptureSink>,

    store: Arc<dyn RecordingStore>,

    /// Shared so elapsed time can be read while an operation runs
    stopwatch: Arc<Mutex<Stopwatch>>,

    chunks: ChunkBuffer,

    /// Receiving end of the sink's chunk channel; present only while a
    /// session is open
    chunk_rx: Option<mpsc::UnboundedReceiver<Chunk>>,

    /// Identifier of the open session, for log correlation
    session_id: Option<Uuid>,

    event_tx: broadcast::Sender<RecorderEvent>,
}

impl Recorder {
    pub fn new(
        sink: Box<dyn CaptureSink>,
        store: Arc<dyn RecordingStore>,
        settings: RecorderSettings,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            state: Arc::new(RwLock::new(RecordingState::Idle)),
            settings,
            sink,
            store,
            stopwatch: Arc::new(Mutex::new(Stopwatch::new())),
            chunks: ChunkBuffer::new(),
            chunk_rx: None,
            session_id: None,
            event_tx,
        }
    }

    pub fn state(&self) -> RecordingState {
        *self.state.read()
    }

    /// Handle that observes the state without borrowing the recorder
    pub fn state_handle(&self) -> Arc<RwLock<RecordingState>> {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.event_tx.subscribe()
    }

    /// Active recording time of the open session
    pub fn elapsed(&self) -> Duration {
        self.stopwatch.lock().elapsed()
    }

    /// Handle that reads the elapsed time without borrowing the recorder
    pub fn elapsed_handle(&self) -> ElapsedHandle {
        ElapsedHandle::new(self.stopwatch.clone())
    }

    /// Number of chunks received so far in the open session
    pub fn chunk_count(&mut self) -> usize {
        self.collect_chunks();
        self.chunks.len()
    }

    /// Start recording from Idle (optionally after the countdown) or resume
    /// from Paused. Playing while already recording changes nothing.
    pub async fn play(&mut self, with_countdown: bool) -> RecorderResult<RecordingState> {
        let from = self.state();
        let transition = from.transition(Action::Play)?;
        match transition {
            Transition::AlreadyRecording => {
                tracing::debug!("Play ignored: already recording");
            }
            Transition::Resume => {
                tracing::info!("Resuming recording");
                self.sink.resume().await?;
                self.stopwatch.lock().resume();
                self.set_state(transition);
                self.emit(RecorderEvent::Resumed);
            }
            Transition::Begin => {
                if with_countdown {
                    self.run_countdown().await;
                }
                self.begin(transition).await?;
            }
            Transition::Suspend | Transition::Finish => {
                return Err(InvalidTransition {
                    from,
                    action: Action::Play,
                }
                .into());
            }
        }
        Ok(self.state())
    }

    /// Pause an ongoing recording.
    pub async fn pause(&mut self) -> RecorderResult<RecordingState> {
        let transition = self.state().transition(Action::Pause)?;

        tracing::info!("Pausing recording");
        self.sink.pause().await?;
        self.stopwatch.lock().pause();
        self.set_state(transition);
        self.emit(RecorderEvent::Paused {
            elapsed_secs: self.elapsed().as_secs_f64(),
        });
        Ok(self.state())
    }

    /// End the session and save what was captured.
    ///
    /// Always returns to Idle; the result is whether the recording was
    /// saved. Save failures are logged, not returned.
    pub async fn stop(&mut self) -> RecorderResult<bool> {
        let transition = self.state().transition(Action::Stop)?;

        tracing::info!("Stopping recording");

        if let Err(e) = self.sink.stop().await {
            tracing::error!("Capture sink {} failed to stop cleanly: {}", self.sink.id(), e);
        }
        let elapsed = self.stopwatch.lock().stop();

        // Nothing can arrive after this; drain what is already queued.
        if let Some(mut rx) = self.chunk_rx.take() {
            rx.close();
            while let Ok(chunk) = rx.try_recv() {
                self.chunks.push(chunk);
            }
        }

        let chunk_count = self.chunks.len();
        let data = self.chunks.take();
        tracing::debug!(
            "Finalizing {} chunks ({} bytes), {:.3}s",
            chunk_count,
            data.len(),
            elapsed.as_secs_f64()
        );

        let saved = match self.store.save(data, elapsed).await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::error!("Failed to save recording: {}", e);
                false
            }
        };

        self.chunks.clear();
        self.session_id = None;
        self.set_state(transition);
        self.emit(RecorderEvent::Stopped {
            saved,
            elapsed_secs: elapsed.as_secs_f64(),
        });

        tracing::info!(
            "Recording stopped. Duration: {:.3}s, saved: {}",
            elapsed.as_secs_f64(),
            saved
        );
        Ok(saved)
    }

    async fn run_countdown(&mut self) {
        let countdown = Countdown::new(self.settings.countdown_from, self.settings.countdown_tick);
        self.emit(RecorderEvent::CountdownStarted {
            from: self.settings.countdown_from,
        });

        let event_tx = self.event_tx.clone();
        countdown
            .run(|remaining| {
                let _ = event_tx.send(RecorderEvent::CountdownTick { remaining });
            })
            .await;

        self.emit(RecorderEvent::CountdownFinished);
    }

    async fn begin(&mut self, transition: Transition) -> RecorderResult<()> {
        let session_id = Uuid::new_v4();
        tracing::info!("Starting recording session {} on {}", session_id, self.sink.id());

        self.chunks.clear();
        self.stopwatch.lock().stop();

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        if let Err(e) = self.sink.start(chunk_tx, self.settings.chunk_interval).await {
            tracing::error!("Failed to start capture sink {}: {}", self.sink.id(), e);
            return Err(e.into());
        }

        self.chunk_rx = Some(chunk_rx);
        self.session_id = Some(session_id);
        self.stopwatch.lock().start();
        self.set_state(transition);
        self.emit(RecorderEvent::Started { session_id });

        Ok(())
    }

    /// Move queued chunks into the buffer.
    fn collect_chunks(&mut self) {
        if let Some(rx) = self.chunk_rx.as_mut() {
            while let Ok(chunk) = rx.try_recv() {
                self.chunks.push(chunk);
            }
        }
    }

    fn set_state(&self, transition: Transition) {
        *self.state.write() = transition.target();
    }

    fn emit(&self, event: RecorderEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}
