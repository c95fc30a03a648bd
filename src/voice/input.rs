//! Hold-to-talk speech input
//!
//! A press arms a short debounce timer; capture only starts if the press is
//! still held when it fires, so a quick tap never opens the microphone.
//! Interim transcripts land in a staging field the user can edit before
//! submitting.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::recognizer::{RecognitionError, SpeechRecognizer, TranscriptUpdate};
use crate::session::{Status, StatusIndicator};
use crate::{Error, Result};

/// Delay between press and capture start
pub const PRESS_DEBOUNCE: Duration = Duration::from_millis(50);

type RecognitionResult = std::result::Result<String, RecognitionError>;

enum CaptureState {
    Idle,
    Armed(JoinHandle<()>),
    Active {
        stop: Option<oneshot::Sender<()>>,
        task: JoinHandle<RecognitionResult>,
    },
}

impl CaptureState {
    fn is_busy(&self) -> bool {
        match self {
            Self::Idle => false,
            Self::Armed(_) => true,
            Self::Active { task, .. } => !task.is_finished(),
        }
    }
}

struct Inner {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    staging: watch::Sender<String>,
    status: StatusIndicator,
    debounce: Duration,
    state: Mutex<CaptureState>,
}

/// Converts held-button speech into staged text
#[derive(Clone)]
pub struct SpeechInputCapture {
    inner: Arc<Inner>,
}

impl SpeechInputCapture {
    /// Create a capture with the default press debounce
    ///
    /// `recognizer` is `None` when the platform has no speech recognition.
    #[must_use]
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>, status: StatusIndicator) -> Self {
        Self::with_debounce(recognizer, status, PRESS_DEBOUNCE)
    }

    /// Create a capture with a custom press debounce
    #[must_use]
    pub fn with_debounce(
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        status: StatusIndicator,
        debounce: Duration,
    ) -> Self {
        let (staging, _rx) = watch::channel(String::new());
        Self {
            inner: Arc::new(Inner {
                recognizer,
                staging,
                status,
                debounce,
                state: Mutex::new(CaptureState::Idle),
            }),
        }
    }

    /// Whether speech recognition exists on this platform
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner.recognizer.is_some()
    }

    /// Whether a press is armed or a recognition session is running
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state().is_busy()
    }

    /// Current staged text
    #[must_use]
    pub fn staged_text(&self) -> String {
        self.inner.staging.borrow().clone()
    }

    /// Overwrite the staged text (user edits)
    pub fn set_staged_text(&self, text: impl Into<String>) {
        self.inner.staging.send_replace(text.into());
    }

    /// Watch the staged text change
    #[must_use]
    pub fn subscribe_staging(&self) -> watch::Receiver<String> {
        self.inner.staging.subscribe()
    }

    fn state(&self) -> MutexGuard<'_, CaptureState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin a recognition session right away
    ///
    /// Clears the staged text and sets the status to listening. Does nothing
    /// if a session is already running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecognizerUnavailable`] if the platform has no recognizer
    pub fn start_capture(&self) -> Result<()> {
        let mut state = self.state();
        self.begin(&mut state)
    }

    /// Install a new session in `state`; the caller holds the lock throughout
    fn begin(&self, state: &mut CaptureState) -> Result<()> {
        let Some(recognizer) = self.inner.recognizer.clone() else {
            return Err(Error::RecognizerUnavailable(
                "no speech recognizer on this platform".to_string(),
            ));
        };

        if matches!(*state, CaptureState::Active { .. }) && state.is_busy() {
            return Ok(());
        }

        self.inner.staging.send_replace(String::new());
        self.inner.status.set(Status::Listening);

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_recognition(
            Arc::clone(&self.inner),
            recognizer,
            stop_rx,
        ));
        *state = CaptureState::Active {
            stop: Some(stop_tx),
            task,
        };

        tracing::debug!("speech capture started");
        Ok(())
    }

    /// Ask the running session to stop
    ///
    /// The status moves to processing; the session resets it to idle once the
    /// final transcript is in, or to an error if recognition failed.
    pub fn stop_capture(&self) {
        let mut state = self.state();
        if let CaptureState::Active { stop, task } = &mut *state
            && let Some(stop) = stop.take()
            && !task.is_finished()
        {
            let _ = stop.send(());
            self.inner.status.set(Status::Processing);
            tracing::debug!("speech capture stopping");
        }
    }

    /// Hold-to-talk press: start capture after the debounce delay
    ///
    /// Ignored while a press is armed or a session is running.
    pub fn press(&self) {
        let mut state = self.state();
        if state.is_busy() {
            return;
        }

        let capture = self.clone();
        let debounce = self.inner.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            capture.fire_armed();
        });
        *state = CaptureState::Armed(timer);
    }

    /// Hold-to-talk release
    ///
    /// Before the debounce fires this cancels the press and returns `false`;
    /// afterwards it stops the session and returns `true`.
    pub fn release(&self) -> bool {
        let armed = {
            let mut state = self.state();
            match std::mem::replace(&mut *state, CaptureState::Idle) {
                CaptureState::Armed(timer) => {
                    timer.abort();
                    true
                }
                other => {
                    *state = other;
                    false
                }
            }
        };

        if armed {
            tracing::debug!("press released before capture started");
            return false;
        }

        self.stop_capture();
        true
    }

    /// Wait for the current session to end and return its result
    ///
    /// `None` if no session was started since the last call.
    pub async fn finished(&self) -> Option<RecognitionResult> {
        let task = {
            let mut state = self.state();
            match std::mem::replace(&mut *state, CaptureState::Idle) {
                CaptureState::Active { task, .. } => task,
                other => {
                    *state = other;
                    return None;
                }
            }
        };

        Some(task.await.unwrap_or(Err(RecognitionError::Aborted)))
    }

    fn fire_armed(&self) {
        let started = {
            let mut state = self.state();
            if !matches!(*state, CaptureState::Armed(_)) {
                return;
            }
            *state = CaptureState::Idle;
            // Same guard: a release either sees the press still armed or the session active
            self.begin(&mut state)
        };

        if let Err(e) = started {
            tracing::warn!(error = %e, "speech capture unavailable");
            self.inner
                .status
                .set(Status::Error("speech recognition not supported".to_string()));
        }
    }
}

async fn run_recognition(
    inner: Arc<Inner>,
    recognizer: Arc<dyn SpeechRecognizer>,
    stop: oneshot::Receiver<()>,
) -> RecognitionResult {
    let (tx, mut rx) = mpsc::unbounded_channel::<TranscriptUpdate>();

    let forward = async {
        while let Some(update) = rx.recv().await {
            inner.staging.send_replace(update.text());
        }
    };
    let (result, ()) = tokio::join!(recognizer.recognize(stop, tx), forward);

    match &result {
        Ok(text) => {
            inner.staging.send_replace(text.clone());
            inner.status.set(Status::Idle);
            tracing::debug!(chars = text.len(), "speech captured");
        }
        Err(e) => {
            tracing::warn!(error = %e, "speech recognition failed");
            inner.status.set(Status::Error("mic".to_string()));
            inner.status.set(Status::Idle);
        }
    }

    result
}
