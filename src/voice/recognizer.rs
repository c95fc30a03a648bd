//! Speech recognition
//!
//! A recognizer runs one single-shot session: it streams interim transcript
//! updates while listening and resolves with the final transcript once told
//! to stop (or once its own time limit is hit).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::capture::{self, Recording};
use super::stt::Transcriber;
use crate::{Error, Result};

/// Minimum audio worth transcribing
const MIN_SPEECH: Duration = Duration::from_millis(300);

/// Snapshot of everything recognized so far in a session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranscriptUpdate {
    /// Top transcript of each result segment, in order
    pub segments: Vec<String>,
}

impl TranscriptUpdate {
    /// Update with a single segment
    #[must_use]
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            segments: vec![text.into()],
        }
    }

    /// All segments joined and trimmed
    #[must_use]
    pub fn text(&self) -> String {
        self.segments.concat().trim().to_string()
    }
}

/// Why a recognition session ended without a transcript
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    /// Nothing was said
    #[error("no speech detected")]
    NoSpeech,
    /// The microphone could not be used
    #[error("audio capture failed: {0}")]
    AudioCapture(String),
    /// Transcription service failed
    #[error("recognition service failed: {0}")]
    Network(String),
    /// The session was torn down before finishing
    #[error("recognition aborted")]
    Aborted,
}

/// Single-shot speech recognizer
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen until `stop` resolves (sent or dropped)
    ///
    /// Interim results go to `updates`; the sender must be dropped by the
    /// time this returns.
    async fn recognize(
        &self,
        stop: oneshot::Receiver<()>,
        updates: mpsc::UnboundedSender<TranscriptUpdate>,
    ) -> std::result::Result<String, RecognitionError>;
}

/// Records the default microphone and transcribes through a [`Transcriber`]
///
/// Interim results come from re-transcribing the growing recording.
pub struct MicrophoneRecognizer {
    transcriber: Arc<dyn Transcriber>,
    interim_every: Option<Duration>,
    max_duration: Duration,
}

impl MicrophoneRecognizer {
    /// Create a recognizer if this machine has a microphone
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecognizerUnavailable`] if no input device exists
    pub fn detect(transcriber: Arc<dyn Transcriber>) -> Result<Self> {
        if !capture::input_available() {
            return Err(Error::RecognizerUnavailable(
                "no microphone found".to_string(),
            ));
        }

        Ok(Self {
            transcriber,
            interim_every: Some(Duration::from_secs(2)),
            max_duration: Duration::from_secs(30),
        })
    }

    /// Interval for interim transcriptions; `None` disables them
    #[must_use]
    pub const fn with_interim_every(mut self, interval: Option<Duration>) -> Self {
        self.interim_every = interval;
        self
    }

    /// Hard limit on a single session
    #[must_use]
    pub const fn with_max_duration(mut self, limit: Duration) -> Self {
        self.max_duration = limit;
        self
    }

    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> std::result::Result<String, RecognitionError> {
        let wav = capture::encode_wav(samples, sample_rate)
            .map_err(|e| RecognitionError::AudioCapture(e.to_string()))?;
        self.transcriber
            .transcribe(wav)
            .await
            .map_err(|e| RecognitionError::Network(e.to_string()))
    }
}

/// Run `work` unless `stop` resolves first
async fn until_stopped<T>(
    stop: &mut oneshot::Receiver<()>,
    work: impl Future<Output = T>,
) -> Option<T> {
    tokio::select! {
        _ = stop => None,
        output = work => Some(output),
    }
}

fn min_samples(sample_rate: u32) -> usize {
    let rate = usize::try_from(sample_rate).unwrap_or(usize::MAX);
    rate.saturating_mul(usize::try_from(MIN_SPEECH.as_millis()).unwrap_or(0)) / 1000
}

#[async_trait]
impl SpeechRecognizer for MicrophoneRecognizer {
    async fn recognize(
        &self,
        mut stop: oneshot::Receiver<()>,
        updates: mpsc::UnboundedSender<TranscriptUpdate>,
    ) -> std::result::Result<String, RecognitionError> {
        let recording = tokio::task::spawn_blocking(Recording::start)
            .await
            .map_err(|_| RecognitionError::Aborted)?
            .map_err(|e| RecognitionError::AudioCapture(e.to_string()))?;
        let sample_rate = recording.sample_rate();
        let started = Instant::now();

        let mut ticker = tokio::time::interval(self.interim_every.unwrap_or(self.max_duration));
        ticker.tick().await;
        let mut transcribed_len = 0;

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    if started.elapsed() >= self.max_duration {
                        tracing::debug!("recognition time limit reached");
                        break;
                    }
                    if self.interim_every.is_none() {
                        continue;
                    }

                    let samples = recording.snapshot();
                    if samples.len() < min_samples(sample_rate) || samples.len() == transcribed_len {
                        continue;
                    }
                    transcribed_len = samples.len();
                    let Some(interim) =
                        until_stopped(&mut stop, self.transcribe(&samples, sample_rate)).await
                    else {
                        break;
                    };
                    match interim {
                        Ok(text) => {
                            let _ = updates.send(TranscriptUpdate::single(text));
                        }
                        Err(e) => tracing::debug!(error = %e, "interim transcription failed"),
                    }
                }
            }
        }

        let samples = tokio::task::spawn_blocking(move || recording.finish())
            .await
            .map_err(|_| RecognitionError::Aborted)?;
        if samples.len() < min_samples(sample_rate) {
            return Err(RecognitionError::NoSpeech);
        }

        let update = TranscriptUpdate::single(self.transcribe(&samples, sample_rate).await?);
        let text = update.text();
        if text.is_empty() {
            return Err(RecognitionError::NoSpeech);
        }

        let _ = updates.send(update);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_text_concatenates_and_trims() {
        let update = TranscriptUpdate {
            segments: vec![" what's the".to_string(), " weather ".to_string()],
        };
        assert_eq!(update.text(), "what's the weather");
        assert_eq!(TranscriptUpdate::default().text(), "");
    }

    #[test]
    fn test_minimum_speech_length() {
        assert_eq!(min_samples(16_000), 4_800);
        assert_eq!(min_samples(0), 0);
    }

    #[tokio::test]
    async fn test_stop_interrupts_slow_transcription() {
        let (tx, mut stop) = oneshot::channel::<()>();
        tx.send(()).unwrap();

        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            until_stopped(&mut stop, std::future::pending::<()>()),
        )
        .await
        .unwrap();

        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_transcription_finishes_while_listening() {
        let (_tx, mut stop) = oneshot::channel::<()>();

        let outcome = until_stopped(&mut stop, async { "hello" }).await;

        assert_eq!(outcome, Some("hello"));
    }
}
