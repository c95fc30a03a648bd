//! Speech output selection
//!
//! Decides per utterance whether to speak at all, and whether through the
//! cloud speech gateway or the on-device synthesizer. Cloud failures of any
//! kind degrade to local synthesis.

use std::sync::{Arc, PoisonError, RwLock};

use super::playback::AudioSink;
use super::synthesizer::{LocalVoice, SpeechSynthesizer};
use crate::config::SpeechPreferences;
use crate::gateway::{SpeechGateway, SynthesisResult};

/// How an utterance was (or wasn't) spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Speech is turned off
    Skipped,
    /// Played cloud audio
    Cloud,
    /// Spoken on-device by preference
    Local,
    /// Cloud attempt failed, spoken on-device instead
    LocalFallback,
    /// Nothing could speak it
    Silent,
}

/// Routes replies to cloud or local speech
pub struct SpeechOutputChooser {
    gateway: Arc<dyn SpeechGateway>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    sink: Arc<dyn AudioSink>,
    preferences: RwLock<SpeechPreferences>,
}

impl SpeechOutputChooser {
    /// Create a chooser
    ///
    /// `synthesizer` is `None` when the platform has no local speech engine;
    /// local speech then becomes a logged no-op.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn SpeechGateway>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        sink: Arc<dyn AudioSink>,
        preferences: SpeechPreferences,
    ) -> Self {
        Self {
            gateway,
            synthesizer,
            sink,
            preferences: RwLock::new(preferences),
        }
    }

    /// Current preferences
    #[must_use]
    pub fn preferences(&self) -> SpeechPreferences {
        self.preferences
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the preferences; the next utterance uses them
    pub fn set_preferences(&self, preferences: SpeechPreferences) {
        *self
            .preferences
            .write()
            .unwrap_or_else(PoisonError::into_inner) = preferences;
    }

    /// Local voices, empty when there is no engine
    pub async fn local_voices(&self) -> Vec<LocalVoice> {
        match &self.synthesizer {
            Some(synth) => synth.voices().await,
            None => Vec::new(),
        }
    }

    /// Speak `text` according to the current preferences
    pub async fn speak(&self, text: &str) -> SpeechOutcome {
        self.speak_with_cloud_voice(text, None).await
    }

    /// Speak `text`, using `cloud_voice` instead of the preferred voice
    /// if the cloud path is taken
    pub async fn speak_with_cloud_voice(
        &self,
        text: &str,
        cloud_voice: Option<&str>,
    ) -> SpeechOutcome {
        let preferences = self.preferences();
        if !preferences.speak {
            return SpeechOutcome::Skipped;
        }

        let local_voice = preferences.voice.as_deref();
        if !preferences.cloud_tts {
            return if self.speak_local(text, local_voice).await {
                SpeechOutcome::Local
            } else {
                SpeechOutcome::Silent
            };
        }

        let voice = cloud_voice.or(local_voice);
        match self.gateway.synthesize(text, voice).await {
            Ok(SynthesisResult::Audio(audio)) => match self.sink.play(audio).await {
                Ok(()) => return SpeechOutcome::Cloud,
                Err(e) => tracing::warn!(error = %e, "cloud audio playback failed"),
            },
            Ok(SynthesisResult::NoAudio) => {
                tracing::warn!("speech gateway returned no audio");
            }
            Err(e) => tracing::warn!(error = %e, "speech gateway failed"),
        }

        if self.speak_local(text, local_voice).await {
            SpeechOutcome::LocalFallback
        } else {
            SpeechOutcome::Silent
        }
    }

    /// Speak on-device, cancelling whatever is in progress
    ///
    /// Picks the voice whose name equals `voice`, else the first one available.
    /// Returns `false` if there is no engine or it failed to start.
    pub async fn speak_local(&self, text: &str, voice: Option<&str>) -> bool {
        let Some(synth) = &self.synthesizer else {
            tracing::warn!("no local speech engine available");
            return false;
        };

        let voices = synth.voices().await;
        let chosen = voice
            .and_then(|name| voices.iter().find(|v| v.name == name))
            .or_else(|| voices.first());

        match synth.speak(text, chosen).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "local speech failed");
                false
            }
        }
    }

    /// Stop any local utterance
    pub async fn cancel(&self) {
        if let Some(synth) = &self.synthesizer {
            synth.cancel().await;
        }
    }

    /// Wait for the local utterance in progress to finish
    pub async fn wait(&self) {
        if let Some(synth) = &self.synthesizer {
            synth.wait().await;
        }
    }
}
