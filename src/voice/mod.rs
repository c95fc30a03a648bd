//! Voice input and output
//!
//! Cloud synthesis and transcription clients used by the gateway, plus the
//! terminal side: microphone capture, speaker playback, the platform speech
//! engine, and the hold-to-talk and output-selection logic built on them.

mod capture;
pub mod catalog;
mod input;
mod output;
mod playback;
mod recognizer;
mod stt;
mod synthesizer;
mod tts;

pub use capture::{Recording, SAMPLE_RATE, encode_wav, input_available};
pub use catalog::{CatalogVoice, DEFAULT_VOICE};
pub use input::{PRESS_DEBOUNCE, SpeechInputCapture};
pub use output::{SpeechOutcome, SpeechOutputChooser};
pub use playback::{AudioSink, DecodedAudio, SpeakerSink, decode_mp3};
pub use recognizer::{MicrophoneRecognizer, RecognitionError, SpeechRecognizer, TranscriptUpdate};
pub use stt::{Transcriber, WhisperTranscriber};
pub use synthesizer::{CommandSynthesizer, LocalVoice, SpeechSynthesizer};
pub use tts::{TextToSpeech, TtsProvider};
