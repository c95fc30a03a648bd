//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use friday_gateway::config::SpeechPreferences;
use friday_gateway::conversation::Turn;
use friday_gateway::gateway::{CompletionGateway, CompletionRequest, SpeechGateway};
use friday_gateway::providers::{ChatProvider, SpeechProvider};
use friday_gateway::voice::{
    AudioSink, CatalogVoice, LocalVoice, RecognitionError, SpeechRecognizer, SpeechSynthesizer,
    Transcriber, TranscriptUpdate,
};
use friday_gateway::{
    ConversationStore, Error, MemoryStorage, Persona, Result, Session, SpeechOutputChooser,
    StatusIndicator, SynthesisResult,
};

/// Completion gateway that answers every request the same way
pub struct MockCompletion {
    reply: Option<String>,
    delay: Duration,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    /// Always reply with `text`
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with a 500 from the gateway
    pub fn failing() -> Self {
        Self {
            reply: None,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Hold every response for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionGateway for MockCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone().ok_or_else(|| Error::Gateway {
            status: 500,
            body: "upstream exploded".to_string(),
        })
    }
}

/// What the mock speech gateway does
#[derive(Clone)]
pub enum SpeechBehavior {
    Audio(Vec<u8>),
    NoAudio,
    Fail,
}

/// Speech gateway with a fixed behavior
pub struct MockSpeechGateway {
    behavior: SpeechBehavior,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockSpeechGateway {
    pub fn new(behavior: SpeechBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechGateway for MockSpeechGateway {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<SynthesisResult> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice.map(ToString::to_string)));
        match &self.behavior {
            SpeechBehavior::Audio(audio) => Ok(SynthesisResult::Audio(audio.clone())),
            SpeechBehavior::NoAudio => Ok(SynthesisResult::NoAudio),
            SpeechBehavior::Fail => Err(Error::Gateway {
                status: 502,
                body: "bad gateway".to_string(),
            }),
        }
    }
}

/// On-device synthesizer that records utterances
pub struct MockSynthesizer {
    voices: Vec<LocalVoice>,
    spoken: Mutex<Vec<(String, Option<String>)>>,
    cancels: AtomicUsize,
}

impl MockSynthesizer {
    pub fn with_voices(names: &[&str]) -> Self {
        Self {
            voices: names.iter().map(|n| LocalVoice::named(*n)).collect(),
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        }
    }

    /// `(text, voice name)` for every utterance, in order
    pub fn spoken(&self) -> Vec<(String, Option<String>)> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn voices(&self) -> Vec<LocalVoice> {
        self.voices.clone()
    }

    async fn speak(&self, text: &str, voice: Option<&LocalVoice>) -> Result<()> {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), voice.map(|v| v.name.clone())));
        Ok(())
    }

    async fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Audio sink that records clips
#[derive(Default)]
pub struct MockSink {
    fail: bool,
    played: Mutex<Vec<Vec<u8>>>,
}

impl MockSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            played: Mutex::new(Vec::new()),
        }
    }

    pub fn played(&self) -> Vec<Vec<u8>> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioSink for MockSink {
    async fn play(&self, mp3: Vec<u8>) -> Result<()> {
        self.played.lock().unwrap().push(mp3);
        if self.fail {
            return Err(Error::Audio("speaker unplugged".to_string()));
        }
        Ok(())
    }
}

/// Recognizer that emits scripted updates, then waits to be stopped
pub struct MockRecognizer {
    updates: Vec<TranscriptUpdate>,
    result: std::result::Result<String, RecognitionError>,
    sessions: AtomicUsize,
}

impl MockRecognizer {
    pub fn hearing(segments: &[&str]) -> Self {
        let updates = (1..=segments.len())
            .map(|n| TranscriptUpdate {
                segments: segments[..n].iter().map(ToString::to_string).collect(),
            })
            .collect();
        Self {
            updates,
            result: Ok(segments.concat().trim().to_string()),
            sessions: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: RecognitionError) -> Self {
        Self {
            updates: Vec::new(),
            result: Err(error),
            sessions: AtomicUsize::new(0),
        }
    }

    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn recognize(
        &self,
        stop: oneshot::Receiver<()>,
        updates: mpsc::UnboundedSender<TranscriptUpdate>,
    ) -> std::result::Result<String, RecognitionError> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        for update in &self.updates {
            let _ = updates.send(update.clone());
        }
        let _ = stop.await;
        self.result.clone()
    }
}

/// Upstream chat provider with a fixed answer
pub struct FakeChat {
    answer: Result<String>,
    seen: Mutex<Vec<Vec<Turn>>>,
}

impl FakeChat {
    pub fn answering(text: &str) -> Self {
        Self {
            answer: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            answer: Err(Error::Gateway {
                status,
                body: body.to_string(),
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<Vec<Turn>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for FakeChat {
    async fn complete(&self, messages: &[Turn]) -> Result<String> {
        self.seen.lock().unwrap().push(messages.to_vec());
        match &self.answer {
            Ok(text) => Ok(text.clone()),
            Err(Error::Gateway { status, body }) => Err(Error::Gateway {
                status: *status,
                body: body.clone(),
            }),
            Err(e) => Err(Error::Completion(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Upstream TTS provider that returns fixed bytes or fails
pub struct FakeSpeech {
    audio: Option<Vec<u8>>,
    voices: Mutex<Vec<&'static str>>,
}

impl FakeSpeech {
    pub fn returning(audio: &[u8]) -> Self {
        Self {
            audio: Some(audio.to_vec()),
            voices: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            audio: None,
            voices: Mutex::new(Vec::new()),
        }
    }

    /// Provider voice ids requested so far
    pub fn voices(&self) -> Vec<&'static str> {
        self.voices.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechProvider for FakeSpeech {
    async fn synthesize(&self, _text: &str, voice: &CatalogVoice) -> Result<Vec<u8>> {
        self.voices.lock().unwrap().push(voice.elevenlabs_id);
        self.audio
            .clone()
            .ok_or_else(|| Error::Tts("quota exceeded".to_string()))
    }
}

/// Transcriber with a fixed answer
pub struct FakeTranscriber(pub String);

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _wav: Vec<u8>) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// A session wired to mocks, with handles to inspect them
pub struct Harness {
    pub session: Session,
    pub storage: MemoryStorage,
    pub completion: Arc<MockCompletion>,
    pub speech_gateway: Arc<MockSpeechGateway>,
    pub synthesizer: Arc<MockSynthesizer>,
    pub sink: Arc<MockSink>,
    pub status: StatusIndicator,
}

/// Speech preferences with everything on
pub fn cloud_preferences() -> SpeechPreferences {
    SpeechPreferences {
        speak: true,
        cloud_tts: true,
        voice: Some("rachel".to_string()),
    }
}

/// Build a session over `storage` using the given mocks
pub fn harness_with(
    storage: MemoryStorage,
    completion: MockCompletion,
    speech: SpeechBehavior,
    preferences: SpeechPreferences,
) -> Harness {
    let completion = Arc::new(completion);
    let speech_gateway = Arc::new(MockSpeechGateway::new(speech));
    let synthesizer = Arc::new(MockSynthesizer::with_voices(&["Alex", "Samantha"]));
    let sink = Arc::new(MockSink::default());
    let status = StatusIndicator::new();

    let chooser = Arc::new(SpeechOutputChooser::new(
        speech_gateway.clone(),
        Some(synthesizer.clone() as Arc<dyn SpeechSynthesizer>),
        sink.clone(),
        preferences,
    ));
    let store = ConversationStore::load(Arc::new(storage.clone()));
    let session = Session::new(
        Persona::friday(),
        store,
        completion.clone(),
        chooser,
        status.clone(),
    );

    Harness {
        session,
        storage,
        completion,
        speech_gateway,
        synthesizer,
        sink,
        status,
    }
}

/// Fresh storage, cloud speech returning a short clip
pub fn harness(completion: MockCompletion) -> Harness {
    harness_with(
        MemoryStorage::new(),
        completion,
        SpeechBehavior::Audio(vec![0xFF, 0xFB, 0x90]),
        cloud_preferences(),
    )
}

/// Turns currently persisted under the conversation key
pub fn persisted_turns(storage: &MemoryStorage) -> Vec<Turn> {
    use friday_gateway::StateStorage;

    storage
        .get(friday_gateway::conversation::CONVERSATION_KEY)
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
        .unwrap_or_default()
}
