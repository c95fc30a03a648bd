//! On-device speech synthesis
//!
//! The platform speech command (`say` on macOS, `espeak-ng` elsewhere) runs
//! as a child process. Only one utterance plays at a time; starting a new
//! one kills the previous child.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::{Error, Result};

/// A voice installed on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVoice {
    /// Voice name as the engine knows it
    pub name: String,
    /// Language or locale tag, when the engine reports one
    pub language: Option<String>,
}

impl LocalVoice {
    /// Voice with a name only
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: None,
        }
    }
}

/// On-device text-to-speech
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices available right now, in engine order
    async fn voices(&self) -> Vec<LocalVoice>;

    /// Start speaking `text`, cancelling anything already being spoken
    ///
    /// Returns once the utterance has started. `None` uses the engine default.
    ///
    /// # Errors
    ///
    /// Returns error if the engine cannot be started
    async fn speak(&self, text: &str, voice: Option<&LocalVoice>) -> Result<()>;

    /// Stop the current utterance, if any
    async fn cancel(&self);

    /// Wait for the current utterance to finish
    async fn wait(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Engine {
    Say,
    Espeak,
}

/// Speaks through the platform speech command
pub struct CommandSynthesizer {
    engine: Engine,
    program: PathBuf,
    current: Mutex<Option<Child>>,
}

impl CommandSynthesizer {
    /// Find a speech command on `PATH`
    ///
    /// # Errors
    ///
    /// Returns error if neither `say` nor `espeak-ng`/`espeak` is installed
    pub fn detect() -> Result<Self> {
        let found = if cfg!(target_os = "macos") {
            which::which("say").ok().map(|p| (Engine::Say, p))
        } else {
            None
        };
        let (engine, program) = found
            .or_else(|| which::which("espeak-ng").ok().map(|p| (Engine::Espeak, p)))
            .or_else(|| which::which("espeak").ok().map(|p| (Engine::Espeak, p)))
            .ok_or_else(|| Error::Synthesis("no say or espeak command found".to_string()))?;

        tracing::debug!(program = %program.display(), "local speech engine found");
        Ok(Self::with_engine(engine, program))
    }

    fn with_engine(engine: Engine, program: PathBuf) -> Self {
        Self {
            engine,
            program,
            current: Mutex::new(None),
        }
    }

    async fn list_voices(&self) -> Result<Vec<LocalVoice>> {
        let flag: &[&str] = match self.engine {
            Engine::Say => &["-v", "?"],
            Engine::Espeak => &["--voices"],
        };
        let output = Command::new(&self.program).args(flag).output().await?;
        if !output.status.success() {
            return Err(Error::Synthesis(format!(
                "voice listing exited with {}",
                output.status
            )));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(match self.engine {
            Engine::Say => parse_say_voices(&listing),
            Engine::Espeak => parse_espeak_voices(&listing),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn voices(&self) -> Vec<LocalVoice> {
        self.list_voices().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to list local voices");
            Vec::new()
        })
    }

    async fn speak(&self, text: &str, voice: Option<&LocalVoice>) -> Result<()> {
        let mut current = self.current.lock().await;
        if let Some(mut child) = current.take() {
            let _ = child.kill().await;
        }

        let mut command = Command::new(&self.program);
        if let Some(voice) = voice {
            command.arg("-v").arg(&voice.name);
        }
        if self.engine == Engine::Espeak {
            command.arg("--stdin");
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| Error::Synthesis(format!("failed to start speech command: {e}")))?;

        // Text goes through stdin so it is never parsed as a flag
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }
        tracing::debug!(voice = voice.map(|v| v.name.as_str()), "local utterance started");
        *current = Some(child);
        Ok(())
    }

    async fn cancel(&self) {
        if let Some(mut child) = self.current.lock().await.take() {
            let _ = child.kill().await;
            tracing::debug!("local utterance cancelled");
        }
    }

    async fn wait(&self) {
        let child = self.current.lock().await.take();
        if let Some(mut child) = child {
            let _ = child.wait().await;
        }
    }
}

/// Parse `say -v ?` output: `Name    en_US    # sample sentence`
fn parse_say_voices(listing: &str) -> Vec<LocalVoice> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, locale) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            (!name.is_empty()).then(|| LocalVoice {
                name: name.to_string(),
                language: Some(locale.to_string()),
            })
        })
        .collect()
}

/// Parse `espeak --voices` output (header row, then
/// `Pty Language Age/Gender VoiceName File Other`)
fn parse_espeak_voices(listing: &str) -> Vec<LocalVoice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let language = fields.nth(1)?;
            let name = fields.nth(1)?;
            Some(LocalVoice {
                name: name.to_string(),
                language: Some(language.to_string()),
            })
        })
        .collect()
}
