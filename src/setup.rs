//! Interactive first-run setup wizard (`friday setup`)

use dialoguer::{Confirm, Input, Select};

use crate::config::file;
use crate::voice::{TtsProvider, catalog};

/// Run the interactive setup wizard
///
/// Existing values are offered as defaults; a blank key keeps the old one.
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("FRIDAY Setup\n");

    let mut config = file::load_config_file();
    if let Some(path) = file::config_file_path().filter(|p| p.exists()) {
        println!("Existing config found at {}\n", path.display());
    }

    // 1. Chat completions
    config.api_keys.groq = prompt_key("Groq API key (GROQ_API_KEY)", config.api_keys.groq.take())?;

    // 2. Cloud speech
    let providers = [TtsProvider::ElevenLabs, TtsProvider::OpenAi];
    let current = config
        .speech
        .provider
        .as_deref()
        .and_then(|p| p.parse::<TtsProvider>().ok())
        .unwrap_or(TtsProvider::ElevenLabs);
    let provider_idx = Select::new()
        .with_prompt("Cloud voice provider")
        .items(&providers)
        .default(providers.iter().position(|p| *p == current).unwrap_or(0))
        .interact()?;
    let provider = providers[provider_idx];
    config.speech.provider = Some(provider.to_string());

    match provider {
        TtsProvider::ElevenLabs => {
            config.api_keys.elevenlabs = prompt_key(
                "ElevenLabs API key (ELEVENLABS_API_KEY)",
                config.api_keys.elevenlabs.take(),
            )?;
        }
        TtsProvider::OpenAi => {
            config.api_keys.openai =
                prompt_key("OpenAI API key (OPENAI_API_KEY)", config.api_keys.openai.take())?;
        }
    }

    // 3. Voice
    let voices: Vec<String> = catalog::voices()
        .iter()
        .map(|v| format!("{} ({})", v.name, v.description))
        .collect();
    let current_voice = catalog::resolve(config.client.voice.as_deref());
    let voice_idx = Select::new()
        .with_prompt("Voice")
        .items(&voices)
        .default(
            catalog::voices()
                .iter()
                .position(|v| v == current_voice)
                .unwrap_or(0),
        )
        .interact()?;
    config.client.voice = Some(catalog::voices()[voice_idx].name.to_string());

    // 4. Speech toggles
    let speak = Confirm::new()
        .with_prompt("Speak replies aloud?")
        .default(config.client.speak.unwrap_or(true))
        .interact()?;
    config.client.speak = Some(speak);

    if speak {
        let cloud = Confirm::new()
            .with_prompt("Use cloud voices (falls back to on-device speech)?")
            .default(config.client.cloud_tts.unwrap_or(true))
            .interact()?;
        config.client.cloud_tts = Some(cloud);
    }

    // 5. Microphone transcription
    if config.api_keys.openai.is_none() {
        let want_stt = Confirm::new()
            .with_prompt("Hold-to-talk needs an OpenAI key for Whisper. Add one?")
            .default(false)
            .interact()?;
        if want_stt {
            config.api_keys.openai =
                prompt_key("OpenAI API key (OPENAI_API_KEY)", None)?;
        }
    }

    let path = file::write_config_file(&config)?;
    println!("\nConfig written to {}", path.display());
    println!("\nSetup complete! Run `friday serve` and then `friday chat`.");

    Ok(())
}

/// Ask for a key, keeping `existing` when the answer is blank
fn prompt_key(label: &str, existing: Option<String>) -> anyhow::Result<Option<String>> {
    let prompt = match existing.as_deref().map(mask) {
        Some(masked) => format!("{label} (current: {masked}, leave blank to keep)"),
        None => label.to_string(),
    };

    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    Ok(if input.is_empty() {
        existing
    } else {
        Some(input.to_string())
    })
}

/// Show only the ends of a secret
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_keys_show_ends() {
        assert_eq!(mask("gsk_abcdefghijkl"), "gsk_...ijkl");
    }

    #[test]
    fn test_short_keys_fully_masked() {
        assert_eq!(mask("abc"), "****");
        assert_eq!(mask("12345678"), "****");
    }
}
