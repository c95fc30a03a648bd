//! Fixed catalog of cloud voices
//!
//! Human-readable names map to provider voice identifiers. Lookup ignores
//! case; anything unknown resolves to [`DEFAULT_VOICE`].

/// Name of the voice used when none (or an unknown one) is requested
pub const DEFAULT_VOICE: &str = "rachel";

/// A cloud voice with its identifier for each supported provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogVoice {
    /// Catalog name (lowercase)
    pub name: &'static str,
    /// `ElevenLabs` voice id
    pub elevenlabs_id: &'static str,
    /// Closest `OpenAI` TTS voice
    pub openai_voice: &'static str,
    /// Short description for listings
    pub description: &'static str,
}

const VOICES: [CatalogVoice; 4] = [
    CatalogVoice {
        name: "rachel",
        elevenlabs_id: "21m00Tcm4TlvDq8ikWAM",
        openai_voice: "nova",
        description: "female, friendly",
    },
    CatalogVoice {
        name: "bella",
        elevenlabs_id: "EXAVITQu4vr4xnSDxMaL",
        openai_voice: "shimmer",
        description: "female, warm",
    },
    CatalogVoice {
        name: "antoni",
        elevenlabs_id: "ErXwobaYiN019PkySvjV",
        openai_voice: "onyx",
        description: "male, deep",
    },
    CatalogVoice {
        name: "dom",
        elevenlabs_id: "AZnzlk1XvdvUeBnXmlld",
        openai_voice: "echo",
        description: "male, casual",
    },
];

/// All catalog voices
#[must_use]
pub const fn voices() -> &'static [CatalogVoice] {
    &VOICES
}

/// Find a voice by exact catalog name, ignoring case
#[must_use]
pub fn find(name: &str) -> Option<&'static CatalogVoice> {
    VOICES.iter().find(|v| v.name.eq_ignore_ascii_case(name.trim()))
}

/// Resolve an optional voice name, falling back to the default voice
#[must_use]
pub fn resolve(name: Option<&str>) -> &'static CatalogVoice {
    name.and_then(find).unwrap_or(&VOICES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let upper = resolve(Some("RACHEL"));
        let lower = resolve(Some("rachel"));
        let title = resolve(Some("Rachel"));

        assert_eq!(upper.elevenlabs_id, "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(upper, lower);
        assert_eq!(lower, title);
    }

    #[test]
    fn test_unknown_name_resolves_to_default() {
        assert_eq!(resolve(Some("Samantha")).name, DEFAULT_VOICE);
        assert_eq!(resolve(Some("")).name, DEFAULT_VOICE);
        assert_eq!(resolve(None).name, DEFAULT_VOICE);
    }

    #[test]
    fn test_every_voice_resolves_to_itself() {
        for voice in voices() {
            assert_eq!(resolve(Some(voice.name)), voice);
        }
    }

    #[test]
    fn test_find_rejects_unknown() {
        assert!(find("Alex").is_none());
        assert_eq!(find(" Dom ").map(|v| v.elevenlabs_id), Some("AZnzlk1XvdvUeBnXmlld"));
    }
}
