//! Audio playback to speakers

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Something that can play synthesized MP3 audio
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play the clip to completion
    ///
    /// # Errors
    ///
    /// Returns error if the audio cannot be decoded or played
    async fn play(&self, mp3: Vec<u8>) -> Result<()>;
}

/// Decoded PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate of the decoded stream
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Playback length
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let millis = self.samples.len() as u64 * 1000 / u64::from(self.sample_rate);
        Duration::from_millis(millis)
    }
}

/// Plays audio on the default output device
#[derive(Debug, Default, Clone, Copy)]
pub struct SpeakerSink;

impl SpeakerSink {
    /// Create a speaker sink
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether the host exposes a default output device
    #[must_use]
    pub fn available() -> bool {
        cpal::default_host().default_output_device().is_some()
    }
}

#[async_trait]
impl AudioSink for SpeakerSink {
    async fn play(&self, mp3: Vec<u8>) -> Result<()> {
        tokio::task::spawn_blocking(move || {
            let audio = decode_mp3(&mp3)?;
            play_blocking(&audio)
        })
        .await
        .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }
}

/// Play decoded audio, returning once the clip has finished
fn play_blocking(audio: &DecodedAudio) -> Result<()> {
    if audio.samples.is_empty() {
        return Ok(());
    }

    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

    let rate = SampleRate(audio.sample_rate);
    let config: StreamConfig = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .filter(|c| c.min_sample_rate() <= rate && c.max_sample_rate() >= rate)
        .min_by_key(cpal::SupportedStreamConfigRange::channels)
        .ok_or_else(|| {
            Error::Audio(format!("output device cannot play {} Hz", audio.sample_rate))
        })?
        .with_sample_rate(rate)
        .config();
    let channels = usize::from(config.channels.max(1));

    tracing::debug!(
        device = device.name().unwrap_or_default(),
        sample_rate = audio.sample_rate,
        channels,
        "audio playback starting"
    );

    let samples: Arc<[f32]> = audio.samples.clone().into();
    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let stream = {
        let samples = Arc::clone(&samples);
        let position = Arc::clone(&position);
        let finished = Arc::clone(&finished);
        device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let pos = position.load(Ordering::Relaxed);
                        let sample = samples.get(pos).copied().unwrap_or_else(|| {
                            finished.store(true, Ordering::Relaxed);
                            0.0
                        });
                        frame.fill(sample);
                        if pos < samples.len() {
                            position.store(pos + 1, Ordering::Relaxed);
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?
    };

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let deadline = Instant::now() + audio.duration() + Duration::from_millis(500);
    while !finished.load(Ordering::Relaxed) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    // Let the device drain its last buffer
    std::thread::sleep(Duration::from_millis(100));

    drop(stream);
    tracing::debug!(samples = samples.len(), "playback complete");
    Ok(())
}

/// Decode MP3 bytes to mono f32 samples
///
/// # Errors
///
/// Returns error if the data is not decodable MP3
pub fn decode_mp3(mp3: &[u8]) -> Result<DecodedAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3));
    let mut samples = Vec::new();
    let mut sample_rate = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = u32::try_from(frame.sample_rate).unwrap_or_default();
                }
                let channels = frame.channels.max(1);
                #[allow(clippy::cast_precision_loss)]
                let scale = 1.0 / (32768.0 * channels as f32);
                samples.extend(frame.data.chunks(channels).map(|chunk| {
                    chunk.iter().map(|&s| f32::from(s)).sum::<f32>() * scale
                }));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}
