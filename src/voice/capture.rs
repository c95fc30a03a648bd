//! Audio capture from microphone

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Preferred sample rate for speech (16kHz)
pub const SAMPLE_RATE: u32 = 16000;

/// Whether the host exposes a default input device
#[must_use]
pub fn input_available() -> bool {
    cpal::default_host().default_input_device().is_some()
}

/// A microphone recording in progress
///
/// The cpal stream lives on a dedicated thread; samples are downmixed to
/// mono and accumulated in a shared buffer until [`Recording::finish`].
pub struct Recording {
    buffer: Arc<Mutex<Vec<f32>>>,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    sample_rate: u32,
}

impl Recording {
    /// Open the default input device and start recording
    ///
    /// Blocks until the device is open.
    ///
    /// # Errors
    ///
    /// Returns error if no input device exists or the stream cannot start
    pub fn start() -> Result<Self> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = {
            let buffer = Arc::clone(&buffer);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("friday-mic".to_string())
                .spawn(move || {
                    let stream = match open_stream(buffer) {
                        Ok((stream, rate)) => {
                            let _ = ready_tx.send(Ok(rate));
                            stream
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };

                    while !stop.load(Ordering::Relaxed) {
                        thread::sleep(Duration::from_millis(20));
                    }
                    drop(stream);
                    tracing::debug!("audio capture stopped");
                })?
        };

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| Error::Audio("capture thread exited".to_string()))??;

        Ok(Self {
            buffer,
            stop,
            worker: Some(worker),
            sample_rate,
        })
    }

    /// Sample rate of the recorded audio
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Copy of everything recorded so far
    #[must_use]
    pub fn snapshot(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Stop recording and return all samples
    #[must_use]
    pub fn finish(mut self) -> Vec<f32> {
        self.halt();
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    fn halt(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Recording {
    fn drop(&mut self) {
        self.halt();
    }
}

fn open_stream(buffer: Arc<Mutex<Vec<f32>>>) -> Result<(Stream, u32)> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| Error::Audio("no input device available".to_string()))?;
    let config = input_config(&device)?;
    let channels = usize::from(config.channels.max(1));
    let sample_rate = config.sample_rate.0;

    tracing::debug!(
        device = device.name().unwrap_or_default(),
        sample_rate,
        channels,
        "audio capture initialized"
    );

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend(downmix(data, channels));
                }
            },
            |err| {
                tracing::error!(error = %err, "audio capture error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;
    Ok((stream, sample_rate))
}

/// Mono 16kHz if the device offers it, the device default otherwise
fn input_config(device: &Device) -> Result<StreamConfig> {
    let speech = device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
        });

    if let Some(range) = speech {
        return Ok(range.with_sample_rate(SampleRate(SAMPLE_RATE)).config());
    }

    device
        .default_input_config()
        .map(|c| c.config())
        .map_err(|e| Error::Audio(e.to_string()))
}

fn downmix(data: &[f32], channels: usize) -> impl Iterator<Item = f32> + '_ {
    #[allow(clippy::cast_precision_loss)]
    let scale = 1.0 / channels as f32;
    data.chunks(channels)
        .map(move |frame| frame.iter().sum::<f32>() * scale)
}

/// Encode mono f32 samples as 16-bit PCM WAV
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let pcm = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(pcm)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
