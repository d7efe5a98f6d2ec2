//! WAV loader
//!
//! Resolves layer sources as WAV file paths, decodes them off the async
//! runtime, and caches decoded buffers so layers sharing a file decode it
//! once. Each load returns a fresh [`BufferVoice`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use hound::{SampleFormat, WavReader};
use parking_lot::Mutex;
use tracing::debug;

use super::voice::{BufferVoice, DecodedAudio};
use super::{AudioLoader, AudioTarget};
use crate::error::{Result, SequencerError};

/// Loader for WAV files with a decoded-buffer cache
#[derive(Debug, Default)]
pub struct WavLoader {
    base_dir: Option<PathBuf>,
    cache: Mutex<HashMap<PathBuf, Arc<DecodedAudio>>>,
}

impl WavLoader {
    /// Loader resolving relative sources against the working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader resolving relative sources against `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of decoded files currently cached
    pub fn cached_sources(&self) -> usize {
        self.cache.lock().len()
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl AudioLoader for WavLoader {
    async fn load(&self, source: &str) -> Result<Box<dyn AudioTarget>> {
        let path = self.resolve(source);

        let cached = self.cache.lock().get(&path).cloned();
        if let Some(audio) = cached {
            debug!(path = %path.display(), "using cached audio");
            return Ok(Box::new(BufferVoice::new(audio)));
        }

        let decode_path = path.clone();
        let audio = tokio::task::spawn_blocking(move || decode_wav(&decode_path))
            .await
            .map_err(|e| SequencerError::LoadFailed {
                source_ref: source.to_string(),
                reason: format!("decode task failed: {}", e),
            })??;
        debug!(path = %path.display(), seconds = audio.duration_secs(), "decoded audio");

        let audio = Arc::new(audio);
        self.cache.lock().insert(path, Arc::clone(&audio));

        Ok(Box::new(BufferVoice::new(audio)))
    }
}

/// Decode a WAV file into interleaved `f32` samples
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file
/// * `UnsupportedFormat` - If the audio has more than 2 channels or an
///   unsupported bit depth
/// * `EmptyAudio` - If the file holds no samples
pub fn decode_wav(path: &Path) -> Result<DecodedAudio> {
    if !path.exists() {
        return Err(SequencerError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(|e| SequencerError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    if spec.channels == 0 || spec.channels > 2 {
        return Err(SequencerError::UnsupportedFormat {
            format: format!(
                "{}-channel audio (only mono/stereo supported)",
                spec.channels
            ),
        });
    }

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if samples.is_empty() {
        return Err(SequencerError::EmptyAudio);
    }

    Ok(DecodedAudio {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |bits: &str, e: hound::Error| SequencerError::InvalidAudio {
        reason: format!("Failed to read {} samples: {}", bits, e),
        source: Some(Box::new(e)),
    };

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| invalid("float", e)),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| invalid("8-bit", e)),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| invalid("16-bit", e)),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| invalid("24-bit", e)),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| invalid("32-bit int", e)),
        (SampleFormat::Int, bits) => Err(SequencerError::UnsupportedFormat {
            format: format!("{}-bit integer audio", bits),
        }),
    }
}
