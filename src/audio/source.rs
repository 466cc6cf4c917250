//! Audio sources: fetching bytes and decoding them into an in-memory buffer.

use rodio::{Decoder, Source};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::error::AudioError;
use super::synthesis::render_default_track;
use crate::params::audio_constants::{FETCH_TIMEOUT_SECS, MAX_FETCH_BYTES};

/// Where audio comes from
///
/// Picker selections, dropped files and the default track all converge here
/// before reaching the engine.
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// `http(s)://` URL, or any other string treated as a local path
    Url(String),

    /// Local file chosen by the user
    File(PathBuf),

    /// Bytes already in memory, with an optional declared MIME type
    Blob {
        bytes: Vec<u8>,
        mime_type: Option<String>,
    },

    /// Built-in procedural track
    Default,
}

impl AudioSource {
    /// Source for a dropped file, rejected up front unless it looks like audio
    pub fn from_dropped_file(path: impl Into<PathBuf>) -> Result<Self, AudioError> {
        let path = path.into();
        let mime_type = mime_for_path(&path).unwrap_or("application/octet-stream");
        ensure_audio_type(&path.display().to_string(), mime_type)?;
        Ok(AudioSource::File(path))
    }

    /// Human-readable label for logs and errors
    pub fn label(&self) -> String {
        match self {
            AudioSource::Url(url) => url.clone(),
            AudioSource::File(path) => path.display().to_string(),
            AudioSource::Blob { bytes, mime_type } => match mime_type {
                Some(mime) => format!("<{} bytes, {}>", bytes.len(), mime),
                None => format!("<{} bytes>", bytes.len()),
            },
            AudioSource::Default => "<default track>".to_string(),
        }
    }
}

/// Fully decoded audio, interleaved `f32` samples
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Arc<[f32]>,
    pub channels: u16,
    pub sample_rate: u32,
    pub label: String,
}

impl DecodedAudio {
    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }
}

/// Retrieve and decode a source (blocking)
pub fn load(source: AudioSource) -> Result<DecodedAudio, AudioError> {
    let label = source.label();
    match source {
        AudioSource::Default => render_default_track(),
        AudioSource::Blob { bytes, mime_type } => {
            if let Some(mime) = mime_type.as_deref() {
                ensure_audio_type(&label, mime)?;
            }
            decode_bytes(bytes, &label)
        }
        AudioSource::Url(url) => {
            let bytes = if is_remote(&url) {
                fetch_url(&url)?
            } else {
                read_file(Path::new(&url))?
            };
            decode_bytes(bytes, &label)
        }
        AudioSource::File(path) => {
            let bytes = read_file(&path)?;
            decode_bytes(bytes, &label)
        }
    }
}

/// Decode a complete in-memory file (wav, mp3, flac, ogg)
pub fn decode_bytes(bytes: Vec<u8>, label: &str) -> Result<DecodedAudio, AudioError> {
    let decode_error = |reason: String| AudioError::Decode {
        source_label: label.to_string(),
        reason,
    };

    let decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| decode_error(e.to_string()))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();

    if channels == 0 || sample_rate == 0 {
        return Err(decode_error(format!(
            "bad stream layout ({} channels @ {}Hz)",
            channels, sample_rate
        )));
    }

    let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();
    if samples.len() < channels as usize {
        return Err(decode_error("stream contains no samples".to_string()));
    }

    Ok(DecodedAudio {
        samples: samples.into(),
        channels,
        sample_rate,
        label: label.to_string(),
    })
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn fetch_url(url: &str) -> Result<Vec<u8>, AudioError> {
    let fetch_error = |reason: String| AudioError::Fetch {
        source_label: url.to_string(),
        reason,
    };

    let response = ureq::get(url)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .call()
        .map_err(|e| fetch_error(e.to_string()))?;

    if let Some(mime) = response.header("Content-Type") {
        log::debug!("{} served as {}", url, mime);
    }

    read_capped(response.into_reader(), MAX_FETCH_BYTES, url)
}

/// Read a whole payload; anything larger than `limit` bytes is an error, never truncated
fn read_capped(reader: impl Read, limit: u64, label: &str) -> Result<Vec<u8>, AudioError> {
    let fetch_error = |reason: String| AudioError::Fetch {
        source_label: label.to_string(),
        reason,
    };

    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| fetch_error(e.to_string()))?;

    if bytes.len() as u64 > limit {
        return Err(fetch_error(format!("payload exceeds {} byte limit", limit)));
    }
    Ok(bytes)
}

fn read_file(path: &Path) -> Result<Vec<u8>, AudioError> {
    std::fs::read(path).map_err(|e| AudioError::Fetch {
        source_label: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn ensure_audio_type(label: &str, mime_type: &str) -> Result<(), AudioError> {
    if mime_type.starts_with("audio/") {
        Ok(())
    } else {
        Err(AudioError::UnsupportedInput {
            source_label: label.to_string(),
            mime_type: mime_type.to_string(),
        })
    }
}

/// MIME type guessed from a file extension
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "wav" | "wave" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" | "aac" => "audio/aac",
        "opus" => "audio/opus",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => return None,
    };
    Some(mime)
}
