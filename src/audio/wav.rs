//! WAV signal files handed to the aligner.

use crate::defaults::{AUDIO_SUFFIX, TEMP_PREFIX};
use crate::error::{MausError, Result};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Header facts about a WAV recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Samples per channel.
    pub frames: u32,
}

impl WavInfo {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Read the WAV header from any reader.
pub fn probe_reader<R: Read>(reader: R) -> Result<WavInfo> {
    let wav_reader = hound::WavReader::new(reader).map_err(|e| MausError::AudioInvalid {
        message: format!("Failed to parse WAV file: {}", e),
    })?;

    let spec = wav_reader.spec();
    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        frames: wav_reader.duration(),
    })
}

/// Read the WAV header of the file at `path`.
pub fn probe_wav(path: &Path) -> Result<WavInfo> {
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MausError::AudioNotFound {
                path: path.display().to_string(),
            }
        } else {
            MausError::Io(e)
        }
    })?;
    probe_reader(std::io::BufReader::new(file))
}

/// Write `bytes` to a fresh `.wav` file in `dir`, removed when dropped.
pub fn write_temp_wav(bytes: &[u8], dir: &Path) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(AUDIO_SUFFIX)
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}
