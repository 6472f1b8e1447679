//! Single-recording and batch annotation.
//!
//! A batch is a group of recordings that share one transcript. The
//! transcript is compiled once; each recording's audio is materialized to a
//! private temporary file for the duration of its own alignment.

use crate::aligner::{AlignOptions, Aligner, CommandExecutor, SystemCommandExecutor};
use crate::audio::wav::write_temp_wav;
use crate::bpf;
use crate::config::{BatchConfig, Config, LexiconConfig};
use crate::error::{MausError, Result};
use crate::lexicon::Lexicon;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a batch does after one recording fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Record the failure and carry on with the remaining recordings.
    #[default]
    #[serde(rename = "continue")]
    ContinueOnError,
    /// Record the failure and skip every recording after it.
    #[serde(rename = "abort")]
    AbortOnFirstError,
}

/// A recording whose audio can be fetched on demand.
pub trait Recording {
    /// Identifier used in logs and results.
    fn id(&self) -> String;

    /// Raw audio bytes (a WAV file).
    fn audio(&self) -> Result<Vec<u8>>;
}

/// Audio already held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryRecording {
    pub id: String,
    pub bytes: Vec<u8>,
}

impl InMemoryRecording {
    pub fn new(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }
}

impl Recording for InMemoryRecording {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn audio(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Audio read from a file when the batch reaches it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecording {
    pub path: PathBuf,
}

impl FileRecording {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Recording for FileRecording {
    fn id(&self) -> String {
        self.path.display().to_string()
    }

    fn audio(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MausError::AudioNotFound {
                    path: self.path.display().to_string(),
                }
            } else {
                MausError::Io(e)
            }
        })
    }
}

/// Result of annotating one recording of a batch.
#[derive(Debug)]
pub struct RecordingOutcome {
    pub id: String,
    /// Aligner output, byte for byte.
    pub result: Result<Vec<u8>>,
}

impl RecordingOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Lexicon lookup, BPF compilation and alignment, bundled.
pub struct Annotator<E: CommandExecutor> {
    aligner: Aligner<E>,
    lexicon: LexiconConfig,
    batch: BatchConfig,
}

impl<E: CommandExecutor> Annotator<E> {
    pub fn new(config: &Config, executor: E) -> Self {
        Self {
            aligner: Aligner::new(config, executor),
            lexicon: config.lexicon.clone(),
            batch: config.batch.clone(),
        }
    }

    /// Override the configured batch failure policy.
    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.batch.policy = policy;
        self
    }

    pub fn policy(&self) -> BatchPolicy {
        self.batch.policy
    }

    pub fn aligner(&self) -> &Aligner<E> {
        &self.aligner
    }

    /// Load the lexicon from `dir`, or from the configured default directory.
    pub fn load_lexicon(&self, dir: Option<&Path>) -> Result<Lexicon> {
        let dir = dir
            .or(self.lexicon.dir.as_deref())
            .ok_or_else(|| MausError::ConfigInvalidValue {
                key: "lexicon.dir".to_string(),
                message: "no lexicon directory given and none configured".to_string(),
            })?;
        Lexicon::load(dir, self.lexicon.merge)
    }

    /// Annotate one WAV file.
    ///
    /// Without a `lexicon`, the default lexicon directory is loaded fresh.
    pub fn annotate_wav(
        &self,
        audio: &Path,
        transcript: &str,
        lexicon: Option<&Lexicon>,
        options: &AlignOptions,
    ) -> Result<Vec<u8>> {
        let loaded;
        let lexicon = match lexicon {
            Some(lexicon) => lexicon,
            None => {
                loaded = self.load_lexicon(None)?;
                &loaded
            }
        };

        let bpf = bpf::compile(transcript, lexicon)?;
        self.aligner.align(audio, &bpf, options)
    }

    /// Annotate every recording against the shared `transcript`.
    ///
    /// A transcript the lexicon cannot cover fails the whole batch before
    /// any aligner runs. Per-recording failures are handled according to
    /// the batch policy; outcomes keep the order recordings were supplied in.
    pub fn annotate_batch<I, R>(
        &self,
        recordings: I,
        transcript: &str,
        lexicon: &Lexicon,
        options: &AlignOptions,
    ) -> Result<Vec<RecordingOutcome>>
    where
        I: IntoIterator<Item = R>,
        R: Recording,
    {
        let bpf = bpf::compile(transcript, lexicon)?;
        let temp_dir = self
            .batch
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        let mut outcomes = Vec::new();
        for recording in recordings {
            let id = recording.id();
            tracing::info!(recording = %id, "annotating");

            let result = self.annotate_recording(&recording, &bpf, &temp_dir, options);
            if let Err(e) = &result {
                tracing::warn!(recording = %id, "annotation failed: {}", e);
            }
            let failed = result.is_err();
            outcomes.push(RecordingOutcome { id, result });

            if failed && self.batch.policy == BatchPolicy::AbortOnFirstError {
                tracing::warn!("aborting batch after first failure");
                break;
            }
        }

        Ok(outcomes)
    }

    fn annotate_recording<R: Recording>(
        &self,
        recording: &R,
        bpf: &str,
        temp_dir: &Path,
        options: &AlignOptions,
    ) -> Result<Vec<u8>> {
        let bytes = recording.audio()?;
        // Removed when it goes out of scope, on success and failure alike.
        let signal = write_temp_wav(&bytes, temp_dir)?;
        self.aligner.align(signal.path(), bpf, options)
    }
}

impl Annotator<SystemCommandExecutor> {
    /// Create an annotator that runs the real aligner.
    pub fn system(config: &Config) -> Self {
        Self::new(config, SystemCommandExecutor::new())
    }
}

/// Where the annotation of `recording` is saved: `<dir>/<stem>.<outformat>`,
/// with `dir` defaulting to the recording's own directory.
pub fn annotation_path(recording: &Path, out_dir: Option<&Path>, outformat: &str) -> PathBuf {
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| recording.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = recording
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "annotation".to_string());
    dir.join(format!("{}.{}", stem, outformat))
}
