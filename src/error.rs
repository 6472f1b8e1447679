//! Error types for maus-align.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MausError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Lexicon errors
    #[error("Lexicon directory not found at {path}")]
    LexiconNotFound { path: String },

    #[error("Malformed lexicon entry in {path} line {line}: {content:?}")]
    LexiconMalformed {
        path: String,
        line: usize,
        content: String,
    },

    #[error("Lexicon file {path} line {line} is not valid UTF-8")]
    LexiconEncoding { path: String, line: usize },

    #[error("'{word}' not present in lexicon")]
    IncompleteLexicon { word: String },

    // Audio errors
    #[error("Audio file not found at {path}")]
    AudioNotFound { path: String },

    #[error("Invalid audio: {message}")]
    AudioInvalid { message: String },

    // Aligner errors
    #[error("Aligner executable not found: {program}")]
    AlignerNotFound { program: String },

    #[error("Failed to run aligner {program}: {message}")]
    AlignerSpawn { program: String, message: String },

    #[error("Alignment failed (exit status: {}): {}", format_status(.status), stderr_summary(.stdout, .stderr))]
    AlignmentFailed {
        /// Exit code of the aligner process, `None` if it was killed by a signal.
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

fn format_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

/// Last non-empty line of stderr, falling back to stdout.
fn stderr_summary(stdout: &str, stderr: &str) -> String {
    [stderr, stdout]
        .iter()
        .find_map(|stream| stream.lines().rev().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "no output produced".to_string())
}

pub type Result<T> = std::result::Result<T, MausError>;
