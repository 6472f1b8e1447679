//! maus-align - transcript to BPF compiler and MAUS forced-alignment driver
//!
//! Looks up each word of an orthographic transcript in a pronunciation
//! lexicon, renders the result as BPF, and hands it together with the
//! recording to the MAUS aligner, returning its annotation (e.g. a TextGrid).

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod aligner;
pub mod annotate;
pub mod audio;
pub mod bpf;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod lexicon;

// Pipeline stages (lexicon → bpf → aligner)
pub use aligner::{AlignOptions, Aligner, CommandExecutor, ProcessOutput, SystemCommandExecutor};
pub use annotate::{
    Annotator, BatchPolicy, FileRecording, InMemoryRecording, Recording, RecordingOutcome,
    annotation_path,
};
pub use bpf::{BpfDocument, compile, tokenize};
pub use lexicon::{Lexicon, MergePolicy};

// Error handling
pub use error::{MausError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
