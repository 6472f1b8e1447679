//! Command-line interface for maus-align
//!
//! Provides argument parsing using clap derive macros.

use crate::aligner::AlignOptions;
use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Phonetic annotation with the MAUS forced aligner
#[derive(Parser, Debug)]
#[command(
    name = "maus-align",
    version,
    about = "Phonetic annotation with the MAUS forced aligner"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: progress, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the BPF for a transcript
    Bpf {
        /// Orthographic transcript
        transcript: String,

        /// Lexicon directory (default: lexicon.dir from config)
        #[arg(long, value_name = "DIR")]
        lexicon: Option<PathBuf>,
    },

    /// Align one recording with its transcript
    Align {
        /// WAV recording
        audio: PathBuf,

        /// Orthographic transcript
        transcript: String,

        /// Lexicon directory (default: lexicon.dir from config)
        #[arg(long, value_name = "DIR")]
        lexicon: Option<PathBuf>,

        /// Write the annotation here instead of stdout
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,

        /// Directory for temporary aligner files (default: the recording's directory)
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        #[command(flatten)]
        options: AlignArgs,
    },

    /// Align several recordings that share one transcript
    Batch {
        /// Orthographic transcript shared by all recordings
        transcript: String,

        /// WAV recordings
        #[arg(required = true)]
        audio: Vec<PathBuf>,

        /// Lexicon directory (default: lexicon.dir from config)
        #[arg(long, value_name = "DIR")]
        lexicon: Option<PathBuf>,

        /// Directory for the annotations (default: next to each recording)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Stop at the first recording that fails
        #[arg(long)]
        fail_fast: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Directory for per-recording temporary files (default: batch.temp_dir
        /// from config, else the system temp directory)
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        #[command(flatten)]
        options: AlignArgs,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// MAUS options shared by `align` and `batch`
#[derive(Args, Debug, Default)]
pub struct AlignArgs {
    /// MAUS language code (default: maus.language from config)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// MAUS output format (default: maus.outformat from config)
    #[arg(long, value_name = "FORMAT")]
    pub outformat: Option<String>,

    /// Only consider the canonical pronunciation
    #[arg(long)]
    pub canonly: bool,

    /// Extra MAUS parameter, repeatable (e.g. --param INSPROB=0.1)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
}

impl AlignArgs {
    /// Convert to aligner options; unset flags fall back to config defaults.
    pub fn to_options(&self) -> Result<AlignOptions> {
        let mut options = AlignOptions::new();
        if let Some(language) = &self.language {
            options = options.language(language.clone());
        }
        if let Some(outformat) = &self.outformat {
            options = options.outformat(outformat.clone());
        }
        if self.canonly {
            options = options.canonly(true);
        }
        for assignment in &self.params {
            options = options.param_assignment(assignment)?;
        }
        Ok(options)
    }
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration (file, defaults and environment)
    Show,
    /// Print the built-in default configuration
    Dump,
}
