use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use maus_align::annotate::{Annotator, BatchPolicy, FileRecording, annotation_path};
use maus_align::cli::{Cli, Commands, ConfigAction};
use maus_align::config::Config;
use maus_align::{Lexicon, bpf};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    tracing::debug!(version = %maus_align::version_string(), "starting");

    match cli.command {
        Commands::Bpf {
            transcript,
            lexicon,
        } => {
            let config = load_config(cli.config.as_deref())?;
            handle_bpf(&config, &transcript, lexicon.as_deref())?;
        }
        Commands::Align {
            audio,
            transcript,
            lexicon,
            output,
            work_dir,
            options,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let annotator = Annotator::system(&config);
            let lexicon = annotator.load_lexicon(lexicon.as_deref())?;
            let bpf = bpf::compile(&transcript, &lexicon)?;

            let annotation = annotator.aligner().align_in(
                &audio,
                &bpf,
                &options.to_options()?,
                work_dir.as_deref(),
            )?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &annotation)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !cli.quiet {
                        eprintln!("Annotation written to {}", path.display());
                    }
                }
                None => std::io::stdout()
                    .write_all(&annotation)
                    .context("Failed to write annotation to stdout")?,
            }
        }
        Commands::Batch {
            transcript,
            audio,
            lexicon,
            out_dir,
            fail_fast,
            json,
            work_dir,
            options,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(dir) = work_dir {
                config.batch.temp_dir = Some(dir);
            }
            if fail_fast {
                config.batch.policy = BatchPolicy::AbortOnFirstError;
            }
            let align_options = options.to_options()?;
            let annotator = Annotator::system(&config);
            let extension = annotator
                .aligner()
                .resolve(&align_options)
                .outformat()
                .to_string();
            let lexicon = annotator.load_lexicon(lexicon.as_deref())?;
            let recordings: Vec<FileRecording> =
                audio.iter().map(FileRecording::new).collect();
            let outcomes =
                annotator.annotate_batch(recordings, &transcript, &lexicon, &align_options)?;

            let mut summary = Vec::with_capacity(outcomes.len());
            for (path, outcome) in audio.iter().zip(&outcomes) {
                let entry = match &outcome.result {
                    Ok(annotation) => {
                        let target = annotation_path(path, out_dir.as_deref(), &extension);
                        std::fs::write(&target, annotation)
                            .with_context(|| format!("Failed to write {}", target.display()))?;
                        BatchEntry {
                            recording: outcome.id.clone(),
                            output: Some(target),
                            error: None,
                        }
                    }
                    Err(e) => BatchEntry {
                        recording: outcome.id.clone(),
                        output: None,
                        error: Some(e.to_string()),
                    },
                };
                summary.push(entry);
            }
            let skipped = audio.len() - outcomes.len();

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if !cli.quiet {
                print_batch_summary(&summary, skipped);
            }

            if summary.iter().any(|e| e.error.is_some()) {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "maus-align",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over the flags.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("maus_align={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Print the BPF, or every word the lexicon is missing.
fn handle_bpf(config: &Config, transcript: &str, lexicon_dir: Option<&Path>) -> Result<()> {
    let lexicon = Annotator::system(config).load_lexicon(lexicon_dir)?;
    let tokens = bpf::tokenize(transcript);
    report_missing(&lexicon, &tokens);
    print!("{}", bpf::compile(transcript, &lexicon)?);
    Ok(())
}

fn report_missing(lexicon: &Lexicon, tokens: &[String]) {
    let missing = lexicon.missing(tokens.iter().map(String::as_str));
    if missing.is_empty() {
        return;
    }
    eprintln!("{}", "Words missing from the lexicon:".red());
    for word in &missing {
        eprintln!("  {}", word);
    }
    std::process::exit(1);
}

#[derive(Debug, Serialize)]
struct BatchEntry {
    recording: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn print_batch_summary(summary: &[BatchEntry], skipped: usize) {
    for entry in summary {
        match (&entry.output, &entry.error) {
            (Some(output), _) => {
                println!("{} {} -> {}", "ok".green(), entry.recording, output.display())
            }
            (None, Some(error)) => println!("{} {}: {}", "FAILED".red(), entry.recording, error),
            (None, None) => {}
        }
    }
    if skipped > 0 {
        println!("{} {} recording(s) not processed", "skipped".yellow(), skipped);
    }
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    let config_path = custom_path
        .map(Path::to_path_buf)
        .or_else(Config::default_path);

    match action {
        ConfigAction::Path => match config_path {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine config directory"),
        },
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Dump => {
            print!("{}", Config::default().to_toml()?);
        }
    }

    Ok(())
}
