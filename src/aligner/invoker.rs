//! One MAUS invocation: prepare artifacts, run, collect.
//!
//! Success is decided only by the output artifact: it must exist and be
//! non-empty. The exit status is captured for the error payload but never
//! consulted.

use super::params::{AlignOptions, ResolvedParams};
use super::runner::{AlignerRunner, CommandExecutor, ProcessOutput, SystemCommandExecutor};
use crate::audio::wav::probe_wav;
use crate::config::{Config, MausDefaults};
use crate::defaults::{BPF_SUFFIX, TEMP_PREFIX};
use crate::error::{MausError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Drives the external aligner with resolved parameters.
pub struct Aligner<E: CommandExecutor> {
    runner: AlignerRunner,
    defaults: MausDefaults,
    executor: E,
}

impl<E: CommandExecutor> Aligner<E> {
    /// Create an aligner from the process configuration and an executor.
    pub fn new(config: &Config, executor: E) -> Self {
        Self {
            runner: AlignerRunner::from_config(&config.aligner),
            defaults: config.maus.clone(),
            executor,
        }
    }

    pub fn runner(&self) -> &AlignerRunner {
        &self.runner
    }

    /// The exact parameter set a call with `options` passes to MAUS.
    pub fn resolve(&self, options: &AlignOptions) -> ResolvedParams {
        options.resolve(&self.defaults)
    }

    /// Align `audio` against `bpf`, using the audio file's directory for
    /// temporary artifacts.
    pub fn align(&self, audio: &Path, bpf: &str, options: &AlignOptions) -> Result<Vec<u8>> {
        self.align_in(audio, bpf, options, None)
    }

    /// Align `audio` against `bpf` with temporary artifacts in `work_dir`
    /// (or the audio file's directory when `None`).
    ///
    /// Returns the aligner output byte for byte; its encoding is whatever
    /// the requested output format uses. Both temporary artifacts are gone
    /// when this returns, whatever the outcome.
    pub fn align_in(
        &self,
        audio: &Path,
        bpf: &str,
        options: &AlignOptions,
        work_dir: Option<&Path>,
    ) -> Result<Vec<u8>> {
        // PREPARE
        let audio = resolve_audio(audio)?;
        let audio_dir = parent_dir(&audio)?;
        let work_dir = match work_dir {
            Some(dir) => dir.canonicalize()?,
            None => audio_dir.clone(),
        };

        match probe_wav(&audio) {
            Ok(info) => tracing::debug!(
                audio = %audio.display(),
                sample_rate = info.sample_rate,
                channels = info.channels,
                duration_secs = info.duration_secs(),
                "probed signal"
            ),
            Err(e) => tracing::warn!(audio = %audio.display(), "could not read WAV header: {}", e),
        }

        let params = self.resolve(options);
        let bpf_file = write_bpf(bpf, &work_dir)?;
        let out_file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&format!(".{}", params.outformat()))
            .tempfile_in(&work_dir)?;

        let args = params.to_args(&audio, bpf_file.path(), out_file.path());
        let (program, argv) = self
            .runner
            .command(&[work_dir.as_path(), audio_dir.as_path()], args);
        tracing::debug!(program = %program, args = ?argv, "invoking aligner");

        // INVOKE
        let result = self.executor.execute(&program, &argv);

        // The input artifact goes as soon as the process has exited.
        remove_artifact(bpf_file, "BPF input");
        let output = result?;

        // COLLECT
        collect(out_file, output)
    }
}

impl Aligner<SystemCommandExecutor> {
    /// Create an aligner that runs real processes.
    pub fn system(config: &Config) -> Self {
        Self::new(config, SystemCommandExecutor::new())
    }
}

fn resolve_audio(audio: &Path) -> Result<PathBuf> {
    audio.canonicalize().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MausError::AudioNotFound {
                path: audio.display().to_string(),
            }
        } else {
            MausError::Io(e)
        }
    })
}

fn parent_dir(path: &Path) -> Result<PathBuf> {
    path.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| MausError::AudioInvalid {
            message: format!("{} has no parent directory", path.display()),
        })
}

fn write_bpf(bpf: &str, dir: &Path) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(BPF_SUFFIX)
        .tempfile_in(dir)?;
    file.write_all(bpf.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Delete an artifact now, logging rather than failing if that is impossible.
fn remove_artifact(file: NamedTempFile, what: &str) {
    let path = file.path().to_path_buf();
    if let Err(e) = file.close()
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), "failed to remove {}: {}", what, e);
    }
}

/// Non-empty output ⇒ success; anything else ⇒ `AlignmentFailed`.
fn collect(out_file: NamedTempFile, process: ProcessOutput) -> Result<Vec<u8>> {
    let bytes = match std::fs::read(out_file.path()) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(MausError::Io(e)),
    };
    remove_artifact(out_file, "aligner output");

    if bytes.is_empty() {
        tracing::debug!(status = ?process.status, "aligner produced no output");
        return Err(MausError::AlignmentFailed {
            status: process.status,
            stdout: process.stdout,
            stderr: process.stderr,
        });
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::runner::tests::{MockCommandExecutor, arg_value};
    use crate::config::RunnerKind;
    use std::fs;
    use tempfile::TempDir;

    const TEXTGRID: &str = "File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n";

    fn audio_in(dir: &Path) -> PathBuf {
        let path = dir.join("rec.wav");
        fs::write(&path, crate::audio::wav::tests::make_wav_data(16000, 1, &[0; 160])).unwrap();
        path
    }

    /// Files in `dir` other than the signal itself.
    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name != "rec.wav")
            .collect()
    }

    #[test]
    fn test_align_returns_output_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        let mock = MockCommandExecutor::new().writing_output(TEXTGRID);
        let aligner = Aligner::new(&Config::default(), &mock);

        let result = aligner
            .align(&audio, "ORT: 0 alan\nKAN: 0 {l@n", &AlignOptions::new())
            .unwrap();

        assert_eq!(result, TEXTGRID.as_bytes());
        assert!(leftovers(dir.path()).is_empty());
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_align_passes_bpf_contents_and_params() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        let bpf = "ORT: 0 alan\nKAN: 0 {l@n";
        let mock = MockCommandExecutor::new().with_behaviour(move |args| {
            let bpf_path = arg_value(args, "BPF").unwrap();
            assert_eq!(fs::read_to_string(bpf_path).unwrap(), bpf);
            fs::write(arg_value(args, "OUT").unwrap(), TEXTGRID).unwrap();
            Ok(ProcessOutput::default())
        });
        let aligner = Aligner::new(&Config::default(), &mock);

        aligner
            .align(&audio, bpf, &AlignOptions::new().language("deu"))
            .unwrap();

        let (program, args) = mock.calls().remove(0);
        assert_eq!(program, "maus");
        let canonical = audio.canonicalize().unwrap();
        assert_eq!(arg_value(&args, "SIGNAL"), Some(canonical.to_str().unwrap()));
        assert_eq!(arg_value(&args, "LANGUAGE"), Some("deu"));
        assert_eq!(arg_value(&args, "OUTFORMAT"), Some("TextGrid"));
        assert_eq!(arg_value(&args, "INSKANTEXTGRID"), Some("true"));
        assert_eq!(arg_value(&args, "INSORTTEXTGRID"), Some("true"));
        assert!(arg_value(&args, "OUT").unwrap().ends_with(".TextGrid"));
        assert!(arg_value(&args, "BPF").unwrap().ends_with(".par"));
    }

    #[test]
    fn test_outformat_param_sets_output_suffix() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        let mock = MockCommandExecutor::new().writing_output("ORT: 0 alan");
        let aligner = Aligner::new(&Config::default(), &mock);
        let options = AlignOptions::new().param_assignment("OUTFORMAT=par").unwrap();

        assert_eq!(aligner.resolve(&options).outformat(), "par");
        aligner.align(&audio, "\n", &options).unwrap();

        let args = &mock.calls()[0].1;
        assert_eq!(arg_value(args, "OUTFORMAT"), Some("par"));
        assert!(arg_value(args, "OUT").unwrap().ends_with(".par"));
    }

    #[test]
    fn test_artifacts_live_in_audio_directory_by_default() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        let mock = MockCommandExecutor::new().writing_output(TEXTGRID);
        let aligner = Aligner::new(&Config::default(), &mock);

        aligner.align(&audio, "\n", &AlignOptions::new()).unwrap();

        let canonical_dir = dir.path().canonicalize().unwrap();
        let args = &mock.calls()[0].1;
        assert!(Path::new(arg_value(args, "BPF").unwrap()).starts_with(&canonical_dir));
        assert!(Path::new(arg_value(args, "OUT").unwrap()).starts_with(&canonical_dir));
    }

    #[test]
    fn test_explicit_work_dir_holds_artifacts() {
        let audio_dir = TempDir::new().unwrap();
        let work_dir = TempDir::new().unwrap();
        let audio = audio_in(audio_dir.path());
        let mock = MockCommandExecutor::new().writing_output(TEXTGRID);
        let aligner = Aligner::new(&Config::default(), &mock);

        aligner
            .align_in(&audio, "\n", &AlignOptions::new(), Some(work_dir.path()))
            .unwrap();

        let canonical_work = work_dir.path().canonicalize().unwrap();
        let args = &mock.calls()[0].1;
        assert!(Path::new(arg_value(args, "OUT").unwrap()).starts_with(&canonical_work));
        assert!(leftovers(work_dir.path()).is_empty());
    }

    #[test]
    fn test_empty_output_is_alignment_failure() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        let mock = MockCommandExecutor::new().failing(0, "WARNING: no speech found\n");
        let aligner = Aligner::new(&Config::default(), &mock);

        let err = aligner.align(&audio, "\n", &AlignOptions::new()).unwrap_err();

        match err {
            MausError::AlignmentFailed { status, stderr, .. } => {
                // Exit status 0 does not make an empty result a success
                assert_eq!(status, Some(0));
                assert_eq!(stderr, "WARNING: no speech found\n");
            }
            other => panic!("expected AlignmentFailed, got {other:?}"),
        }
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_deleted_output_is_alignment_failure() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        let mock = MockCommandExecutor::new().with_behaviour(|args| {
            fs::remove_file(arg_value(args, "OUT").unwrap()).unwrap();
            Ok(ProcessOutput {
                status: Some(1),
                stdout: "partial".to_string(),
                stderr: "crashed".to_string(),
            })
        });
        let aligner = Aligner::new(&Config::default(), &mock);

        let err = aligner.align(&audio, "\n", &AlignOptions::new()).unwrap_err();

        assert!(matches!(
            err,
            MausError::AlignmentFailed {
                status: Some(1),
                ..
            }
        ));
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_nonzero_exit_with_output_is_success() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        let mock = MockCommandExecutor::new().with_behaviour(|args| {
            fs::write(arg_value(args, "OUT").unwrap(), TEXTGRID).unwrap();
            Ok(ProcessOutput {
                status: Some(2),
                ..ProcessOutput::default()
            })
        });
        let aligner = Aligner::new(&Config::default(), &mock);

        let result = aligner.align(&audio, "\n", &AlignOptions::new()).unwrap();
        assert_eq!(result, TEXTGRID.as_bytes());
    }

    #[test]
    fn test_spawn_failure_still_cleans_up() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        let mock = MockCommandExecutor::new().with_behaviour(|_| {
            Err(MausError::AlignerNotFound {
                program: "maus".to_string(),
            })
        });
        let aligner = Aligner::new(&Config::default(), &mock);

        let err = aligner.align(&audio, "\n", &AlignOptions::new()).unwrap_err();

        assert!(matches!(err, MausError::AlignerNotFound { .. }));
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_audio_is_reported_before_invoking() {
        let mock = MockCommandExecutor::new();
        let aligner = Aligner::new(&Config::default(), &mock);

        let err = aligner
            .align(
                Path::new("/nonexistent/recording-12345.wav"),
                "\n",
                &AlignOptions::new(),
            )
            .unwrap_err();

        assert!(matches!(err, MausError::AudioNotFound { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_non_utf8_output_is_returned_unchanged() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        // Latin-1 TextGrid
        let latin1 = b"text = \"caf\xe9\"\n";
        let mock = MockCommandExecutor::new().with_behaviour(move |args| {
            fs::write(arg_value(args, "OUT").unwrap(), latin1).unwrap();
            Ok(ProcessOutput::default())
        });
        let aligner = Aligner::new(&Config::default(), &mock);

        let result = aligner.align(&audio, "\n", &AlignOptions::new()).unwrap();

        assert_eq!(result, latin1);
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_utf16_output_is_returned_unchanged() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        // UTF-16LE byte order mark followed by "F"
        let utf16 = [0xffu8, 0xfe, b'F', 0x00];
        let mock = MockCommandExecutor::new().with_behaviour(move |args| {
            fs::write(arg_value(args, "OUT").unwrap(), utf16).unwrap();
            Ok(ProcessOutput::default())
        });
        let aligner = Aligner::new(&Config::default(), &mock);

        let result = aligner.align(&audio, "\n", &AlignOptions::new()).unwrap();

        assert_eq!(result, utf16);
    }

    #[test]
    fn test_docker_runner_mounts_work_and_audio_dirs() {
        let audio_dir = TempDir::new().unwrap();
        let work_dir = TempDir::new().unwrap();
        let audio = audio_in(audio_dir.path());
        let mut config = Config::default();
        config.aligner.runner = RunnerKind::Docker;
        let mock = MockCommandExecutor::new().writing_output(TEXTGRID);
        let aligner = Aligner::new(&config, &mock);

        aligner
            .align_in(&audio, "\n", &AlignOptions::new(), Some(work_dir.path()))
            .unwrap();

        let (program, args) = mock.calls().remove(0);
        let work = work_dir.path().canonicalize().unwrap();
        let audio_parent = audio_dir.path().canonicalize().unwrap();
        assert_eq!(program, "docker");
        assert_eq!(&args[..2], &["run", "--rm"]);
        assert!(args.contains(&format!("{0}:{0}", work.display())));
        assert!(args.contains(&format!("{0}:{0}", audio_parent.display())));
        assert!(args.contains(&"stevecassidy/maus".to_string()));
    }

    #[test]
    fn test_each_invocation_uses_fresh_artifacts() {
        let dir = TempDir::new().unwrap();
        let audio = audio_in(dir.path());
        let mock = MockCommandExecutor::new()
            .writing_output(TEXTGRID)
            .writing_output(TEXTGRID);
        let aligner = Aligner::new(&Config::default(), &mock);

        aligner.align(&audio, "\n", &AlignOptions::new()).unwrap();
        aligner.align(&audio, "\n", &AlignOptions::new()).unwrap();

        let calls = mock.calls();
        assert_ne!(
            arg_value(&calls[0].1, "BPF"),
            arg_value(&calls[1].1, "BPF")
        );
        assert!(leftovers(dir.path()).is_empty());
    }
}
