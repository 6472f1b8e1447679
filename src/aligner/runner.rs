//! Launching the external aligner.
//!
//! The `CommandExecutor` trait keeps the invoker testable without a MAUS
//! installation; `AlignerRunner` decides what command line to hand it.

use crate::config::{AlignerConfig, RunnerKind};
use crate::error::{MausError, Result};
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Trait for executing system commands.
///
/// Object-safe, Send + Sync for use in concurrent contexts.
/// Enables testability by allowing mock implementations.
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, wait for it to exit and capture its output.
    ///
    /// The exit status is reported, never interpreted: a non-zero exit is
    /// still `Ok`. Only failing to start the process is an error.
    fn execute(&self, program: &str, args: &[String]) -> Result<ProcessOutput>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn execute(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        (**self).execute(program, args)
    }
}

/// Production command executor using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MausError::AlignerNotFound {
                        program: program.to_string(),
                    }
                } else {
                    MausError::AlignerSpawn {
                        program: program.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// How MAUS is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignerRunner {
    /// A MAUS executable on this machine.
    Local { path: String },
    /// MAUS inside a container. Every directory the aligner touches is
    /// mounted read/write at the same path inside the container.
    Docker {
        docker: String,
        image: String,
        container_path: String,
    },
}

impl AlignerRunner {
    pub fn from_config(config: &AlignerConfig) -> Self {
        match config.runner {
            RunnerKind::Local => Self::Local {
                path: config.path.clone(),
            },
            RunnerKind::Docker => Self::Docker {
                docker: config.docker.clone(),
                image: config.image.clone(),
                container_path: config.container_path.clone(),
            },
        }
    }

    /// Build `(program, args)` for one invocation.
    ///
    /// `mounts` lists the directories holding the signal and the temporary
    /// artifacts; only the container runner uses them.
    pub fn command(&self, mounts: &[&Path], params: Vec<String>) -> (String, Vec<String>) {
        match self {
            Self::Local { path } => (path.clone(), params),
            Self::Docker {
                docker,
                image,
                container_path,
            } => {
                let mut args = vec!["run".to_string(), "--rm".to_string()];
                let mut seen: Vec<&Path> = Vec::new();
                for &dir in mounts {
                    if seen.contains(&dir) {
                        continue;
                    }
                    seen.push(dir);
                    args.push("-v".to_string());
                    args.push(format!("{0}:{0}", dir.display()));
                }
                args.push(image.clone());
                args.push(container_path.clone());
                args.extend(params);
                (docker.clone(), args)
            }
        }
    }
}
