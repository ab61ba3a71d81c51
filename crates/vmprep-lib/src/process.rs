use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to launch {}: {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Cannot determine the exit status of {} on this platform",
        .program.display()
    )]
    UnsupportedPlatform { program: PathBuf },
}

/// How a launched program ended. A non-zero exit is not an error at this
/// level; callers decide what a failure means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code, or -1 when the program was terminated by a signal
    pub code: i32,
    pub signal: Option<i32>,
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        self.code == 0 && self.signal.is_none()
    }

    fn from_std(program: PathBuf, status: std::process::ExitStatus) -> Result<Self, ProcessError> {
        if let Some(code) = status.code() {
            return Ok(Self { code, signal: None });
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Ok(Self {
                    code: -1,
                    signal: Some(signal),
                });
            }
        }

        Err(ProcessError::UnsupportedPlatform { program })
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.signal {
            Some(signal) => write!(f, "signal {signal}"),
            None => write!(f, "exit code {}", self.code),
        }
    }
}

fn program_of(command: &Command) -> PathBuf {
    PathBuf::from(command.as_std().get_program())
}

fn log_invocation(command: &Command) {
    let std_command = command.as_std();
    tracing::debug!(
        program = %std_command.get_program().to_string_lossy(),
        args = ?std_command.get_args().collect::<Vec<_>>(),
        "Running command"
    );
}

/// Runs `command` to completion with the parent's stdout and stderr.
pub async fn run(command: &mut Command) -> Result<ExitStatus, ProcessError> {
    log_invocation(command);
    let program = program_of(command);

    let status = command
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|source| ProcessError::Launch {
            program: program.clone(),
            source,
        })?;

    ExitStatus::from_std(program, status)
}

/// Like [`run`], but captures stdout and returns it alongside the status.
/// Stderr still goes to the parent.
pub async fn run_captured(command: &mut Command) -> Result<(ExitStatus, String), ProcessError> {
    log_invocation(command);
    let program = program_of(command);

    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .await
        .map_err(|source| ProcessError::Launch {
            program: program.clone(),
            source,
        })?;

    let status = ExitStatus::from_std(program, output.status)?;
    Ok((status, String::from_utf8_lossy(&output.stdout).into_owned()))
}
