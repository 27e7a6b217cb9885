//! Code-improvement collaborator.
//!
//! The engine hands each resolved callable's source to a [`CodeImprover`]
//! once and attaches the reply to every case of that callable. Failures are
//! logged by the engine and never block case recording.
//!
//! [`CommandImprover`] delegates to an external program: the source goes to
//! its stdin, the code path is exported as `FYZZ_CODE_PATH`, and stdout is
//! taken as the replacement source. The program is killed if it exceeds the
//! timeout.

use std::io::{self, Read, Write};
use std::process::{ChildStdin, Command, Stdio};
use std::thread::{self, ScopedJoinHandle};
use std::time::Duration;

use thiserror::Error;
use wait_timeout::ChildExt;

/// Environment variable carrying `module::Class::method` to the command.
pub const CODE_PATH_ENV: &str = "FYZZ_CODE_PATH";

/// Default limit for one improver call.
pub const DEFAULT_IMPROVER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ImproveError {
    #[error("improver command is empty")]
    EmptyCommand,

    #[error("failed to run improver: {0}")]
    Io(#[from] io::Error),

    #[error("improver timed out after {0:?}")]
    Timeout(Duration),

    #[error("improver exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("improver output is not UTF-8")]
    InvalidOutput,
}

/// Suggests replacement source for a callable.
pub trait CodeImprover {
    /// `code_path` is `module::Class::method` (`None` for the class of a
    /// module function).
    fn suggest_improvement(&self, source: &str, code_path: &str) -> Result<String, ImproveError>;
}

/// Runs an external command per callable.
#[derive(Debug, Clone)]
pub struct CommandImprover {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandImprover {
    pub fn new(program: impl Into<String>) -> Self {
        CommandImprover {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_IMPROVER_TIMEOUT,
        }
    }

    /// Split a command line on whitespace: program then arguments.
    pub fn from_command_line(line: &str) -> Result<Self, ImproveError> {
        let mut words = line.split_whitespace();
        let program = words.next().ok_or(ImproveError::EmptyCommand)?;
        Ok(CommandImprover {
            program: program.to_string(),
            args: words.map(str::to_string).collect(),
            timeout: DEFAULT_IMPROVER_TIMEOUT,
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CodeImprover for CommandImprover {
    fn suggest_improvement(&self, source: &str, code_path: &str) -> Result<String, ImproveError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(CODE_PATH_ENV, code_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // The pipes are serviced while we wait, so neither side can stall on
        // a full buffer before the timeout is armed.
        thread::scope(|scope| {
            let writer = scope.spawn(move || feed(stdin, source.as_bytes()));
            let out = scope.spawn(move || drain(stdout));
            let err = scope.spawn(move || drain(stderr));

            let status = match child.wait_timeout(self.timeout) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ImproveError::Timeout(self.timeout));
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e.into());
                }
            };

            join(writer)?;
            let stdout = join(out)?;
            let stderr = join(err)?;
            if !status.success() {
                return Err(ImproveError::Failed {
                    code: status.code(),
                    stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
                });
            }
            String::from_utf8(stdout).map_err(|_| ImproveError::InvalidOutput)
        })
    }
}

/// Write all of `bytes`, then close the pipe. A command that ignores its
/// input closes the pipe early, which is not an error.
fn feed(stdin: Option<ChildStdin>, bytes: &[u8]) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(bytes) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn drain<P: Read>(pipe: Option<P>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn join<T>(handle: ScopedJoinHandle<'_, io::Result<T>>) -> Result<T, ImproveError> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "pipe thread panicked")))
        .map_err(ImproveError::from)
}

// ============================================================================
// Tests
// ============================================================================
