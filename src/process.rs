use std::{
    ffi::{OsStr, OsString},
    path::PathBuf,
    process::{ExitStatus, Stdio},
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::process::{Child, Command};

use crate::error_code::ErrorCode;

struct MetricsGuard {
    start: Instant,
    armed: bool,
    command: Arc<str>,
}

impl MetricsGuard {
    fn guard(command: Arc<str>) -> Self {
        metrics::counter!("reelhouse.process.start", "command" => command.to_string()).increment(1);

        Self {
            start: Instant::now(),
            armed: true,
            command,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for MetricsGuard {
    fn drop(&mut self) {
        metrics::histogram!(
            "reelhouse.process.duration",
            "command" => self.command.to_string(),
            "completed" => (!self.armed).to_string(),
        )
        .record(self.start.elapsed().as_secs_f64());

        metrics::counter!(
            "reelhouse.process.end",
            "completed" => (!self.armed).to_string(),
            "command" => self.command.to_string(),
        )
        .increment(1);
    }
}

/// An external program, optionally preceded by fixed arguments
///
/// Leading arguments let a tool be run through a wrapper, e.g. `sh script.sh` or `nice ffmpeg`.
#[derive(Clone, Debug)]
pub(crate) struct Tool {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl Tool {
    pub(crate) fn new(program: impl Into<PathBuf>) -> Self {
        Tool {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_leading_args<I, T>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Tool {
            program: program.into(),
            leading_args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn name(&self) -> Arc<str> {
        let name = self
            .program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy();

        Arc::from(name.as_ref())
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProcessError {
    #[error("Required command {0} not found, make sure it exists in reelhouse's $PATH")]
    NotFound(Arc<str>),

    #[error("Cannot run command {0} due to invalid permissions on binary, make sure the reelhouse user has permission to run it")]
    PermissionDenied(Arc<str>),

    #[error("Reached process spawn limit")]
    LimitReached,

    #[error("{0} timed out")]
    Timeout(Arc<str>),

    #[error("{command} failed with {status}: {stderr}")]
    Status {
        command: Arc<str>,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Unknown process error")]
    Other(#[source] std::io::Error),
}

impl ProcessError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::COMMAND_NOT_FOUND,
            Self::PermissionDenied(_) => ErrorCode::COMMAND_PERMISSION_DENIED,
            Self::LimitReached | Self::Other(_) => ErrorCode::COMMAND_ERROR,
            Self::Timeout(_) => ErrorCode::COMMAND_TIMEOUT,
            Self::Status { .. } => ErrorCode::COMMAND_FAILURE,
        }
    }
}

pub(crate) struct Process {
    command: Arc<str>,
    child: Child,
    guard: MetricsGuard,
    timeout: Duration,
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("command", &self.command)
            .field("child", &"Child")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Process {
    pub(crate) fn run<T>(tool: &Tool, args: &[T], timeout: u64) -> Result<Self, ProcessError>
    where
        T: AsRef<OsStr>,
    {
        let command = tool.name();

        let res = tracing::trace_span!(parent: None, "Create command", %command).in_scope(|| {
            Self::spawn(
                command.clone(),
                Command::new(&tool.program)
                    .args(&tool.leading_args)
                    .args(args),
                timeout,
            )
        });

        match res {
            Ok(this) => Ok(this),
            Err(e) => match e.kind() {
                std::io::ErrorKind::NotFound => Err(ProcessError::NotFound(command)),
                std::io::ErrorKind::PermissionDenied => {
                    Err(ProcessError::PermissionDenied(command))
                }
                std::io::ErrorKind::WouldBlock => Err(ProcessError::LimitReached),
                _ => Err(ProcessError::Other(e)),
            },
        }
    }

    fn spawn(command: Arc<str>, cmd: &mut Command, timeout: u64) -> std::io::Result<Self> {
        tracing::trace_span!(parent: None, "Spawn command", %command).in_scope(|| {
            let guard = MetricsGuard::guard(command.clone());

            let cmd = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            cmd.spawn().map(|child| Process {
                command,
                child,
                guard,
                timeout: Duration::from_secs(timeout),
            })
        })
    }

    #[tracing::instrument(skip(self), fields(command = %self.command))]
    pub(crate) async fn wait(self) -> Result<(), ProcessError> {
        self.output().await.map(|_| ())
    }

    /// Wait for the process to exit and collect its stdout
    ///
    /// A non-zero exit carries the process' stderr untouched. When the timeout elapses the child
    /// is dropped, which kills it.
    #[tracing::instrument(skip(self), fields(command = %self.command))]
    pub(crate) async fn output(self) -> Result<Vec<u8>, ProcessError> {
        let Process {
            command,
            child,
            guard,
            timeout,
        } = self;

        let res = tokio::time::timeout(timeout, child.wait_with_output()).await;

        match res {
            Ok(Ok(output)) if output.status.success() => {
                guard.disarm();

                Ok(output.stdout)
            }
            Ok(Ok(output)) => Err(ProcessError::Status {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(ProcessError::Other(e)),
            Err(_) => Err(ProcessError::Timeout(command)),
        }
    }
}
