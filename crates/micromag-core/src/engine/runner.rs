use super::error::RunnerError;
use super::progress::{Progress, ProgressReporter, Verbosity, count_snapshots, tracing_reporter};
use std::fmt;
use std::io;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Structured result of one external-process invocation.
///
/// Captured output is `None` on platforms where capture is unavailable,
/// never silently empty.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub command: Vec<String>,
    pub code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

impl fmt::Display for ProcessOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "command: {}", self.command_line())?;
        match (&self.stdout, &self.stderr) {
            (Some(stdout), Some(stderr)) => {
                writeln!(f, "stdout: {stdout}")?;
                write!(f, "stderr: {stderr}")
            }
            _ => write!(f, "stdout/stderr capture unavailable on this platform"),
        }
    }
}

pub(crate) fn capture_available() -> bool {
    !cfg!(windows)
}

/// Runs `command` in `workdir`, capturing output where the platform allows.
pub(crate) fn run_captured(command: &[String], workdir: &Path) -> io::Result<ProcessOutput> {
    let (program, args) = command.split_first().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "empty command line")
    })?;
    let mut invocation = Command::new(program);
    invocation.args(args).current_dir(workdir);
    if capture_available() {
        let output = invocation.output()?;
        Ok(ProcessOutput {
            command: command.to_vec(),
            code: output.status.code(),
            stdout: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        })
    } else {
        let status = invocation.status()?;
        Ok(ProcessOutput {
            command: command.to_vec(),
            code: status.code(),
            stdout: None,
            stderr: None,
        })
    }
}

/// Observation settings for [`ExternalRunner::call`].
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub verbosity: Verbosity,
    pub need_stderr: bool,
    /// Number of snapshots the external package is expected to write; drives
    /// the progress mode together with `snapshot_extension`.
    pub expected_snapshots: Option<usize>,
    pub snapshot_extension: Option<String>,
}

/// How to invoke an external simulation binary, decoupled from what is being
/// driven.
pub trait ExternalRunner {
    /// Name of the external simulation package.
    fn package_name(&self) -> &str;

    /// Builds the command line for `argstr` without executing anything; also
    /// the dry-run product embedded in scheduler submission scripts.
    fn command(&self, argstr: &str) -> Vec<String>;

    /// Runs the external binary synchronously.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned; a non-zero exit is
    /// reported through [`ProcessOutput::code`], not as an error.
    fn invoke(&self, argstr: &str, workdir: &Path, _need_stderr: bool) -> io::Result<ProcessOutput> {
        run_captured(&self.command(argstr), workdir)
    }

    /// Invokes the external package and observes it according to
    /// `options.verbosity`: silently, with a one-line summary, or with
    /// snapshot-counting progress reports.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ProcessFailed`] on a non-zero exit code,
    /// embedding the full command line and any captured output.
    fn call(
        &self,
        argstr: &str,
        workdir: &Path,
        options: &CallOptions,
    ) -> Result<ProcessOutput, RunnerError> {
        let reporter = match options.verbosity {
            Verbosity::Quiet => ProgressReporter::new(),
            _ => tracing_reporter(),
        };
        reporter.report(Progress::RunStart {
            package: self.package_name().to_string(),
        });
        let started = Instant::now();

        let watch = match (
            options.verbosity,
            options.expected_snapshots,
            options.snapshot_extension.as_deref(),
        ) {
            (Verbosity::Progress, Some(expected), Some(extension)) if expected > 0 => {
                Some((expected, extension))
            }
            _ => None,
        };
        let output = match watch {
            Some((expected, extension)) => {
                let stop = AtomicBool::new(false);
                std::thread::scope(|scope| {
                    scope.spawn(|| {
                        let mut last = count_snapshots(workdir, extension);
                        while !stop.load(Ordering::Relaxed) {
                            std::thread::sleep(Duration::from_millis(500));
                            let written = count_snapshots(workdir, extension);
                            if written != last {
                                last = written;
                                reporter.report(Progress::Snapshots { written, expected });
                            }
                        }
                    });
                    let result = self.invoke(argstr, workdir, options.need_stderr);
                    stop.store(true, Ordering::Relaxed);
                    result
                })
            }
            _ => self.invoke(argstr, workdir, options.need_stderr),
        }?;

        if !output.success() {
            return Err(RunnerError::ProcessFailed {
                package: self.package_name().to_string(),
                output,
            });
        }
        reporter.report(Progress::RunFinish {
            package: self.package_name().to_string(),
            elapsed_secs: started.elapsed().as_secs(),
        });
        debug!(package = self.package_name(), "external run succeeded");
        Ok(output)
    }
}

/// A runner that invokes a named executable with whitespace-separated
/// arguments.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    executable: String,
}

impl CommandRunner {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl ExternalRunner for CommandRunner {
    fn package_name(&self) -> &str {
        &self.executable
    }

    fn command(&self, argstr: &str) -> Vec<String> {
        std::iter::once(self.executable.clone())
            .chain(argstr.split_whitespace().map(String::from))
            .collect()
    }
}
