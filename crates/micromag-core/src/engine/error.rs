use super::runner::ProcessOutput;
use crate::core::error::ModelError;
use crate::core::io::ovf::OvfError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Error in {package} run.\n{output}")]
    ProcessFailed {
        package: String,
        output: ProcessOutput,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("System directory {0} already exists and append is disabled")]
    SystemDirectoryExists(PathBuf),

    #[error("Scheduler submission failed.\n{output}")]
    SubmissionFailed { output: ProcessOutput },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("Magnetization I/O failed: {0}")]
    Ovf(#[from] OvfError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Provenance record serialization failed: {0}")]
    Provenance(#[from] serde_json::Error),
}
