use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Environment variable {0} is not set")]
    MissingVariable(&'static str),

    #[error("Environment variable {name} has an invalid value '{value}': {reason}")]
    InvalidVariable {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No capture tool available, tried: {0}")]
    NoToolAvailable(String),

    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} did not finish within {seconds}s")]
    Timeout { program: String, seconds: u64 },

    #[error("Capture was not written to {0}")]
    MissingOutput(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
