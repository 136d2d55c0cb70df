use std::io;
use thiserror::Error;

/// Program name plus argument vector for one of the external
/// benchmarking binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Launch failures for the external binaries. A missing binary gets its
/// own variant so the operator-facing message can name the package that
/// provides it.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{program} not found - install it first (the dnsperf package provides both dnsperf and resperf)")]
    NotFound { program: String },
    #[error("failed to launch {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    pub fn from_io(program: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                program: program.to_string(),
            }
        } else {
            Self::Io {
                program: program.to_string(),
                source,
            }
        }
    }
}
