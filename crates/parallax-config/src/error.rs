// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors and source locations.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// A line in a configuration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File the line belongs to (or a caller-chosen name for in-memory text).
    pub file: Arc<PathBuf>,
    /// 1-based line number.
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Malformed text; the file is abandoned.
    #[error("{at}: syntax error: {message}")]
    Syntax {
        /// Where.
        at: Location,
        /// What.
        message: String,
    },
    /// A file includes itself, directly or through other files.
    #[error("{at}: include cycle through {path}")]
    IncludeCycle {
        /// The `Include` command.
        at: Location,
        /// File that would be read twice.
        path: PathBuf,
    },
    /// A command was rejected; it is skipped and reading continues.
    #[error("{at}: {command}: {message}")]
    Command {
        /// The command.
        at: Location,
        /// Command name.
        command: String,
        /// Why it was rejected.
        message: String,
    },
    /// A name used while assembling host objects does not exist.
    #[error("{at}: no {kind} named `{name}`")]
    Unresolved {
        /// Where the name was used.
        at: Location,
        /// Expected object type.
        kind: &'static str,
        /// The missing name.
        name: String,
    },
}

impl ConfigError {
    /// Location of the error, when it has one.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::Io { .. } => None,
            Self::Syntax { at, .. }
            | Self::IncludeCycle { at, .. }
            | Self::Command { at, .. }
            | Self::Unresolved { at, .. } => Some(at),
        }
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
