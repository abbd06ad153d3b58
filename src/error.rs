//! Error kinds shared by every subcommand.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that abort the current invocation.
#[derive(thiserror::Error, Debug)]
pub enum OrthoError {
    /// Missing or conflicting command-line options.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line that does not have the shape the selected format requires.
    /// `line` is 1-based; 0 means the position is unknown.
    #[error("malformed record in {} (line {line}): {msg}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        msg: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OrthoError {
    #[cold]
    pub fn malformed<P: AsRef<Path>, M: Into<String>>(path: P, line: usize, msg: M) -> Self {
        OrthoError::MalformedRecord {
            path: path.as_ref().to_path_buf(),
            line,
            msg: msg.into(),
        }
    }

    /// Classify an open/read failure: a missing file gets its own kind.
    #[cold]
    pub fn unreadable<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            OrthoError::InputNotFound { path }
        } else {
            OrthoError::InputUnreadable { path, source }
        }
    }

    #[cold]
    pub fn write_failure<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        OrthoError::OutputWriteFailure {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Map a `csv` reader error onto our kinds, keeping the record position.
    #[cold]
    pub fn from_csv<P: AsRef<Path>>(path: P, err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
        let msg = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(source) => OrthoError::unreadable(path, source),
            _ => OrthoError::malformed(path, line, msg),
        }
    }
}
