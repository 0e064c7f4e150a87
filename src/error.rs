use std::path::PathBuf;

use crate::message::{Message, MessageKey, MessageKind};

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error types produced by the extraction pipeline
#[derive(Debug)]
pub enum Error {
    /// A source file could not be read
    Io {
        file: PathBuf,
        source: std::io::Error,
    },
    /// Unknown charset name, or the file's bytes are not valid in the
    /// declared charset
    Encoding { file: PathBuf, name: String },
    /// A syntax problem in a doc comment, carrying the message key and
    /// its arguments so the sink can render it
    Syntax {
        file: String,
        /// 0-indexed source line
        line: usize,
        key: MessageKey,
        args: Vec<String>,
    },
    /// A problem with the assembled document as a whole, not tied to a
    /// single source location
    Document { key: MessageKey, args: Vec<String> },
    /// A configuration field failed validation
    InvalidConfig { field: String, message: String },
}

impl Error {
    /// Shorthand for a syntax error at a known source location.
    pub fn syntax(
        file: impl Into<String>,
        line: usize,
        key: MessageKey,
        args: Vec<String>,
    ) -> Self {
        Error::Syntax {
            file: file.into(),
            line,
            key,
            args,
        }
    }

    /// Convert this error into the message the sink delivers to its
    /// consumer. Lines are shifted to 1-indexed here.
    pub fn into_message(self) -> Message {
        match self {
            Error::Io { file, source } => Message {
                kind: MessageKind::Error,
                file: file.display().to_string(),
                line: 0,
                key: MessageKey::ErrIO,
                args: vec![source.to_string()],
            },
            Error::Encoding { file, name } => Message {
                kind: MessageKind::Error,
                file: file.display().to_string(),
                line: 0,
                key: MessageKey::ErrEncoding,
                args: vec![name],
            },
            Error::Syntax {
                file,
                line,
                key,
                args,
            } => Message {
                kind: MessageKind::Error,
                file,
                line: line + 1,
                key,
                args,
            },
            Error::Document { key, args } => Message {
                kind: MessageKind::Error,
                file: String::new(),
                line: 0,
                key,
                args,
            },
            Error::InvalidConfig { field, message } => Message {
                kind: MessageKind::Error,
                file: String::new(),
                line: 0,
                key: MessageKey::ErrInvalidValue,
                args: vec![field, message],
            },
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io { file, source } => {
                write!(f, "failed to read {}: {}", file.display(), source)
            }
            Error::Encoding { file, name } => {
                write!(f, "cannot decode {} as {}", file.display(), name)
            }
            Error::Syntax {
                file,
                line,
                key,
                args,
            } => {
                write!(f, "{}:{}: {}", file, line + 1, key.render(args))
            }
            Error::Document { key, args } => {
                write!(f, "{}", key.render(args))
            }
            Error::InvalidConfig { field, message } => {
                write!(f, "invalid configuration field {}: {}", field, message)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
