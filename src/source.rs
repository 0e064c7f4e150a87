//! Source locations and file reading.
//!
//! A [`Uri`] names a source file; [`Uri::read`] decodes its bytes with a
//! named IANA charset into a UTF-8 string the lexer can scan. Positions
//! and ranges are byte-based and 0-indexed; they are shifted to 1-indexed
//! only when a diagnostic message is built.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::error::{Error, Result};

/// Identifies a source location the pipeline can read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri(PathBuf);

impl Uri {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Uri(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Read the file and decode it with `encoding`.
    ///
    /// Bytes that are not valid in the declared charset fail the read
    /// rather than being silently replaced.
    pub fn read(&self, encoding: &'static Encoding) -> Result<String> {
        debug!("reading {} as {}", self.0.display(), encoding.name());

        let bytes = fs::read(&self.0).map_err(|source| Error::Io {
            file: self.0.clone(),
            source,
        })?;

        let (text, _, had_errors) = encoding.decode(&bytes);
        if had_errors {
            return Err(Error::Encoding {
                file: self.0.clone(),
                name: encoding.name().to_string(),
            });
        }
        Ok(text.into_owned())
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Resolve an IANA charset label. `None` or empty means UTF-8.
pub fn encoding_for(label: Option<&str>) -> Option<&'static Encoding> {
    match label {
        None => Some(UTF_8),
        Some(name) if name.is_empty() => Some(UTF_8),
        Some(name) => Encoding::for_label(name.as_bytes()),
    }
}

/// A location in a source file. 0-indexed; `column` and `offset` count
/// bytes of the decoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// A half-open span between two positions, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// A contiguous comment region emitted by the lexer.
///
/// `raw` is the region exactly as it appears in the file at `range`;
/// `data` is the same region with comment markers stripped.
#[derive(Debug, Clone)]
pub struct RawBlock {
    pub file: Uri,
    pub range: Range,
    pub raw: String,
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_read_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.go");
        fs::write(&path, "// héllo\n").unwrap();

        let text = Uri::new(&path).read(UTF_8).unwrap();
        assert_eq!(text, "// héllo\n");
    }

    #[test]
    fn test_read_gbk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.go");
        // "中文" encoded as GBK
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&[0xD6, 0xD0, 0xCE, 0xC4]).unwrap();

        let enc = encoding_for(Some("gbk")).unwrap();
        let text = Uri::new(&path).read(enc).unwrap();
        assert_eq!(text, "中文");
    }

    #[test]
    fn test_invalid_bytes_fail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.go");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&[0xFF, 0xFE, 0xFF]).unwrap();

        let err = Uri::new(&path).read(UTF_8).unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Uri::new("/definitely/not/here.go").read(UTF_8).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_unknown_label() {
        assert!(encoding_for(Some("no-such-charset")).is_none());
        assert_eq!(encoding_for(None).unwrap().name(), "UTF-8");
    }
}
