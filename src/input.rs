//! Input configuration and source file discovery.
//!
//! A caller describes each source tree with an [`Input`]; [`Input::sanitize`]
//! validates the fields and fills in language defaults, and
//! [`Input::files`] walks the directory collecting matching files.

use std::path::PathBuf;

use encoding_rs::Encoding;
use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::lang::{self, Language};
use crate::source::{self, Uri};

/// The full configuration for one pipeline run.
#[derive(Debug, Default)]
pub struct ParseConfig {
    /// Source trees to scan. A multi-language project supplies several.
    pub inputs: Vec<Input>,
}

impl ParseConfig {
    pub fn sanitize(&mut self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(Error::InvalidConfig {
                field: "inputs".to_string(),
                message: "at least one input is required".to_string(),
            });
        }
        for (index, input) in self.inputs.iter_mut().enumerate() {
            input.sanitize().map_err(|err| match err {
                Error::InvalidConfig { field, message } => Error::InvalidConfig {
                    field: format!("inputs[{}].{}", index, field),
                    message,
                },
                other => other,
            })?;
        }
        Ok(())
    }
}

/// One source tree to extract documentation from.
#[derive(Debug)]
pub struct Input {
    /// Language identifier; must match a registered language.
    pub lang: String,
    /// Filesystem root to scan.
    pub dir: PathBuf,
    /// Extension filter. Empty means the language's defaults.
    pub exts: Vec<String>,
    /// Whether to walk subdirectories.
    pub recursive: bool,
    /// IANA charset name of the source files. `None` means UTF-8.
    pub encoding: Option<String>,
}

impl Input {
    pub fn new(lang: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Input {
            lang: lang.into(),
            dir: dir.into(),
            exts: Vec::new(),
            recursive: false,
            encoding: None,
        }
    }

    /// Validate the fields and normalize the extension filter.
    pub fn sanitize(&mut self) -> Result<()> {
        if self.lang.is_empty() {
            return Err(Error::InvalidConfig {
                field: "lang".to_string(),
                message: "required".to_string(),
            });
        }
        let language = lang::get(&self.lang).ok_or_else(|| Error::InvalidConfig {
            field: "lang".to_string(),
            message: format!("unsupported language {}", self.lang),
        })?;

        if !self.dir.is_dir() {
            return Err(Error::InvalidConfig {
                field: "dir".to_string(),
                message: format!("{} is not a directory", self.dir.display()),
            });
        }

        if self.exts.is_empty() {
            self.exts = language.exts.iter().map(|e| e.to_string()).collect();
        } else {
            let normalized: Vec<String> = self
                .exts
                .iter()
                .filter(|e| !e.is_empty())
                .map(|e| {
                    if e.starts_with('.') {
                        e.clone()
                    } else {
                        format!(".{}", e)
                    }
                })
                .collect();
            self.exts = normalized;
        }

        if source::encoding_for(self.encoding.as_deref()).is_none() {
            return Err(Error::InvalidConfig {
                field: "encoding".to_string(),
                message: format!(
                    "unknown charset {}",
                    self.encoding.as_deref().unwrap_or_default()
                ),
            });
        }

        Ok(())
    }

    /// The language this input was validated against. Call after
    /// [`sanitize`](Input::sanitize).
    pub fn language(&self) -> Option<&'static Language> {
        lang::get(&self.lang)
    }

    /// The resolved charset. Defaults to UTF-8.
    pub fn charset(&self) -> &'static Encoding {
        source::encoding_for(self.encoding.as_deref()).unwrap_or(encoding_rs::UTF_8)
    }

    /// Walk `dir` and collect files matching the extension filter. Hidden
    /// directories are skipped; unreadable entries are logged and skipped.
    pub fn files(&self) -> Vec<Uri> {
        let mut walker = WalkDir::new(&self.dir);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut uris = Vec::new();
        for entry in walker.into_iter().filter_entry(|e| {
            if e.path() == self.dir {
                return true;
            }
            !e.file_name().to_string_lossy().starts_with('.')
        }) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry: {}", err);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().map(|n| n.to_string_lossy());
            let matched = name
                .map(|n| self.exts.iter().any(|ext| n.ends_with(ext.as_str())))
                .unwrap_or(false);
            if matched {
                uris.push(Uri::new(path));
            }
        }

        debug!(
            "{}: {} file(s) for language {}",
            self.dir.display(),
            uris.len(),
            self.lang
        );
        uris
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_fills_default_exts() {
        let dir = TempDir::new().unwrap();
        let mut input = Input::new("go", dir.path());
        input.sanitize().unwrap();
        assert_eq!(input.exts, vec![".go"]);
    }

    #[test]
    fn test_sanitize_normalizes_exts() {
        let dir = TempDir::new().unwrap();
        let mut input = Input::new("go", dir.path());
        input.exts = vec!["go".to_string(), ".mod".to_string()];
        input.sanitize().unwrap();
        assert_eq!(input.exts, vec![".go", ".mod"]);
    }

    #[test]
    fn test_sanitize_rejects_unknown_lang() {
        let dir = TempDir::new().unwrap();
        let mut input = Input::new("fortran77", dir.path());
        assert!(input.sanitize().is_err());
    }

    #[test]
    fn test_sanitize_rejects_missing_dir() {
        let mut input = Input::new("go", "/no/such/dir");
        assert!(input.sanitize().is_err());
    }

    #[test]
    fn test_sanitize_rejects_unknown_encoding() {
        let dir = TempDir::new().unwrap();
        let mut input = Input::new("go", dir.path());
        input.encoding = Some("ebcdic-ancient".to_string());
        assert!(input.sanitize().is_err());
    }

    #[test]
    fn test_files_respects_recursive_flag() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.go"), "").unwrap();

        let mut input = Input::new("go", dir.path());
        input.sanitize().unwrap();
        assert_eq!(input.files().len(), 1);

        input.recursive = true;
        assert_eq!(input.files().len(), 2);
    }

    #[test]
    fn test_files_skips_hidden_and_filters_ext() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "").unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/c.go"), "").unwrap();

        let mut input = Input::new("go", dir.path());
        input.recursive = true;
        input.sanitize().unwrap();

        let files = input.files();
        assert_eq!(files.len(), 1);
        assert!(files[0].path().ends_with("a.go"));
    }

    #[test]
    fn test_config_requires_inputs() {
        let mut config = ParseConfig::default();
        assert!(config.sanitize().is_err());
    }
}
