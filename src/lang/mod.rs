//! Language registry.
//!
//! Each [`Language`] pairs a name and default extensions with an ordered
//! set of [`BlockRule`]s. The table is built once and is read-only; worker
//! tasks share it freely.

pub mod block;
pub mod lexer;

use std::sync::LazyLock;

pub use block::BlockRule;
pub use lexer::{extract_blocks, Lexer};

/// One supported source language.
pub struct Language {
    pub name: &'static str,
    pub display_name: &'static str,
    /// Default extension filter, with leading dots.
    pub exts: &'static [&'static str],
    /// Recognizers, consulted in registration order.
    pub blocks: Vec<BlockRule>,
}

fn string(delim: &'static str) -> BlockRule {
    BlockRule::String {
        delim,
        escape: Some("\\"),
    }
}

fn line(marker: &'static str) -> BlockRule {
    BlockRule::LineComment { marker }
}

fn block(begin: &'static str, end: &'static str) -> BlockRule {
    BlockRule::BlockComment {
        begin,
        end,
        anchored: false,
    }
}

/// Block comment whose opener only counts at the start of a line.
fn anchored_block(begin: &'static str, end: &'static str) -> BlockRule {
    BlockRule::BlockComment {
        begin,
        end,
        anchored: true,
    }
}

fn raw(begin: &'static str, end: &'static str) -> BlockRule {
    BlockRule::RawString { begin, end }
}

/// `"…"`, `'…'`, `//` and `/* … */`, shared by the C family.
fn c_style() -> Vec<BlockRule> {
    vec![
        string("\""),
        string("'"),
        line("//"),
        block("/*", "*/"),
    ]
}

static LANGUAGES: LazyLock<Vec<Language>> = LazyLock::new(|| {
    vec![
        Language {
            name: "bash",
            display_name: "Bash",
            exts: &[".sh"],
            blocks: vec![
                BlockRule::HereDoc { opener: "<<" },
                string("\""),
                string("'"),
                line("#"),
            ],
        },
        Language {
            name: "c",
            display_name: "C/C++",
            exts: &[".c", ".cc", ".cpp", ".cxx", ".h", ".hpp"],
            blocks: c_style(),
        },
        Language {
            name: "csharp",
            display_name: "C#",
            exts: &[".cs"],
            blocks: {
                let mut blocks = vec![raw("@\"", "\"")];
                blocks.extend(c_style());
                blocks
            },
        },
        Language {
            name: "go",
            display_name: "Go",
            exts: &[".go"],
            blocks: {
                let mut blocks = vec![raw("`", "`")];
                blocks.extend(c_style());
                blocks
            },
        },
        Language {
            name: "java",
            display_name: "Java",
            exts: &[".java"],
            blocks: c_style(),
        },
        Language {
            name: "javascript",
            display_name: "JavaScript",
            exts: &[".js", ".mjs", ".jsx"],
            blocks: {
                let mut blocks = vec![raw("`", "`")];
                blocks.extend(c_style());
                blocks
            },
        },
        Language {
            name: "pascal",
            display_name: "Pascal/Delphi",
            exts: &[".pas", ".pp"],
            blocks: vec![
                BlockRule::String {
                    delim: "'",
                    escape: None,
                },
                block("{", "}"),
                block("(*", "*)"),
                line("//"),
            ],
        },
        Language {
            name: "perl",
            display_name: "Perl",
            exts: &[".pl", ".pm"],
            blocks: vec![
                anchored_block("=pod", "\n=cut"),
                string("\""),
                string("'"),
                line("#"),
            ],
        },
        Language {
            name: "php",
            display_name: "PHP",
            exts: &[".php"],
            blocks: vec![
                BlockRule::HereDoc { opener: "<<<" },
                string("\""),
                string("'"),
                line("//"),
                line("#"),
                block("/*", "*/"),
            ],
        },
        Language {
            name: "python",
            display_name: "Python",
            exts: &[".py"],
            blocks: vec![
                raw("\"\"\"", "\"\"\""),
                raw("'''", "'''"),
                string("\""),
                string("'"),
                line("#"),
            ],
        },
        Language {
            name: "ruby",
            display_name: "Ruby",
            exts: &[".rb"],
            blocks: vec![
                anchored_block("=begin", "\n=end"),
                string("\""),
                string("'"),
                line("#"),
            ],
        },
        Language {
            name: "rust",
            display_name: "Rust",
            exts: &[".rs"],
            blocks: {
                let mut blocks = vec![raw("r\"", "\"")];
                blocks.extend(c_style());
                blocks
            },
        },
        Language {
            name: "swift",
            display_name: "Swift",
            exts: &[".swift"],
            blocks: c_style(),
        },
        Language {
            name: "typescript",
            display_name: "TypeScript",
            exts: &[".ts", ".tsx"],
            blocks: {
                let mut blocks = vec![raw("`", "`")];
                blocks.extend(c_style());
                blocks
            },
        },
    ]
});

/// Look up a language by its registry name, case-insensitively.
pub fn get(name: &str) -> Option<&'static Language> {
    LANGUAGES
        .iter()
        .find(|lang| lang.name.eq_ignore_ascii_case(name))
}

/// All registered languages, in registration order.
pub fn languages() -> &'static [Language] {
    &LANGUAGES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(get("go").is_some());
        assert!(get("Go").is_some());
        assert!(get("COBOL").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = languages().iter().map(|l| l.name).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before);
    }

    #[test]
    fn test_every_language_has_extensions() {
        for lang in languages() {
            assert!(!lang.exts.is_empty(), "{} has no extensions", lang.name);
            for ext in lang.exts {
                assert!(ext.starts_with('.'), "{} ext {} missing dot", lang.name, ext);
            }
        }
    }
}
