//! Lexical block recognizers.
//!
//! A [`BlockRule`] describes one construct of one language: a string, a
//! raw string, a line comment, a block comment, or a here-document. The
//! rule table of a language is read-only and shared between worker tasks;
//! anything a rule learns while matching the opener (a here-doc terminator,
//! a line comment's indentation) travels in the [`OpenBlock`] it returns.

use crate::lang::lexer::Lexer;

/// A recognizer for one lexical construct.
#[derive(Debug, Clone)]
pub enum BlockRule {
    /// Quoted string with an optional escape prefix. Emits no block; it
    /// exists so a `//` inside `"foo//bar"` is not taken for a comment.
    String {
        delim: &'static str,
        escape: Option<&'static str>,
    },
    /// String without escape interpretation (backtick, `r"`, `@"`, …).
    RawString {
        begin: &'static str,
        end: &'static str,
    },
    /// Line comment. Consecutive line comments on contiguous lines at the
    /// same indentation are collapsed into one block.
    LineComment { marker: &'static str },
    /// Delimited comment, e.g. `/* … */`. With `anchored`, the opener is
    /// only recognized at column 0 (Perl's `=pod`, Ruby's `=begin`).
    BlockComment {
        begin: &'static str,
        end: &'static str,
        anchored: bool,
    },
    /// Here-document / now-document. `opener` is `<<<` for PHP, `<<` for
    /// shell. Emits no block.
    HereDoc { opener: &'static str },
}

/// An opened block: the rule that matched plus the per-block state needed
/// to find its terminator.
#[derive(Debug)]
pub enum OpenBlock {
    Str {
        end: &'static str,
        escape: Option<&'static str>,
    },
    Raw {
        end: &'static str,
    },
    Line {
        marker: &'static str,
        indent: Vec<u8>,
    },
    Block {
        end: &'static str,
    },
    Doc {
        term1: String,
        term2: String,
    },
}

impl BlockRule {
    /// Test whether the lexer's current position opens this block. On a
    /// match the lexer is advanced past the opening token; otherwise its
    /// position is untouched.
    pub fn begin(&self, l: &mut Lexer) -> Option<OpenBlock> {
        match *self {
            BlockRule::String { delim, escape } => {
                if l.match_literal(delim) {
                    Some(OpenBlock::Str { end: delim, escape })
                } else {
                    None
                }
            }
            BlockRule::RawString { begin, end } => {
                if l.match_literal(begin) {
                    Some(OpenBlock::Raw { end })
                } else {
                    None
                }
            }
            BlockRule::LineComment { marker } => {
                let start = l.offset();
                if l.match_literal(marker) {
                    Some(OpenBlock::Line {
                        marker,
                        indent: l.indent_before(start),
                    })
                } else {
                    None
                }
            }
            BlockRule::BlockComment {
                begin,
                end,
                anchored,
            } => {
                if anchored && l.position().column != 0 {
                    return None;
                }
                if l.match_literal(begin) {
                    Some(OpenBlock::Block { end })
                } else {
                    None
                }
            }
            BlockRule::HereDoc { opener } => {
                let save = l.state();
                if !l.match_literal(opener) {
                    return None;
                }
                match heredoc_token(l.line_remainder()) {
                    Some(token) => Some(OpenBlock::Doc {
                        term1: format!("\n{}\n", token),
                        term2: format!("\n{};\n", token),
                    }),
                    None => {
                        l.restore(save);
                        None
                    }
                }
            }
        }
    }
}

impl OpenBlock {
    /// Whether a matched block of this kind produces a [`RawBlock`].
    ///
    /// [`RawBlock`]: crate::source::RawBlock
    pub fn yields_block(&self) -> bool {
        matches!(self, OpenBlock::Line { .. } | OpenBlock::Block { .. })
    }

    /// Advance the lexer until this block's terminator. Returns the block
    /// content with comment markers stripped, and whether a terminator was
    /// found before EOF.
    pub fn end(self, l: &mut Lexer) -> (String, bool) {
        match self {
            OpenBlock::Str { end, escape } => loop {
                if l.at_eof() {
                    return (String::new(), false);
                }
                if let Some(esc) = escape {
                    if l.match_literal(esc) {
                        l.advance(1);
                        continue;
                    }
                }
                if l.match_literal(end) {
                    return (String::new(), true);
                }
                l.advance(1);
            },
            OpenBlock::Raw { end } => loop {
                if l.at_eof() {
                    return (String::new(), false);
                }
                if l.match_literal(end) {
                    return (String::new(), true);
                }
                l.advance(1);
            },
            OpenBlock::Doc { term1, term2 } => loop {
                if l.at_eof() {
                    return (String::new(), false);
                }
                if l.match_literal(&term1) || l.match_literal(&term2) {
                    return (String::new(), true);
                }
                l.advance(1);
            },
            OpenBlock::Line { marker, indent } => {
                let mut data = String::new();
                data.push_str(l.consume_line());
                data.push('\n');
                loop {
                    let save = l.state();
                    if !l.match_bytes(&indent) || !l.match_literal(marker) {
                        l.restore(save);
                        break;
                    }
                    data.push_str(l.consume_line());
                    data.push('\n');
                }
                (data, true)
            }
            OpenBlock::Block { end } => {
                let content_start = l.offset();
                loop {
                    if l.at_eof() {
                        return (String::new(), false);
                    }
                    let end_start = l.offset();
                    if l.match_literal(end) {
                        let content = l.slice(content_start, end_start);
                        return (strip_adornment(content), true);
                    }
                    l.advance(1);
                }
            }
        }
    }
}

/// Pick the here-doc tag out of the text following the opener. Accepts an
/// optional leading `-` (shell `<<-`) and surrounding quotes (now-doc);
/// the tag itself must be an identifier.
fn heredoc_token(rest: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(rest).ok()?;
    let mut word = text.trim_start();
    word = word.strip_prefix('-').unwrap_or(word);
    word = word
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_end_matches(';');
    let word = word
        .strip_prefix('\'')
        .and_then(|w| w.strip_suffix('\''))
        .or_else(|| word.strip_prefix('"').and_then(|w| w.strip_suffix('"')))
        .unwrap_or(word);
    if word.is_empty() {
        return None;
    }
    let mut chars = word.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(word.to_string())
}

/// Strip `*` adornment from block comment content: per line, trim leading
/// whitespace, then a single leading `*` if present, then one optional
/// space. Line count is preserved so tag lines map back to source lines.
fn strip_adornment(content: &str) -> String {
    let stripped: Vec<&str> = content
        .split('\n')
        .map(|line| {
            let line = line.trim_start();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line)
        })
        .collect();
    stripped.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_adornment() {
        let content = " first\n * second\n *third\n   fourth";
        assert_eq!(strip_adornment(content), "first\nsecond\nthird\nfourth");
    }

    #[test]
    fn test_strip_adornment_keeps_line_count() {
        let content = "a\n *\n * b";
        assert_eq!(strip_adornment(content).split('\n').count(), 3);
    }

    #[test]
    fn test_heredoc_token_plain() {
        assert_eq!(heredoc_token(b"EOT\nbody").as_deref(), Some("EOT"));
    }

    #[test]
    fn test_heredoc_token_nowdoc() {
        assert_eq!(heredoc_token(b"'EOT'\nbody").as_deref(), Some("EOT"));
    }

    #[test]
    fn test_heredoc_token_dashed() {
        assert_eq!(heredoc_token(b"-EOF\nbody").as_deref(), Some("EOF"));
    }

    #[test]
    fn test_heredoc_token_rejects_non_identifier() {
        assert!(heredoc_token(b"").is_none());
        assert!(heredoc_token(b"123\n").is_none());
    }
}
