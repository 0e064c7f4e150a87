//! Byte scanner over one decoded source file.
//!
//! The lexer walks the text one position at a time, asking each of the
//! language's block rules in registration order whether the current
//! position opens a block. Comment blocks are emitted as [`RawBlock`]s;
//! strings and here-docs are consumed and discarded so their content can
//! never be mistaken for a comment.

use log::debug;

use crate::error::Error;
use crate::lang::block::{BlockRule, OpenBlock};
use crate::lang::Language;
use crate::message::{MessageHandler, MessageKey};
use crate::source::{Position, Range, RawBlock, Uri};

/// Scanner state: the decoded text, a byte cursor, and line tracking.
pub struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    line_start: usize,
}

/// Saved cursor for backtracking openers that need lookahead.
#[derive(Debug, Clone, Copy)]
pub struct LexerState {
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Lexer {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            line: 0,
            line_start: 0,
        }
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.pos - self.line_start,
            offset: self.pos,
        }
    }

    pub fn state(&self) -> LexerState {
        LexerState {
            pos: self.pos,
            line: self.line,
            line_start: self.line_start,
        }
    }

    pub fn restore(&mut self, state: LexerState) {
        self.pos = state.pos;
        self.line = state.line;
        self.line_start = state.line_start;
    }

    /// Advance `n` bytes, updating line tracking across embedded newlines.
    pub fn advance(&mut self, n: usize) {
        let stop = (self.pos + n).min(self.bytes.len());
        while self.pos < stop {
            if self.bytes[self.pos] == b'\n' {
                self.line += 1;
                self.line_start = self.pos + 1;
            }
            self.pos += 1;
        }
    }

    /// If the bytes at the cursor equal `literal`, advance past it.
    pub fn match_literal(&mut self, literal: &str) -> bool {
        self.match_bytes(literal.as_bytes())
    }

    pub fn match_bytes(&mut self, literal: &[u8]) -> bool {
        if self.bytes[self.pos..].starts_with(literal) {
            self.advance(literal.len());
            return true;
        }
        false
    }

    /// Bytes from the cursor to the next `\n` (not inclusive), without
    /// advancing.
    pub fn line_remainder(&self) -> &'a [u8] {
        let rest = &self.bytes[self.pos.min(self.bytes.len())..];
        match rest.iter().position(|&b| b == b'\n') {
            Some(i) => &rest[..i],
            None => rest,
        }
    }

    /// Consume the rest of the current line, including the newline.
    /// Returns the content before the newline.
    pub fn consume_line(&mut self) -> &'a str {
        let start = self.pos;
        let rest = self.line_remainder();
        let content = &self.text[start..start + rest.len()];
        self.advance(rest.len());
        if !self.at_eof() {
            self.advance(1); // the newline
        }
        content
    }

    /// Text between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        self.text.get(start..end).unwrap_or_default()
    }

    /// The characters between the start of `offset`'s line and `offset`.
    /// Used to decide whether consecutive line comments share indentation.
    pub fn indent_before(&self, offset: usize) -> Vec<u8> {
        let line_start = match self.bytes[..offset].iter().rposition(|&b| b == b'\n') {
            Some(i) => i + 1,
            None => 0,
        };
        self.bytes[line_start..offset].to_vec()
    }

    /// Scan forward to the next position where one of `blocks` opens.
    /// Rules are consulted in registration order; the first match wins.
    /// Returns the opened block and the position of its opening token.
    pub fn find_next_block(&mut self, blocks: &[BlockRule]) -> Option<(OpenBlock, Position)> {
        while !self.at_eof() {
            let pos = self.position();
            for rule in blocks {
                if let Some(open) = rule.begin(self) {
                    return Some((open, pos));
                }
            }
            self.advance(1);
        }
        None
    }
}

/// Scan one decoded file and collect its comment blocks.
///
/// An unterminated block reports `ErrNotFoundEndFlag` at the opening
/// position and abandons the rest of the file. Blocks whose stripped
/// content is empty are dropped.
pub fn extract_blocks(
    uri: &Uri,
    text: &str,
    lang: &Language,
    handler: &MessageHandler,
) -> Vec<RawBlock> {
    let mut lexer = Lexer::new(text);
    let mut blocks = Vec::new();

    loop {
        let (open, start) = match lexer.find_next_block(&lang.blocks) {
            Some(found) => found,
            None => break,
        };

        let yields = open.yields_block();
        let (data, found) = open.end(&mut lexer);
        if !found {
            handler.error(Error::syntax(
                uri.to_string(),
                start.line,
                MessageKey::ErrNotFoundEndFlag,
                vec![],
            ));
            break;
        }
        if !yields || data.trim().is_empty() {
            continue;
        }

        let end = lexer.position();
        blocks.push(RawBlock {
            file: uri.clone(),
            range: Range { start, end },
            raw: lexer.slice(start.offset, end.offset).to_string(),
            data,
        });
    }

    debug!("{}: {} comment block(s)", uri, blocks.len());
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang;
    use crate::message::Message;
    use std::sync::{Arc, Mutex};

    fn handler() -> (Arc<Mutex<Vec<Message>>>, MessageHandler) {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&collected);
        let h = MessageHandler::new(move |msg: &Message| sink.lock().unwrap().push(msg.clone()));
        (collected, h)
    }

    fn blocks_of(lang_name: &str, text: &str) -> Vec<RawBlock> {
        let (_, h) = handler();
        let lang = lang::get(lang_name).unwrap();
        extract_blocks(&Uri::new("test.src"), text, lang, &h)
    }

    #[test]
    fn test_match_literal_advances() {
        let mut l = Lexer::new("abc\ndef");
        assert!(l.match_literal("abc\nd"));
        assert_eq!(l.position().line, 1);
        assert_eq!(l.position().column, 1);
        assert!(!l.match_literal("xyz"));
    }

    #[test]
    fn test_line_remainder_does_not_advance() {
        let l = Lexer::new("abc\ndef");
        assert_eq!(l.line_remainder(), b"abc");
        assert_eq!(l.offset(), 0);
    }

    #[test]
    fn test_line_comments_collapse() {
        let text = "x = 1\n// first\n// second\ny = 2\n";
        let blocks = blocks_of("go", text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data, " first\n second\n");
        assert_eq!(blocks[0].range.start.line, 1);
    }

    #[test]
    fn test_blank_line_separates_line_comments() {
        let text = "// a\n\n// b\n";
        let blocks = blocks_of("go", text);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_different_indent_separates_line_comments() {
        let text = "// a\n  // b\n";
        let blocks = blocks_of("go", text);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_block_comment_stripping() {
        let text = "/* first\n * second\n */ code();\n";
        let blocks = blocks_of("go", text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data.trim(), "first\nsecond");
    }

    #[test]
    fn test_comment_marker_inside_string_ignored() {
        let text = "s := \"foo // bar\"\nx := 1\n";
        let blocks = blocks_of("go", text);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_comment_marker_inside_raw_string_ignored() {
        let text = "s := `line\n// not a comment\n`\n";
        let blocks = blocks_of("go", text);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let text = "s := \"a\\\"b\"; // real comment\n";
        let blocks = blocks_of("go", text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data.trim(), "real comment");
    }

    #[test]
    fn test_unterminated_block_comment_reports() {
        let (collected, h) = handler();
        let lang = lang::get("go").unwrap();
        let text = "x := 1\n/* never closed\n";
        let blocks = extract_blocks(&Uri::new("t.go"), text, lang, &h);
        assert!(blocks.is_empty());

        let msgs = collected.lock().unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].key, MessageKey::ErrNotFoundEndFlag);
        assert_eq!(msgs[0].line, 2);
    }

    #[test]
    fn test_raw_round_trips_to_source() {
        let text = "a()\n// one\n// two\nb()\n/* three */\n";
        let blocks = blocks_of("go", text);
        for b in &blocks {
            assert_eq!(&text[b.range.start.offset..b.range.end.offset], b.raw);
        }
    }

    #[test]
    fn test_php_heredoc_swallows_content() {
        let text = "$s = <<<EOT\n// not a comment\nEOT;\n// real\n";
        let blocks = blocks_of("php", text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data.trim(), "real");
    }

    #[test]
    fn test_php_nowdoc_swallows_content() {
        let text = "$s = <<<'EOT'\n# not a comment\nEOT\n# real\n";
        let blocks = blocks_of("php", text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data.trim(), "real");
    }

    #[test]
    fn test_empty_comment_dropped() {
        let text = "//\n/* */\n";
        let blocks = blocks_of("go", text);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_ruby_begin_mid_line_is_not_a_comment() {
        let text = "x = foo=begin_marker\n# real\n";
        let blocks = blocks_of("ruby", text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data.trim(), "real");
    }

    #[test]
    fn test_ruby_begin_block_at_line_start() {
        let text = "=begin\nnotes\n=end\n# after\n";
        let blocks = blocks_of("ruby", text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].data.trim(), "notes");
        assert_eq!(blocks[1].data.trim(), "after");
    }

    #[test]
    fn test_perl_pod_mid_line_is_not_a_comment() {
        let text = "sub f { $a=pod_name; }\n# real\n";
        let blocks = blocks_of("perl", text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data.trim(), "real");
    }

    #[test]
    fn test_perl_pod_block_at_line_start() {
        let text = "=pod\ndocs\n=cut\n# after\n";
        let blocks = blocks_of("perl", text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].data.trim(), "docs");
        assert_eq!(blocks[1].data.trim(), "after");
    }

    #[test]
    fn test_python_triple_quote_ignored() {
        let text = "s = \"\"\"\n# not a comment\n\"\"\"\n# real\n";
        let blocks = blocks_of("python", text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data.trim(), "real");
    }
}
