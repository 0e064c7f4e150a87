//! Tag splitting.
//!
//! Chops a comment block's stripped content into `@tag` tokens. A line
//! whose first non-whitespace character is `@` opens a tag; following
//! lines belong to it until the next opener or the end of the block.

use crate::source::{RawBlock, Uri};

/// One `@name …` directive inside a comment block.
#[derive(Debug, Clone)]
pub struct Tag {
    /// Tag word including the `@`, lowercased.
    pub name: String,
    /// Everything between the tag word and the next opener.
    pub data: String,
    pub file: Uri,
    /// 0-indexed line of the opener in the source file.
    pub line: usize,
}

/// Split a block into its ordered tag sequence. Lines before the first
/// opener are prose and are dropped.
pub fn split_block(block: &RawBlock) -> Vec<Tag> {
    let base_line = block.range.start.line;
    let mut tags: Vec<Tag> = Vec::new();
    let mut continuation: Vec<&str> = Vec::new();

    for (index, line) in block.data.split('\n').enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('@') {
            if let Some(last) = tags.last_mut() {
                append_continuation(last, &continuation);
            }
            continuation.clear();
            let (name, rest) = match trimmed.find(char::is_whitespace) {
                Some(at) => (&trimmed[..at], trimmed[at..].trim()),
                None => (trimmed, ""),
            };
            tags.push(Tag {
                name: name.to_lowercase(),
                data: rest.to_string(),
                file: block.file.clone(),
                line: base_line + index,
            });
        } else if !tags.is_empty() {
            continuation.push(line);
        }
    }
    if let Some(last) = tags.last_mut() {
        append_continuation(last, &continuation);
    }

    for tag in &mut tags {
        tag.data = tag.data.trim_end().to_string();
    }
    tags
}

fn append_continuation(tag: &mut Tag, continuation: &[&str]) {
    if continuation.is_empty() {
        return;
    }
    let trailing = join_trimmed(continuation);
    if tag.data.is_empty() {
        tag.data = trailing;
    } else if !trailing.is_empty() {
        tag.data.push('\n');
        tag.data.push_str(&trailing);
    }
}

/// Join continuation lines with their common leading whitespace trimmed.
fn join_trimmed(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let joined: Vec<&str> = lines.iter().map(|l| strip_indent(l, indent)).collect();
    joined.join("\n").trim_end().to_string()
}

/// Drop up to `indent` leading whitespace characters.
fn strip_indent(line: &str, indent: usize) -> &str {
    let mut rest = line;
    for _ in 0..indent {
        match rest.chars().next() {
            Some(c) if c.is_whitespace() => rest = &rest[c.len_utf8()..],
            _ => break,
        }
    }
    rest
}

/// Split tag data on whitespace runs into at most `n` fields; the last
/// field captures the remainder. Fewer than `n` fields means the tag was
/// short on arguments.
pub fn split_args(data: &str, n: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(n);
    let mut rest = data.trim_start();
    while fields.len() + 1 < n && !rest.is_empty() {
        match rest.find(char::is_whitespace) {
            Some(at) => {
                fields.push(&rest[..at]);
                rest = rest[at..].trim_start();
            }
            None => {
                fields.push(rest);
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        fields.push(rest.trim_end());
    }
    fields
}

/// Tag sequence with a one-token lookahead buffer, so a sub-parser can
/// hand an unconsumed tag back to its caller.
pub struct TagStream {
    tags: std::vec::IntoIter<Tag>,
    lookahead: Option<Tag>,
}

impl TagStream {
    pub fn new(tags: Vec<Tag>) -> Self {
        TagStream {
            tags: tags.into_iter(),
            lookahead: None,
        }
    }

    pub fn next(&mut self) -> Option<Tag> {
        self.lookahead.take().or_else(|| self.tags.next())
    }

    /// Return one tag to the stream. Holds at most one token.
    pub fn push_back(&mut self, tag: Tag) {
        debug_assert!(self.lookahead.is_none());
        self.lookahead = Some(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Position, Range};

    fn block(data: &str, start_line: usize) -> RawBlock {
        RawBlock {
            file: Uri::new("test.go"),
            range: Range {
                start: Position {
                    line: start_line,
                    column: 0,
                    offset: 0,
                },
                end: Position::default(),
            },
            raw: data.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_basic_split() {
        let tags = split_block(&block("@api GET /users list\n@apiGroup users\n", 3));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "@api");
        assert_eq!(tags[0].data, "GET /users list");
        assert_eq!(tags[0].line, 3);
        assert_eq!(tags[1].name, "@apigroup");
        assert_eq!(tags[1].line, 4);
    }

    #[test]
    fn test_names_are_lowercased() {
        let tags = split_block(&block("@ApiVersion 1.0.0\n", 0));
        assert_eq!(tags[0].name, "@apiversion");
        assert_eq!(tags[0].data, "1.0.0");
    }

    #[test]
    fn test_continuation_lines_append() {
        let data = "@apiExample json\n  {\n    \"id\": 1\n  }\n@apiGroup g\n";
        let tags = split_block(&block(data, 0));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].data, "json\n{\n  \"id\": 1\n}");
    }

    #[test]
    fn test_prose_before_first_tag_dropped() {
        let tags = split_block(&block("just a note\n@api GET /x y\n", 0));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].line, 1);
    }

    #[test]
    fn test_indented_opener() {
        let tags = split_block(&block("   @api GET /x y\n", 0));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "@api");
    }

    #[test]
    fn test_split_args_remainder() {
        let fields = split_args("GET /users/{id}  get one user", 3);
        assert_eq!(fields, vec!["GET", "/users/{id}", "get one user"]);
    }

    #[test]
    fn test_split_args_too_few() {
        let fields = split_args("GET", 3);
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_split_args_exact() {
        let fields = split_args("name string default desc words here", 4);
        assert_eq!(fields, vec!["name", "string", "default", "desc words here"]);
    }

    #[test]
    fn test_stream_pushback() {
        let tags = split_block(&block("@api GET /x y\n@apiGroup g\n", 0));
        let mut stream = TagStream::new(tags);
        let first = stream.next().unwrap();
        assert_eq!(first.name, "@api");
        let second = stream.next().unwrap();
        stream.push_back(second);
        assert_eq!(stream.next().unwrap().name, "@apigroup");
        assert!(stream.next().is_none());
    }
}
