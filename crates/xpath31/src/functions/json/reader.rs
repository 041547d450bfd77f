//! A JSON reader that keeps what the XDM conversions need and generic
//! parsers throw away: member order, duplicate members, the lexical form of
//! numbers and unpaired surrogate escapes.
//!
//! In liberal mode the reader also accepts single-quoted strings, unquoted
//! member names, trailing commas, a leading `+` or leading zeros in numbers,
//! `//` and `/* */` comments, raw control characters in strings, and
//! unknown escapes (which stand for the escaped character itself).

use crate::error::XPath31Error;

const MAX_DEPTH: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum JsonNode {
    Null,
    Bool(bool),
    /// The number exactly as written.
    Number(String),
    String(JsonString),
    Array(Vec<JsonNode>),
    /// Members in input order, duplicates included.
    Object(Vec<(JsonString, JsonNode)>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Text(String),
    LoneSurrogate(u16),
}

/// A decoded JSON string. Unlike `String` it can hold a `\uD800`-style
/// escape that does not form a surrogate pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonString {
    segments: Vec<Segment>,
}

/// One unit of a [`JsonString`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonChar {
    Char(char),
    LoneSurrogate(u16),
}

impl JsonString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, c: char) {
        match self.segments.last_mut() {
            Some(Segment::Text(text)) => text.push(c),
            _ => self.segments.push(Segment::Text(c.to_string())),
        }
    }

    pub fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Text(text)) => text.push_str(s),
            _ => self.segments.push(Segment::Text(s.to_string())),
        }
    }

    pub fn push_lone_surrogate(&mut self, unit: u16) {
        self.segments.push(Segment::LoneSurrogate(unit));
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The text when the string holds no unpaired surrogates.
    pub fn as_str(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Text(text)] => Some(text),
            _ => None,
        }
    }

    pub fn chars(&self) -> impl Iterator<Item = JsonChar> + '_ {
        self.segments.iter().flat_map(|segment| {
            let (text, unit) = match segment {
                Segment::Text(text) => (text.as_str(), None),
                Segment::LoneSurrogate(unit) => ("", Some(JsonChar::LoneSurrogate(*unit))),
            };
            text.chars().map(JsonChar::Char).chain(unit)
        })
    }

    /// The text with unpaired surrogates replaced by U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        self.chars()
            .map(|c| match c {
                JsonChar::Char(c) => c,
                JsonChar::LoneSurrogate(_) => char::REPLACEMENT_CHARACTER,
            })
            .collect()
    }
}

impl From<&str> for JsonString {
    fn from(s: &str) -> Self {
        let mut out = Self::new();
        out.push_str(s);
        out
    }
}

/// Reads one complete JSON text.
pub fn read_json(text: &str, liberal: bool) -> Result<JsonNode, XPath31Error> {
    let mut reader = JsonReader::new(text, liberal);
    match reader.read_document() {
        Ok(node) => Ok(node),
        Err(message) if !liberal => {
            // Prefer serde_json's wording when it rejects the text too.
            match serde_json::from_str::<serde_json::Value>(text) {
                Err(e) => Err(XPath31Error::MalformedJson(e.to_string())),
                Ok(_) => Err(XPath31Error::MalformedJson(message)),
            }
        }
        Err(message) => Err(XPath31Error::MalformedJson(message)),
    }
}

struct JsonReader<'t> {
    text: &'t str,
    data: &'t [u8],
    x: usize,
    liberal: bool,
    depth: usize,
}

type ReadResult<T> = Result<T, String>;

impl<'t> JsonReader<'t> {
    fn new(text: &'t str, liberal: bool) -> Self {
        Self {
            text,
            data: text.as_bytes(),
            x: 0,
            liberal,
            depth: 0,
        }
    }

    fn read_document(&mut self) -> ReadResult<JsonNode> {
        let node = self.read_any()?;
        self.skip_whitespace()?;
        if self.x < self.data.len() {
            return Err(self.error("trailing characters after JSON value"));
        }
        Ok(node)
    }

    fn error(&self, message: &str) -> String {
        let mut end = self.x.min(self.text.len());
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }
        let consumed = &self.text[..end];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rfind('\n')
            .map_or(consumed.chars().count(), |nl| consumed[nl + 1..].chars().count())
            + 1;
        format!("{message} at line {line} column {column}")
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    fn skip_whitespace(&mut self) -> ReadResult<()> {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.x += 1,
                b'/' if self.liberal => self.skip_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_comment(&mut self) -> ReadResult<()> {
        match self.data.get(self.x + 1) {
            Some(b'/') => {
                while let Some(b) = self.peek() {
                    self.x += 1;
                    if b == b'\n' {
                        break;
                    }
                }
                Ok(())
            }
            Some(b'*') => {
                let start = self.x;
                self.x += 2;
                while self.x + 1 < self.data.len() {
                    if &self.data[self.x..self.x + 2] == b"*/" {
                        self.x += 2;
                        return Ok(());
                    }
                    self.x += 1;
                }
                self.x = start;
                Err(self.error("unterminated comment"))
            }
            _ => Err(self.error("unexpected character '/'")),
        }
    }

    fn read_any(&mut self) -> ReadResult<JsonNode> {
        self.skip_whitespace()?;
        let Some(ch) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };
        match ch {
            b'{' => self.nested(Self::read_obj),
            b'[' => self.nested(Self::read_arr),
            b'"' => Ok(JsonNode::String(self.read_str(b'"')?)),
            b'\'' if self.liberal => Ok(JsonNode::String(self.read_str(b'\'')?)),
            b't' => self.read_literal("true", JsonNode::Bool(true)),
            b'f' => self.read_literal("false", JsonNode::Bool(false)),
            b'n' => self.read_literal("null", JsonNode::Null),
            b'-' | b'0'..=b'9' => self.read_num(),
            b'+' if self.liberal => self.read_num(),
            _ => Err(self.error(&format!(
                "unexpected character '{}'",
                self.text[self.x..].chars().next().unwrap_or('?')
            ))),
        }
    }

    fn nested(&mut self, read: fn(&mut Self) -> ReadResult<JsonNode>) -> ReadResult<JsonNode> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let node = read(self)?;
        self.depth -= 1;
        Ok(node)
    }

    fn read_literal(&mut self, word: &str, node: JsonNode) -> ReadResult<JsonNode> {
        if self.data[self.x..].starts_with(word.as_bytes()) {
            self.x += word.len();
            Ok(node)
        } else {
            Err(self.error(&format!("expected '{word}'")))
        }
    }

    fn digits(&mut self) -> usize {
        let start = self.x;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.x += 1;
        }
        self.x - start
    }

    fn read_num(&mut self) -> ReadResult<JsonNode> {
        let start = self.x;
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.x += 1;
        }
        let int_start = self.x;
        let int_digits = self.digits();
        if int_digits == 0 {
            return Err(self.error("expected digit"));
        }
        if !self.liberal && int_digits > 1 && self.data[int_start] == b'0' {
            self.x = int_start;
            return Err(self.error("leading zeros are not allowed"));
        }
        if self.peek() == Some(b'.') {
            self.x += 1;
            if self.digits() == 0 {
                return Err(self.error("expected digit after decimal point"));
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.x += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.x += 1;
            }
            if self.digits() == 0 {
                return Err(self.error("expected digit in exponent"));
            }
        }
        Ok(JsonNode::Number(self.text[start..self.x].to_string()))
    }

    fn read_hex4(&mut self) -> ReadResult<u16> {
        let hex = self
            .text
            .get(self.x..self.x + 4)
            .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("invalid \\u escape"))?;
        let unit = u16::from_str_radix(hex, 16).map_err(|_| self.error("invalid \\u escape"))?;
        self.x += 4;
        Ok(unit)
    }

    fn read_str(&mut self, quote: u8) -> ReadResult<JsonString> {
        self.x += 1;
        let mut out = JsonString::new();
        let mut run_start = self.x;
        loop {
            let Some(b) = self.peek() else {
                return Err(self.error("unterminated string"));
            };
            match b {
                _ if b == quote => {
                    out.push_str(&self.text[run_start..self.x]);
                    self.x += 1;
                    return Ok(out);
                }
                b'\\' => {
                    out.push_str(&self.text[run_start..self.x]);
                    self.x += 1;
                    self.read_escape(&mut out)?;
                    run_start = self.x;
                }
                0x00..=0x1F if !self.liberal => {
                    return Err(self.error("control character in string"));
                }
                _ => self.x += 1,
            }
        }
    }

    fn read_escape(&mut self, out: &mut JsonString) -> ReadResult<()> {
        let Some(b) = self.peek() else {
            return Err(self.error("unterminated string"));
        };
        self.x += 1;
        let c = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.read_unicode_escape(out),
            _ if self.liberal => {
                self.x -= 1;
                let c = self.text[self.x..].chars().next().unwrap_or('\\');
                self.x += c.len_utf8();
                c
            }
            _ => {
                self.x -= 1;
                return Err(self.error("invalid escape sequence"));
            }
        };
        out.push(c);
        Ok(())
    }

    fn read_unicode_escape(&mut self, out: &mut JsonString) -> ReadResult<()> {
        let unit = self.read_hex4()?;
        match unit {
            0xD800..=0xDBFF => {
                if self.data[self.x..].starts_with(b"\\u") {
                    let save = self.x;
                    self.x += 2;
                    let low = self.read_hex4()?;
                    if (0xDC00..=0xDFFF).contains(&low) {
                        let code = 0x10000
                            + ((u32::from(unit) - 0xD800) << 10)
                            + (u32::from(low) - 0xDC00);
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                        return Ok(());
                    }
                    self.x = save;
                }
                out.push_lone_surrogate(unit);
            }
            0xDC00..=0xDFFF => out.push_lone_surrogate(unit),
            _ => {
                out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER))
            }
        }
        Ok(())
    }

    fn read_name(&mut self) -> ReadResult<JsonString> {
        match self.peek() {
            Some(b'"') => self.read_str(b'"'),
            Some(b'\'') if self.liberal => self.read_str(b'\''),
            Some(b) if self.liberal && (b.is_ascii_alphabetic() || b == b'_' || b == b'$') => {
                let start = self.x;
                while self
                    .peek()
                    .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
                {
                    self.x += 1;
                }
                Ok(JsonString::from(&self.text[start..self.x]))
            }
            _ => Err(self.error("expected member name")),
        }
    }

    fn read_arr(&mut self) -> ReadResult<JsonNode> {
        self.x += 1;
        let mut items = Vec::new();
        self.skip_whitespace()?;
        if self.peek() == Some(b']') {
            self.x += 1;
            return Ok(JsonNode::Array(items));
        }
        loop {
            items.push(self.read_any()?);
            self.skip_whitespace()?;
            match self.peek() {
                Some(b',') => {
                    self.x += 1;
                    self.skip_whitespace()?;
                    if self.liberal && self.peek() == Some(b']') {
                        self.x += 1;
                        return Ok(JsonNode::Array(items));
                    }
                }
                Some(b']') => {
                    self.x += 1;
                    return Ok(JsonNode::Array(items));
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn read_obj(&mut self) -> ReadResult<JsonNode> {
        self.x += 1;
        let mut members = Vec::new();
        self.skip_whitespace()?;
        if self.peek() == Some(b'}') {
            self.x += 1;
            return Ok(JsonNode::Object(members));
        }
        loop {
            let name = self.read_name()?;
            self.skip_whitespace()?;
            if self.peek() != Some(b':') {
                return Err(self.error("expected ':'"));
            }
            self.x += 1;
            let value = self.read_any()?;
            members.push((name, value));
            self.skip_whitespace()?;
            match self.peek() {
                Some(b',') => {
                    self.x += 1;
                    self.skip_whitespace()?;
                    if self.liberal && self.peek() == Some(b'}') {
                        self.x += 1;
                        return Ok(JsonNode::Object(members));
                    }
                }
                Some(b'}') => {
                    self.x += 1;
                    return Ok(JsonNode::Object(members));
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }
}
