//! Rendering of decoded JSON strings as XDM strings.
//!
//! With `escape` the result keeps JSON escapes for anything that cannot or
//! should not appear literally. Without it, characters that are not valid XML
//! go through the fallback function, or become U+FFFD when there is none.

use super::reader::{JsonChar, JsonString};
use crate::context::EvaluationContext;
use crate::error::XPath31Error;
use crate::functions::hof::invoke_function;
use crate::types::{XdmFunction, XdmValue};
use xylem_datasource::DataSourceNode;

pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
        || c >= '\u{10000}'
}

/// A rendered string and whether it still carries backslash escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rendered {
    pub text: String,
    pub escaped: bool,
}

pub(crate) struct StringRenderer<'r, 'c, N> {
    pub escape: bool,
    pub fallback: Option<&'r XdmFunction<N>>,
    pub ctx: &'r EvaluationContext<'c, N>,
}

impl<'a, N: DataSourceNode<'a>> StringRenderer<'_, '_, N> {
    pub fn render(&self, value: &JsonString) -> Result<Rendered, XPath31Error> {
        if self.escape {
            return Ok(escape_string(value));
        }
        if let Some(text) = value.as_str().filter(|t| t.chars().all(is_xml_char)) {
            return Ok(Rendered {
                text: text.to_string(),
                escaped: false,
            });
        }
        let mut text = String::new();
        for c in value.chars() {
            match c {
                JsonChar::Char(c) if is_xml_char(c) => text.push(c),
                JsonChar::Char(c) => text.push_str(&self.replace(c as u32)?),
                JsonChar::LoneSurrogate(unit) => text.push_str(&self.replace(u32::from(unit))?),
            }
        }
        Ok(Rendered {
            text,
            escaped: false,
        })
    }

    fn replace(&self, code: u32) -> Result<String, XPath31Error> {
        let Some(fallback) = self.fallback else {
            return Ok(char::REPLACEMENT_CHARACTER.to_string());
        };
        let arg = XdmValue::from_string(format!("\\u{code:04X}"));
        let result = invoke_function(fallback, vec![arg], self.ctx)?;
        Ok(result
            .atomize()
            .iter()
            .map(|a| a.to_string_value())
            .collect())
    }
}

/// JSON-escapes backslashes, control characters, non-XML characters and
/// unpaired surrogates.
pub(crate) fn escape_string(value: &JsonString) -> Rendered {
    let mut text = String::new();
    let mut escaped = false;
    for c in value.chars() {
        let code = match c {
            JsonChar::Char('\\') => {
                text.push_str("\\\\");
                escaped = true;
                continue;
            }
            JsonChar::Char(c) => {
                let short = match c {
                    '\u{8}' => Some("\\b"),
                    '\u{C}' => Some("\\f"),
                    '\n' => Some("\\n"),
                    '\r' => Some("\\r"),
                    '\t' => Some("\\t"),
                    _ => None,
                };
                if let Some(short) = short {
                    text.push_str(short);
                    escaped = true;
                    continue;
                }
                if !needs_hex_escape(c) {
                    text.push(c);
                    continue;
                }
                c as u32
            }
            JsonChar::LoneSurrogate(unit) => u32::from(unit),
        };
        text.push_str(&format!("\\u{code:04X}"));
        escaped = true;
    }
    Rendered { text, escaped }
}

fn needs_hex_escape(c: char) -> bool {
    c <= '\u{1F}' || ('\u{7F}'..='\u{9F}').contains(&c) || !is_xml_char(c)
}

/// Reverses [`escape_string`] for `escaped="true"` content. Any JSON escape is
/// accepted; an escape that does not parse is an error.
pub(crate) fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let high = read_hex4(&mut chars)?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    let mut lookahead = chars.clone();
                    match (lookahead.next(), lookahead.next()) {
                        (Some('\\'), Some('u')) => {
                            let low = read_hex4(&mut lookahead)?;
                            if (0xDC00..0xE000).contains(&low) {
                                chars = lookahead;
                                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                            } else {
                                return Err(format!("unpaired surrogate \\u{high:04X}"));
                            }
                        }
                        _ => return Err(format!("unpaired surrogate \\u{high:04X}")),
                    }
                } else {
                    high
                };
                let c = char::from_u32(code)
                    .ok_or_else(|| format!("invalid escape \\u{code:04X}"))?;
                out.push(c);
            }
            Some(other) => return Err(format!("invalid escape '\\{other}'")),
            None => return Err("dangling backslash".to_string()),
        }
    }
    Ok(out)
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Result<u32, String> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 {
        return Err("truncated \\u escape".to_string());
    }
    u32::from_str_radix(&digits, 16).map_err(|_| format!("invalid \\u escape '{digits}'"))
}
