//! String collations.
//!
//! A collation maps a string to a [`CollationKey`]; two strings compare by
//! their keys. The UCA collation here is an approximation of the root
//! collation: canonical decomposition, base letters compared
//! case-insensitively at the primary level, combining marks at the
//! secondary level and case at the tertiary level.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::warn;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::canonical_combining_class;

use crate::error::XPath31Error;

pub const CODEPOINT_URI: &str = "http://www.w3.org/2005/xpath-functions/collation/codepoint";
pub const HTML_ASCII_CASE_INSENSITIVE_URI: &str =
    "http://www.w3.org/2005/xpath-functions/collation/html-ascii-case-insensitive";
pub const UCA_URI: &str = "http://www.w3.org/2013/collation/UCA";

/// A comparable sort key. Keys from the same collation compare like the
/// strings they were made from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CollationKey(Vec<u32>);

impl CollationKey {
    /// A key for a collation defined outside this module.
    pub fn from_weights(weights: Vec<u32>) -> Self {
        Self(weights)
    }
}

pub trait Collation: Send + Sync + fmt::Debug {
    fn uri(&self) -> &str;

    fn key(&self, s: &str) -> CollationKey;

    fn compare(&self, a: &str, b: &str) -> Ordering {
        self.key(a).cmp(&self.key(b))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodepointCollation;

impl Collation for CodepointCollation {
    fn uri(&self) -> &str {
        CODEPOINT_URI
    }

    fn key(&self, s: &str) -> CollationKey {
        CollationKey(s.chars().map(u32::from).collect())
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

/// Codepoint order after folding ASCII letters to lower case.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlAsciiCaseInsensitiveCollation;

impl Collation for HtmlAsciiCaseInsensitiveCollation {
    fn uri(&self) -> &str {
        HTML_ASCII_CASE_INSENSITIVE_URI
    }

    fn key(&self, s: &str) -> CollationKey {
        CollationKey(s.chars().map(|c| u32::from(c.to_ascii_lowercase())).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
    Identical,
}

impl Strength {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "primary" | "1" => Some(Strength::Primary),
            "secondary" | "2" => Some(Strength::Secondary),
            "tertiary" | "3" => Some(Strength::Tertiary),
            "quaternary" | "4" => Some(Strength::Quaternary),
            "identical" | "5" => Some(Strength::Identical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFirst {
    Upper,
    Lower,
}

/// The `http://www.w3.org/2013/collation/UCA` family.
#[derive(Debug, Clone)]
pub struct UcaCollation {
    uri: String,
    strength: Strength,
    case_first: Option<CaseFirst>,
    lang: Option<String>,
}

impl UcaCollation {
    pub fn new(strength: Strength) -> Self {
        Self {
            uri: format!("{UCA_URI}?strength={}", strength_name(strength)),
            strength,
            case_first: None,
            lang: None,
        }
    }

    /// Parses a UCA collation URI. Query parameters may be separated by `;`
    /// or `&`. Unsupported parameters are an error under `fallback=no` and
    /// are otherwise ignored.
    pub fn from_uri(uri: &str) -> Result<Self, XPath31Error> {
        let query = match uri.strip_prefix(UCA_URI) {
            Some("") => "",
            Some(rest) => rest.strip_prefix('?').ok_or_else(|| {
                XPath31Error::Collation(format!("unknown collation URI: {uri}"))
            })?,
            None => {
                return Err(XPath31Error::Collation(format!(
                    "unknown collation URI: {uri}"
                )));
            }
        };

        let params: Vec<(&str, &str)> = query
            .split([';', '&'])
            .filter(|p| !p.is_empty())
            .map(|p| p.split_once('=').unwrap_or((p, "")))
            .collect();

        let fallback = match params.iter().find(|(k, _)| *k == "fallback") {
            None | Some((_, "yes")) => true,
            Some((_, "no")) => false,
            Some((_, other)) => {
                return Err(XPath31Error::unsupported_option(
                    "collation",
                    "fallback",
                    *other,
                ));
            }
        };

        let mut collation = Self {
            uri: uri.to_string(),
            strength: Strength::Tertiary,
            case_first: None,
            lang: None,
        };

        for (name, value) in params {
            match name {
                "fallback" | "version" | "normalization" => {}
                "lang" => collation.lang = Some(value.to_string()),
                "strength" => {
                    collation.strength = Strength::parse(value).ok_or_else(|| {
                        XPath31Error::unsupported_option("collation", "strength", value)
                    })?;
                }
                "caseFirst" => {
                    collation.case_first = match value {
                        "upper" => Some(CaseFirst::Upper),
                        "lower" => Some(CaseFirst::Lower),
                        "off" => None,
                        _ => {
                            return Err(XPath31Error::unsupported_option(
                                "collation",
                                "caseFirst",
                                value,
                            ));
                        }
                    };
                }
                _ if fallback => {
                    warn!("Ignoring unsupported collation parameter {name}={value} in {uri}");
                }
                _ => {
                    return Err(XPath31Error::Collation(format!(
                        "collation parameter '{name}' is not supported and fallback=no"
                    )));
                }
            }
        }
        Ok(collation)
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub fn case_first(&self) -> Option<CaseFirst> {
        self.case_first
    }
}

fn strength_name(strength: Strength) -> &'static str {
    match strength {
        Strength::Primary => "primary",
        Strength::Secondary => "secondary",
        Strength::Tertiary => "tertiary",
        Strength::Quaternary => "quaternary",
        Strength::Identical => "identical",
    }
}

// Level separator; every real weight is at least 1.
const LEVEL_SEPARATOR: u32 = 0;

impl Collation for UcaCollation {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn key(&self, s: &str) -> CollationKey {
        let decomposed: Vec<char> = s.nfd().collect();
        let mut primary = Vec::with_capacity(decomposed.len());
        let mut secondary = Vec::new();
        let mut tertiary = Vec::new();
        let (lower_weight, upper_weight) = match self.case_first {
            Some(CaseFirst::Upper) => (2, 1),
            _ => (1, 2),
        };

        for &c in &decomposed {
            if canonical_combining_class(c) != 0 {
                secondary.push(u32::from(c) + 2);
                continue;
            }
            let folded = c.to_lowercase().next().unwrap_or(c);
            primary.push(u32::from(folded) + 2);
            secondary.push(1);
            tertiary.push(if c.is_uppercase() {
                upper_weight
            } else {
                lower_weight
            });
        }

        let mut key = primary;
        if self.strength >= Strength::Secondary {
            key.push(LEVEL_SEPARATOR);
            key.extend(secondary);
        }
        if self.strength >= Strength::Tertiary {
            key.push(LEVEL_SEPARATOR);
            key.extend(tertiary);
        }
        if self.strength == Strength::Identical {
            key.push(LEVEL_SEPARATOR);
            key.extend(decomposed.iter().map(|&c| u32::from(c) + 1));
        }
        CollationKey(key)
    }
}

/// Collations known by URI, plus the default used when no URI is given.
#[derive(Debug, Clone)]
pub struct CollationRegistry {
    by_uri: HashMap<String, Arc<dyn Collation>>,
    default_uri: String,
}

impl Default for CollationRegistry {
    fn default() -> Self {
        let mut registry = Self {
            by_uri: HashMap::new(),
            default_uri: CODEPOINT_URI.to_string(),
        };
        registry.register(Arc::new(CodepointCollation));
        registry.register(Arc::new(HtmlAsciiCaseInsensitiveCollation));
        registry.register(Arc::new(UcaCollation {
            uri: UCA_URI.to_string(),
            strength: Strength::Tertiary,
            case_first: None,
            lang: None,
        }));
        registry
    }
}

impl CollationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, collation: Arc<dyn Collation>) {
        self.by_uri.insert(collation.uri().to_string(), collation);
    }

    pub fn default_uri(&self) -> &str {
        &self.default_uri
    }

    /// Makes `uri` the default collation. The URI must resolve.
    pub fn set_default(&mut self, uri: &str) -> Result<(), XPath31Error> {
        let collation = self.resolve(Some(uri))?;
        self.by_uri.entry(uri.to_string()).or_insert(collation);
        self.default_uri = uri.to_string();
        Ok(())
    }

    pub fn resolve(&self, uri: Option<&str>) -> Result<Arc<dyn Collation>, XPath31Error> {
        let uri = uri.unwrap_or(&self.default_uri);
        if let Some(c) = self.by_uri.get(uri) {
            return Ok(Arc::clone(c));
        }
        if uri.starts_with(UCA_URI) {
            return Ok(Arc::new(UcaCollation::from_uri(uri)?));
        }
        Err(XPath31Error::Collation(format!(
            "unknown collation URI: {uri}"
        )))
    }

    /// The collation used for `lang` when no collation URI is given: the one
    /// registered as `UCA?lang=<lang>`, otherwise a tertiary UCA collation.
    /// The built-in UCA collation has no language tailorings, so without a
    /// registration every language orders like the root collation.
    pub fn for_lang(&self, lang: &str) -> Arc<dyn Collation> {
        let uri = format!("{UCA_URI}?lang={lang}");
        if let Some(registered) = self.by_uri.get(&uri) {
            return Arc::clone(registered);
        }
        Arc::new(UcaCollation {
            uri,
            strength: Strength::Tertiary,
            case_first: None,
            lang: Some(lang.to_string()),
        })
    }
}
