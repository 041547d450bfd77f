//! Typed views of the option maps accepted by the JSON functions.
//!
//! Unknown keys are ignored. A recognised key with a value of the wrong type
//! or outside its enumeration is an `UnsupportedOption` error.

use crate::error::XPath31Error;
use crate::functions::args::describe;
use crate::types::{AtomicValue, XdmFunction, XdmItem, XdmMap, XdmValue};

/// What to do with repeated member names in a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonDuplicates {
    Reject,
    UseFirst,
    UseLast,
    /// Keep every member; only meaningful for `json-to-xml`.
    Retain,
}

impl JsonDuplicates {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "reject" => Some(Self::Reject),
            "use-first" => Some(Self::UseFirst),
            "use-last" => Some(Self::UseLast),
            "retain" => Some(Self::Retain),
            _ => None,
        }
    }
}

pub struct ParseJsonOptions<N> {
    pub liberal: bool,
    pub duplicates: JsonDuplicates,
    pub escape: bool,
    pub fallback: Option<XdmFunction<N>>,
}

impl<N> Default for ParseJsonOptions<N> {
    fn default() -> Self {
        Self {
            liberal: false,
            duplicates: JsonDuplicates::UseFirst,
            escape: false,
            fallback: None,
        }
    }
}

impl<N: Clone> ParseJsonOptions<N> {
    pub fn from_map(function: &str, options: Option<&XdmMap<N>>) -> Result<Self, XPath31Error> {
        let mut parsed = Self::default();
        let Some(options) = options else {
            return Ok(parsed);
        };
        let reader = OptionReader { function, options };
        if let Some(liberal) = reader.boolean("liberal")? {
            parsed.liberal = liberal;
        }
        if let Some(escape) = reader.boolean("escape")? {
            parsed.escape = escape;
        }
        if let Some(duplicates) = reader.duplicates()? {
            if duplicates == JsonDuplicates::Retain {
                return Err(XPath31Error::unsupported_option(function, "duplicates", "retain"));
            }
            parsed.duplicates = duplicates;
        }
        parsed.fallback = reader.fallback()?;
        if parsed.escape && parsed.fallback.is_some() {
            return Err(XPath31Error::incompatible(
                function,
                "a fallback function cannot be combined with escape=true",
            ));
        }
        Ok(parsed)
    }
}

pub struct JsonToXmlOptions<N> {
    pub liberal: bool,
    pub duplicates: JsonDuplicates,
    pub validate: bool,
    pub escape: bool,
    pub fallback: Option<XdmFunction<N>>,
}

impl<N> Default for JsonToXmlOptions<N> {
    fn default() -> Self {
        Self {
            liberal: false,
            duplicates: JsonDuplicates::Retain,
            validate: false,
            escape: false,
            fallback: None,
        }
    }
}

impl<N: Clone> JsonToXmlOptions<N> {
    pub fn from_map(options: Option<&XdmMap<N>>) -> Result<Self, XPath31Error> {
        const FUNCTION: &str = "fn:json-to-xml";
        let mut parsed = Self::default();
        let Some(options) = options else {
            return Ok(parsed);
        };
        let reader = OptionReader {
            function: FUNCTION,
            options,
        };
        if let Some(liberal) = reader.boolean("liberal")? {
            parsed.liberal = liberal;
        }
        if let Some(escape) = reader.boolean("escape")? {
            parsed.escape = escape;
        }
        if let Some(validate) = reader.boolean("validate")? {
            parsed.validate = validate;
        }
        match reader.duplicates()? {
            Some(JsonDuplicates::Retain) if parsed.validate => {
                return Err(XPath31Error::incompatible(
                    FUNCTION,
                    "duplicates=retain cannot be combined with validate=true",
                ));
            }
            Some(duplicates) => parsed.duplicates = duplicates,
            None if parsed.validate => parsed.duplicates = JsonDuplicates::UseFirst,
            None => {}
        }
        parsed.fallback = reader.fallback()?;
        if parsed.escape && parsed.fallback.is_some() {
            return Err(XPath31Error::incompatible(
                FUNCTION,
                "a fallback function cannot be combined with escape=true",
            ));
        }
        Ok(parsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XmlToJsonOptions {
    pub indent: bool,
}

impl XmlToJsonOptions {
    pub fn from_map<N>(options: Option<&XdmMap<N>>) -> Result<Self, XPath31Error> {
        let mut parsed = Self::default();
        if let Some(options) = options {
            let reader = OptionReader {
                function: "fn:xml-to-json",
                options,
            };
            if let Some(indent) = reader.boolean("indent")? {
                parsed.indent = indent;
            }
        }
        Ok(parsed)
    }
}

struct OptionReader<'o, N> {
    function: &'o str,
    options: &'o XdmMap<N>,
}

impl<N> OptionReader<'_, N> {
    fn invalid(&self, name: &str, value: &XdmValue<N>) -> XPath31Error {
        XPath31Error::unsupported_option(self.function, name, describe(value))
    }

    fn boolean(&self, name: &str) -> Result<Option<bool>, XPath31Error> {
        let Some(value) = self.options.get_str(name) else {
            return Ok(None);
        };
        match value.single() {
            Some(XdmItem::Atomic(AtomicValue::Boolean(b))) => Ok(Some(*b)),
            Some(XdmItem::Atomic(AtomicValue::UntypedAtomic(s))) => match s.trim() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(self.invalid(name, value)),
            },
            _ => Err(self.invalid(name, value)),
        }
    }

    fn duplicates(&self) -> Result<Option<JsonDuplicates>, XPath31Error> {
        let Some(value) = self.options.get_str("duplicates") else {
            return Ok(None);
        };
        match value.single() {
            Some(XdmItem::Atomic(a)) => a
                .as_str()
                .and_then(JsonDuplicates::parse)
                .map(Some)
                .ok_or_else(|| self.invalid("duplicates", value)),
            _ => Err(self.invalid("duplicates", value)),
        }
    }
}

impl<N: Clone> OptionReader<'_, N> {
    fn fallback(&self) -> Result<Option<XdmFunction<N>>, XPath31Error> {
        let Some(value) = self.options.get_str("fallback") else {
            return Ok(None);
        };
        match value.single() {
            Some(XdmItem::Function(f)) if f.arity() == 1 => Ok(Some(f.clone())),
            _ => Err(self.invalid("fallback", value)),
        }
    }
}
