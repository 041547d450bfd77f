use thiserror::Error;
use xylem_traits::ResourceError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPath31Error {
    #[error("{function}: expected {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function}: argument {position}: {message}")]
    ArgumentType {
        function: String,
        position: usize,
        message: String,
    },

    #[error("Array index {index} out of bounds (size: {size})")]
    ArrayIndexOutOfBounds { index: i64, size: usize },

    #[error("{function}: length must not be negative, got {length}")]
    NegativeLength { function: String, length: i64 },

    #[error("{function}: unsupported value for option '{option}': {value}")]
    UnsupportedOption {
        function: String,
        option: String,
        value: String,
    },

    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Duplicate key '{0}' in JSON object")]
    DuplicateKey(String),

    #[error("{function}: incompatible options: {message}")]
    IncompatibleOptions { function: String, message: String },

    #[error("Collation error: {0}")]
    Collation(String),

    #[error("Cannot retrieve '{uri}': {source}")]
    Resource {
        uri: String,
        #[source]
        source: ResourceError,
    },

    #[error("Invalid XML representation of JSON: {0}")]
    InvalidJsonXml(String),

    #[error("Cannot cast '{value}' from {from_type} to {to_type}")]
    InvalidCast {
        value: String,
        from_type: String,
        to_type: String,
    },

    #[error("{function}: expected {expected}, got {actual} items")]
    CardinalityError {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("Dynamic error: {0}")]
    DynamicError(String),
}

/// Coarse classification used by callers that map errors onto diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ArgumentType,
    ArgumentRange,
    Arity,
    UnsupportedOption,
    MalformedJson,
    DuplicateKey,
    IncompatibleOptions,
    Collation,
    Io,
    InvalidJsonXml,
    Cast,
    Cardinality,
    Dynamic,
}

impl XPath31Error {
    pub fn arity(function: impl Into<String>, expected: impl Into<String>, actual: usize) -> Self {
        Self::Arity {
            function: function.into(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn type_error(
        function: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::ArgumentType {
            function: function.into(),
            position,
            message: message.into(),
        }
    }

    pub fn unsupported_option(
        function: impl Into<String>,
        option: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::UnsupportedOption {
            function: function.into(),
            option: option.into(),
            value: value.into(),
        }
    }

    pub fn incompatible(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IncompatibleOptions {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn cardinality_error(
        function: impl Into<String>,
        expected: impl Into<String>,
        actual: usize,
    ) -> Self {
        Self::CardinalityError {
            function: function.into(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn dynamic_error(message: impl Into<String>) -> Self {
        Self::DynamicError(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Arity { .. } => ErrorKind::Arity,
            Self::ArgumentType { .. } => ErrorKind::ArgumentType,
            Self::ArrayIndexOutOfBounds { .. } | Self::NegativeLength { .. } => {
                ErrorKind::ArgumentRange
            }
            Self::UnsupportedOption { .. } => ErrorKind::UnsupportedOption,
            Self::MalformedJson(_) => ErrorKind::MalformedJson,
            Self::DuplicateKey(_) => ErrorKind::DuplicateKey,
            Self::IncompatibleOptions { .. } => ErrorKind::IncompatibleOptions,
            Self::Collation(_) => ErrorKind::Collation,
            Self::Resource { .. } => ErrorKind::Io,
            Self::InvalidJsonXml(_) => ErrorKind::InvalidJsonXml,
            Self::InvalidCast { .. } => ErrorKind::Cast,
            Self::CardinalityError { .. } => ErrorKind::Cardinality,
            Self::DynamicError(_) => ErrorKind::Dynamic,
        }
    }

    /// The W3C error code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Arity { .. } => "XPST0017",
            Self::ArgumentType { .. } | Self::CardinalityError { .. } => "XPTY0004",
            Self::ArrayIndexOutOfBounds { .. } => "FOAY0001",
            Self::NegativeLength { .. } => "FOAY0002",
            Self::UnsupportedOption { .. } | Self::IncompatibleOptions { .. } => "FOJS0005",
            Self::MalformedJson(_) => "FOJS0001",
            Self::DuplicateKey(_) => "FOJS0003",
            Self::Collation(_) => "FOCH0002",
            Self::Resource { .. } => "FOUT1170",
            Self::InvalidJsonXml(_) => "FOJS0006",
            Self::InvalidCast { .. } => "FORG0001",
            Self::DynamicError(_) => "FOER0000",
        }
    }
}
