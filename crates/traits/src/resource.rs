//! Resolve-and-fetch contract used by document-based JSON functions.
//!
//! The XPath core never touches the filesystem or network itself. It hands an
//! absolute URI to a [`ResourceProvider`] and receives bytes back. Fetches are
//! blocking and carry no timeout; callers needing cancellation wrap the
//! provider.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to load resource '{uri}': {message}")]
    LoadFailed { uri: String, message: String },

    #[error("Resource '{uri}' is not valid UTF-8 text")]
    NotText { uri: String },

    #[error("Unsupported URI scheme in '{0}'")]
    UnsupportedScheme(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResourceError {
    fn from(err: std::io::Error) -> Self {
        ResourceError::Io(err.to_string())
    }
}

pub type SharedResourceData = Arc<Vec<u8>>;

pub trait ResourceProvider: Send + Sync + Debug {
    /// Fetches the raw bytes behind an already-resolved URI.
    fn load(&self, uri: &str) -> Result<SharedResourceData, ResourceError>;

    /// Fetches a resource as text. A leading UTF-8 byte order mark is dropped.
    fn fetch_text(&self, uri: &str) -> Result<String, ResourceError> {
        let bytes = self.load(uri)?;
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes[..]);
        String::from_utf8(body.to_vec()).map_err(|_| ResourceError::NotText {
            uri: uri.to_string(),
        })
    }

    /// Human-readable name for log lines.
    fn name(&self) -> &'static str;
}

/// Map-backed provider keyed by the exact URI string.
#[derive(Debug, Default)]
pub struct InMemoryResourceProvider {
    entries: RwLock<HashMap<String, SharedResourceData>>,
}

impl InMemoryResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert) for test setup.
    pub fn with_text(self, uri: impl Into<String>, text: &str) -> Self {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.into(), Arc::new(text.as_bytes().to_vec()));
        self
    }

    pub fn insert(&self, uri: impl Into<String>, data: Vec<u8>) -> Result<(), ResourceError> {
        let uri = uri.into();
        let mut entries = self.entries.write().map_err(|_| ResourceError::LoadFailed {
            uri: uri.clone(),
            message: "resource store lock poisoned".to_string(),
        })?;
        entries.insert(uri, Arc::new(data));
        Ok(())
    }
}

impl ResourceProvider for InMemoryResourceProvider {
    fn load(&self, uri: &str) -> Result<SharedResourceData, ResourceError> {
        let entries = self.entries.read().map_err(|_| ResourceError::LoadFailed {
            uri: uri.to_string(),
            message: "resource store lock poisoned".to_string(),
        })?;
        entries
            .get(uri)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(uri.to_string()))
    }

    fn name(&self) -> &'static str {
        "InMemoryResourceProvider"
    }
}
