//! Filesystem provider for `file:` URIs and root-relative paths.
//!
//! Every resolved path must stay inside the provider's root directory;
//! anything that escapes it is reported as not found.

use log::debug;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use url::Url;
use xylem_traits::{ResourceError, ResourceProvider, SharedResourceData};

#[derive(Debug)]
pub struct FilesystemResourceProvider {
    root: PathBuf,
    /// `None` when the root does not exist yet.
    canonical_root: Option<PathBuf>,
}

impl FilesystemResourceProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let canonical_root = root.canonicalize().ok();
        Self {
            root,
            canonical_root,
        }
    }

    /// The root as a `file:` directory URI, suitable as a static base URI.
    pub fn base_uri(&self) -> Option<String> {
        let dir = self.canonical_root.as_ref().unwrap_or(&self.root);
        Url::from_directory_path(dir).ok().map(String::from)
    }

    /// Maps a URI or relative path to a path under the root.
    fn resolve(&self, uri: &str) -> Result<PathBuf, ResourceError> {
        let candidate = match Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| ResourceError::NotFound(uri.to_string()))?,
            Ok(_) => return Err(ResourceError::UnsupportedScheme(uri.to_string())),
            Err(_) => {
                let relative = Path::new(uri);
                if relative.is_absolute()
                    || relative
                        .components()
                        .any(|c| matches!(c, Component::ParentDir))
                {
                    return Err(ResourceError::NotFound(format!(
                        "{uri} (outside resource root)"
                    )));
                }
                self.root.join(relative)
            }
        };

        match (candidate.canonicalize(), &self.canonical_root) {
            (Ok(canonical), Some(root)) if canonical.starts_with(root) => Ok(canonical),
            (Ok(_), _) => Err(ResourceError::NotFound(format!(
                "{uri} (outside resource root)"
            ))),
            (Err(_), _) => Err(ResourceError::NotFound(uri.to_string())),
        }
    }
}

impl ResourceProvider for FilesystemResourceProvider {
    fn load(&self, uri: &str) -> Result<SharedResourceData, ResourceError> {
        let path = self.resolve(uri)?;
        debug!("Loading resource {} from {}", uri, path.display());
        std::fs::read(&path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(uri.to_string())
            } else {
                ResourceError::LoadFailed {
                    uri: uri.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "FilesystemResourceProvider"
    }
}
