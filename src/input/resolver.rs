use std::env;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config::StorageConfig;

/// Download cache directory, relative to the working directory. Remote
/// descriptors are mirrored under it by their remote-relative path.
pub const CACHE_DIR: &str = "tmp";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unreadable url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("couldn't fetch file from s3: couldn't find aws config")]
    StorageNotConfigured,
    #[error("couldn't fetch file from s3: {0}")]
    Storage(String),
    #[error("error downloading {url}: {reason}")]
    Download { url: String, reason: String },
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Where a descriptor points, decided by its prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// `s3://` followed by a bucket-relative object key.
    Storage { key: String },
    /// An `http://` or `https://` resource.
    Remote { url: String },
    /// Anything else: a path on the local filesystem.
    Local,
}

pub fn classify(descriptor: &str) -> InputKind {
    if let Some(key) = descriptor.strip_prefix("s3://") {
        InputKind::Storage {
            key: key.to_string(),
        }
    } else if descriptor.starts_with("http://") || descriptor.starts_with("https://") {
        InputKind::Remote {
            url: descriptor.to_string(),
        }
    } else {
        InputKind::Local
    }
}

/// Turns input descriptors into local file paths, downloading remote content
/// into the cache directory when it is not already present.
pub struct Resolver {
    cache_root: PathBuf,
    storage: Option<StorageConfig>,
}

impl Resolver {
    pub fn new(cache_root: impl Into<PathBuf>, storage: Option<StorageConfig>) -> Self {
        Self {
            cache_root: cache_root.into(),
            storage,
        }
    }

    /// Deterministic local path for a descriptor, independent of whether a
    /// file exists there yet.
    pub fn local_path(&self, descriptor: &str) -> Result<PathBuf, ResolveError> {
        match classify(descriptor) {
            InputKind::Storage { key } => Ok(absolutize(self.cache_root.join(key))),
            InputKind::Remote { url } => {
                let parsed = url::Url::parse(&url).map_err(|source| ResolveError::InvalidUrl {
                    url: url.clone(),
                    source,
                })?;
                let relative = parsed.path().trim_start_matches('/');
                if relative.is_empty() {
                    return Err(ResolveError::Download {
                        url,
                        reason: "url has no file path".to_string(),
                    });
                }
                Ok(absolutize(self.cache_root.join(relative)))
            }
            InputKind::Local => Ok(absolutize(PathBuf::from(descriptor))),
        }
    }

    /// Resolves a descriptor to a readable local file.
    ///
    /// `force_refresh` deletes a cached copy before checking, so remote
    /// descriptors are fetched again. A file already present at the computed
    /// path is returned without touching the network. Concurrent calls for
    /// the same unresolved descriptor may both download; the writes land on
    /// the same path and the last one wins.
    pub async fn resolve(
        &self,
        descriptor: &str,
        force_refresh: bool,
    ) -> Result<PathBuf, ResolveError> {
        let local = self.local_path(descriptor)?;

        if force_refresh && local.exists() {
            fs::remove_file(&local)?;
        }
        if local.exists() {
            return Ok(local);
        }

        match classify(descriptor) {
            InputKind::Storage { key } => {
                let config = self
                    .storage
                    .as_ref()
                    .ok_or(ResolveError::StorageNotConfigured)?;
                info!("downloading s3://{key}");
                super::s3::download(config, &key, &local).await?;
            }
            InputKind::Remote { url } => {
                info!("downloading {url}");
                super::http::download(&url, &local).await?;
            }
            InputKind::Local => return Err(ResolveError::NotFound(local)),
        }

        if local.is_file() {
            Ok(local)
        } else {
            Err(ResolveError::NotFound(local))
        }
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        env::current_dir().map(|cwd| cwd.join(&path)).unwrap_or(path)
    }
}
