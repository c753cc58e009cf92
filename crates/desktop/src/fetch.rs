//! Configuration fetching
//!
//! Site configuration lives in JSON files next to the pages that use them.
//! Each builder resolves its document through up to three tiers:
//!
//! 1. an explicit, page-specific path
//! 2. `./<name>.json` next to the page
//! 3. `./config/<name>.json`, the site-wide default
//!
//! The first document that both fetches and parses wins. Failures are
//! logged and turned into `None`; nothing is thrown back at the page.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Nothing at the requested path
    #[error("not found: {0}")]
    NotFound(String),

    /// Path escapes the site root or is otherwise unusable
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Non-success HTTP status
    #[error("HTTP {status} for {path}")]
    Status { path: String, status: u16 },

    /// IO error while reading
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Body is not the expected JSON
    #[error("failed to parse JSON from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Transport error
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Something that can produce the text behind a site path
pub trait ConfigSource {
    fn fetch_text(&self, path: &str) -> Result<String, FetchError>;
}

/// Serves paths from a site directory on disk.
///
/// `./x`, `/x` and `x` all resolve to `<root>/x`. Paths that climb out of
/// the root are rejected.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let trimmed = path.split(['?', '#']).next().unwrap_or_default();
        let mut resolved = self.root.clone();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir | Component::RootDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(FetchError::InvalidPath(path.to_string()));
                }
            }
        }
        Ok(resolved)
    }
}

impl ConfigSource for FsSource {
    fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let resolved = self.resolve(path)?;
        match std::fs::read_to_string(&resolved) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound(path.to_string())),
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}

/// Serves documents held in memory, keyed by the exact path requested
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl ConfigSource for MemorySource {
    fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}

/// Fetches paths relative to a base URL over HTTP.
///
/// The base is treated as a directory: `https://host/site` serves
/// `./config/x.json` from `https://host/site/config/x.json`, and `/x`
/// from the host root.
#[cfg(feature = "http")]
pub struct HttpSource {
    base: url::Url,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(mut base: url::Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            base,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Parse a base URL given as text
    pub fn parse(base: &str) -> Result<Self, FetchError> {
        let url = url::Url::parse(base).map_err(|_| FetchError::InvalidPath(base.to_string()))?;
        Ok(Self::new(url))
    }

    pub fn base(&self) -> &url::Url {
        &self.base
    }

    /// Absolute URL a site path is fetched from
    pub fn url_for(&self, path: &str) -> Result<url::Url, FetchError> {
        self.base
            .join(path)
            .map_err(|_| FetchError::InvalidPath(path.to_string()))
    }
}

#[cfg(feature = "http")]
impl ConfigSource for HttpSource {
    fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url_for(path)?;
        tracing::debug!(%url, "fetching over HTTP");
        let response = self
            .client
            .get(url)
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }
}

/// Default location of a named config document
pub fn default_path(name: &str) -> String {
    format!("./config/{name}.json")
}

/// Tiered lookup order for a named config document
pub fn candidate_paths(explicit: Option<&str>, name: &str) -> Vec<String> {
    let mut paths = Vec::with_capacity(3);
    if let Some(explicit) = explicit {
        paths.push(explicit.to_string());
    }
    paths.push(format!("./{name}.json"));
    paths.push(default_path(name));
    paths
}

/// Loads JSON configuration documents from a [`ConfigSource`]
pub struct ConfigFetcher {
    source: Box<dyn ConfigSource>,
}

impl ConfigFetcher {
    pub fn new(source: impl ConfigSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    pub fn source(&self) -> &dyn ConfigSource {
        self.source.as_ref()
    }

    /// Fetch raw text
    pub fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        self.source.fetch_text(path)
    }

    /// Fetch and parse one document
    pub fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let text = self.source.fetch_text(path)?;
        serde_json::from_str(&text).map_err(|source| FetchError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Single-path load: failures are logged and become `None`
    pub fn load<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        tracing::info!(path, "loading config");
        match self.fetch(path) {
            Ok(doc) => {
                tracing::info!(path, "config loaded");
                Some(doc)
            }
            Err(e) => {
                tracing::error!(path, error = %e, "failed to load config");
                None
            }
        }
    }

    /// Tiered load: explicit path, then `./<name>.json`, then
    /// `./config/<name>.json`
    pub fn resolve<T: DeserializeOwned>(&self, explicit: Option<&str>, name: &str) -> Option<T> {
        let candidates = candidate_paths(explicit, name);
        let last = candidates.len() - 1;

        for (tier, path) in candidates.iter().enumerate() {
            match self.fetch(path) {
                Ok(doc) => {
                    tracing::info!(name, path = %path, tier, "config loaded");
                    return Some(doc);
                }
                Err(e) if tier == last => {
                    tracing::error!(name, path = %path, error = %e, "failed to load default config");
                }
                Err(e) => {
                    tracing::warn!(name, path = %path, error = %e, "config not usable, trying next location");
                }
            }
        }
        None
    }
}
