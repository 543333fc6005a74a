//! Transports the catalog is read from.
//!
//! A source answers two questions: "what is the text at this path" for the
//! catalog document, and "does this path exist" for image probing. Web
//! sources use `GET`/`HEAD`; directory sources read the static site from
//! disk.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid location {location}: {reason}")]
    InvalidLocation { location: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Reads a text resource relative to the source root.
    async fn fetch_text(&self, path: &str) -> Result<String, SourceError>;

    /// Metadata-only existence check. `Ok(false)` means the resource is
    /// known to be absent; `Err` means the probe itself failed.
    async fn exists(&self, path: &str) -> Result<bool, SourceError>;

    fn describe(&self) -> String;
}

pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str) -> Result<Self, SourceError> {
        let mut normalized = base.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized).map_err(|err| SourceError::InvalidLocation {
            location: base.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn url_for(&self, path: &str) -> Result<Url, SourceError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| SourceError::InvalidLocation {
                location: path.to_string(),
                reason: err.to_string(),
            })
    }
}

#[async_trait]
impl AssetSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String, SourceError> {
        let url = self.url_for(path)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| SourceError::Request {
                url: url.to_string(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        response.text().await.map_err(|source| SourceError::Request {
            url: url.to_string(),
            source,
        })
    }

    async fn exists(&self, path: &str) -> Result<bool, SourceError> {
        let url = self.url_for(path)?;
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|source| SourceError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(response.status().is_success())
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AssetSource for DirSource {
    async fn fetch_text(&self, path: &str) -> Result<String, SourceError> {
        let full = self.path_for(path);
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|source| SourceError::Io {
                path: full.clone(),
                source,
            })
    }

    async fn exists(&self, path: &str) -> Result<bool, SourceError> {
        let full = self.path_for(path);
        match tokio::fs::metadata(&full).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SourceError::Io {
                path: full.clone(),
                source,
            }),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Picks a transport from a location string: `http(s)://` URLs go over the
/// network, anything else is a directory on disk.
pub fn open_source(location: &str) -> Result<Arc<dyn AssetSource>, SourceError> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(SourceError::InvalidLocation {
            location: location.to_string(),
            reason: "empty location".into(),
        });
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(Arc::new(HttpSource::new(trimmed)?))
    } else {
        Ok(Arc::new(DirSource::new(trimmed)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dir_source_reads_and_probes_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("produtos.json"), r#"{"products":[]}"#).unwrap();
        std::fs::write(dir.path().join("images/bolsa01.png"), b"png").unwrap();

        let source = DirSource::new(dir.path());
        let text = source.fetch_text("produtos.json").await.unwrap();
        assert!(text.contains("products"));
        assert!(source.exists("images/bolsa01.png").await.unwrap());
        assert!(!source.exists("images/bolsa01.jpg").await.unwrap());
        assert!(!source.exists("images").await.unwrap());
    }

    #[tokio::test]
    async fn dir_source_missing_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirSource::new(dir.path());
        let err = source.fetch_text("produtos.json").await.unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn open_source_picks_transport_by_scheme() {
        let web = open_source("https://example.com/loja").unwrap();
        assert_eq!(web.describe(), "https://example.com/loja/");
        let local = open_source("./site").unwrap();
        assert_eq!(local.describe(), "./site");
        assert!(open_source("  ").is_err());
    }

    #[test]
    fn http_source_joins_relative_paths() {
        let source = HttpSource::new("https://example.com/loja").unwrap();
        let url = source.url_for("/images/bolsa01.png").unwrap();
        assert_eq!(url.as_str(), "https://example.com/loja/images/bolsa01.png");
    }
}
