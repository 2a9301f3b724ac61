use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::{BasicClient, HttpClient, fetch_bytes};

/// Resolves a resource identifier into its raw text.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch_text(&self, identifier: &str) -> Result<String>;
}

#[async_trait]
impl<T: TextSource + ?Sized> TextSource for Box<T> {
    async fn fetch_text(&self, identifier: &str) -> Result<String> {
        (**self).fetch_text(identifier).await
    }
}

/// Fetches `<base_url>/<identifier>` through an [`HttpClient`].
pub struct HttpSource<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> HttpSource<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, identifier: &str) -> String {
        join(&self.base_url, identifier)
    }
}

#[async_trait]
impl<C: HttpClient> TextSource for HttpSource<C> {
    #[tracing::instrument(skip(self))]
    async fn fetch_text(&self, identifier: &str) -> Result<String> {
        let url = self.url_for(identifier);
        let bytes = fetch_bytes(&self.client, &url)
            .await
            .with_context(|| format!("GET {url}"))?;
        debug!(bytes = bytes.len(), "Resource downloaded");
        Ok(decode_text(&bytes, &url))
    }
}

/// Reads `<root>/<identifier>` from disk.
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl TextSource for FileSource {
    #[tracing::instrument(skip(self))]
    async fn fetch_text(&self, identifier: &str) -> Result<String> {
        let path = self.root.join(identifier);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(decode_text(&bytes, &path.display().to_string()))
    }
}

/// Picks an HTTP source for `http(s)://` bases and a filesystem source otherwise.
pub fn source_for(base: &str) -> Box<dyn TextSource> {
    if base.starts_with("http://") || base.starts_with("https://") {
        Box::new(HttpSource::new(BasicClient::new(), base))
    } else {
        Box::new(FileSource::new(base))
    }
}

/// Decodes resource bytes as UTF-8, replacing invalid sequences with U+FFFD.
pub fn decode_text(bytes: &[u8], origin: &str) -> String {
    let text = String::from_utf8_lossy(bytes);
    if let std::borrow::Cow::Owned(_) = text {
        warn!(origin, "Resource is not valid UTF-8; invalid bytes replaced");
    }
    text.into_owned()
}

fn join(base: &str, identifier: &str) -> String {
    if base.is_empty() {
        return identifier.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        identifier.trim_start_matches('/')
    )
}
