use std::fmt;

use log::debug;
use url::Url;

use crate::error::{Result, WatchError};

/// The media URL the page plays, derived once from the page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource(Url);

impl MediaSource {
    /// Derive the source from a page URL by dropping the `/watch/` segment.
    ///
    /// Only absolute http(s) URLs are accepted; everything that depends on
    /// the source is unusable otherwise.
    pub fn resolve(page_url: &str) -> Result<Self> {
        let page_url = page_url.trim();
        if page_url.is_empty() {
            return Err(WatchError::SourceInvalid("(empty)".into()));
        }

        let stripped = page_url.replacen("/watch/", "/", 1);
        let url = Url::parse(&stripped).map_err(|e| WatchError::SourceInvalid(format!("{stripped}: {e}")))?;

        match url.scheme() {
            "http" | "https" if url.has_host() => {
                debug!("Resolved media source {} from page {}", url, page_url);
                Ok(Self(url))
            }
            _ => Err(WatchError::SourceInvalid(stripped)),
        }
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
