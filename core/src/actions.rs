//! Page actions that leave the player alone: copying and downloading.

use std::path::PathBuf;

use url::Url;

use crate::error::ActionError;

/// Somewhere to put text for the user to paste.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ActionError>;
}

/// A download the session asked the binary to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: Url,
    pub filename: String,
    pub dir: PathBuf,
}

impl DownloadRequest {
    pub fn destination(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }

    /// Where bytes land until the transfer completes: `<filename>.part`.
    pub fn partial_path(&self) -> PathBuf {
        self.dir.join(format!("{}.part", self.filename))
    }
}
