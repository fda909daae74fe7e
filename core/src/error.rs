use thiserror::Error;

/// Classified playback failure reported by the player binding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("Format unsupported/URL invalid.")]
    UnsupportedFormat,
    #[error("Network error.")]
    Network,
    #[error("Video decoding error (corrupted?).")]
    Decode,
    #[error("Error: {message} (Code: {})", code.map_or_else(|| "N/A".to_string(), |c| c.to_string()))]
    Unknown { message: String, code: Option<i32> },
    #[error("Unknown error.")]
    Unspecified,
}

impl PlaybackError {
    /// Classify a raw error code and message the way media elements report them:
    /// code 4 (or a MEDIA_SRC message) is a source problem, 2 is network, 3 is decode.
    pub fn classify(code: Option<i32>, message: Option<&str>) -> Self {
        let message = message.map(str::trim).filter(|m| !m.is_empty());
        match (code, message) {
            (Some(4), _) => Self::UnsupportedFormat,
            (_, Some(m)) if m.contains("MEDIA_SRC") => Self::UnsupportedFormat,
            (Some(2), _) => Self::Network,
            (Some(3), _) => Self::Decode,
            (code, Some(m)) => Self::Unknown {
                message: m.to_string(),
                code,
            },
            (_, None) => Self::Unspecified,
        }
    }
}

/// A user action (download, copy, external launch) that failed without
/// affecting playback.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("No valid link.")]
    InvalidLink,
    #[error("Unknown player type: {0}")]
    UnknownPlayer(String),
    #[error("Failed to open {0}. Try copy link.")]
    LaunchFailed(String),
    #[error("Copy failed.")]
    CopyFailed,
    #[error("Download failed: {0}")]
    DownloadFailed(String),
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Video source URL is missing or invalid: {0}")]
    SourceInvalid(String),
    #[error("{0}")]
    PlayerUnavailable(String),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = WatchError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_codes() {
        assert_eq!(PlaybackError::classify(Some(4), None), PlaybackError::UnsupportedFormat);
        assert_eq!(PlaybackError::classify(Some(2), Some("timeout")), PlaybackError::Network);
        assert_eq!(PlaybackError::classify(Some(3), None), PlaybackError::Decode);
        assert_eq!(
            PlaybackError::classify(None, Some("MEDIA_SRC_NOT_SUPPORTED")),
            PlaybackError::UnsupportedFormat
        );
    }

    #[test]
    fn test_classify_unknown_keeps_message() {
        let err = PlaybackError::classify(Some(7), Some("boom"));
        assert_eq!(err.to_string(), "Error: boom (Code: 7)");

        let err = PlaybackError::classify(None, Some("boom"));
        assert_eq!(err.to_string(), "Error: boom (Code: N/A)");

        assert_eq!(PlaybackError::classify(None, Some("  ")).to_string(), "Unknown error.");
    }
}
