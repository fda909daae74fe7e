pub mod actions;
pub mod config;
pub mod error;
pub mod format;
pub mod keys;
pub mod launch;
pub mod listeners;
pub mod menu;
pub mod overlay;
pub mod player;
pub mod session;
pub mod source;
pub mod theme;
pub mod timer;
pub mod toast;

// Re-exports
pub use actions::{Clipboard, DownloadRequest};
pub use config::Config;
pub use error::{ActionError, PlaybackError, Result, WatchError};
pub use keys::KeyOutcome;
pub use launch::{OpenOutcome, Opener};
pub use menu::{Control, Focus, MenuId};
pub use player::{PlayerBackend, PlayerEvent};
pub use session::{Ports, WatchSession};
pub use source::MediaSource;
pub use theme::Theme;
pub use toast::Severity;
