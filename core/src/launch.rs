//! External-player targets: custom URI schemes and Android intents.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::ActionError;
use crate::source::MediaSource;

/// Characters left alone by `encodeURIComponent`-style encoding.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    /// The video URL appended to a fixed prefix such as `vlc://`.
    Prefix(&'static str),
    /// `intent:<url>#Intent;[action=..;]package=..;[S.title=..;]end`
    Intent {
        package: &'static str,
        action: Option<&'static str>,
        with_title: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalPlayer {
    pub id: &'static str,
    pub name: &'static str,
    pub shape: TargetShape,
}

pub const PLAYERS: &[ExternalPlayer] = &[
    ExternalPlayer { id: "vlc-pc", name: "VLC (PC)", shape: TargetShape::Prefix("vlc://") },
    ExternalPlayer { id: "potplayer", name: "PotPlayer", shape: TargetShape::Prefix("potplayer://") },
    ExternalPlayer { id: "mpc", name: "MPC-HC", shape: TargetShape::Prefix("mpc://") },
    ExternalPlayer { id: "kmpc", name: "KMPlayer (PC)", shape: TargetShape::Prefix("kmplayer://") },
    ExternalPlayer { id: "vlc", name: "VLC", shape: TargetShape::Prefix("vlc://") },
    ExternalPlayer {
        id: "mx",
        name: "MX Player",
        shape: TargetShape::Intent { package: "com.mxtech.videoplayer.ad", action: None, with_title: true },
    },
    ExternalPlayer {
        id: "mxpro",
        name: "MX Player Pro",
        shape: TargetShape::Intent { package: "com.mxtech.videoplayer.pro", action: None, with_title: true },
    },
    ExternalPlayer { id: "nplayer", name: "nPlayer", shape: TargetShape::Prefix("nplayer-") },
    ExternalPlayer {
        id: "splayer",
        name: "S Player",
        shape: TargetShape::Intent {
            package: "com.young.simple.player",
            action: Some("com.young.simple.player.playback_online"),
            with_title: false,
        },
    },
    ExternalPlayer {
        id: "km",
        name: "KMPlayer",
        shape: TargetShape::Intent { package: "com.kmplayer", action: None, with_title: true },
    },
];

pub fn find_player(id: &str) -> Option<&'static ExternalPlayer> {
    PLAYERS.iter().find(|p| p.id == id)
}

impl ExternalPlayer {
    /// Build the string handed to the OS protocol handler.
    pub fn target(&self, url: &str, title: Option<&str>) -> String {
        match self.shape {
            TargetShape::Prefix(prefix) => format!("{prefix}{url}"),
            TargetShape::Intent { package, action, with_title } => {
                let mut target = format!("intent:{url}#Intent;");
                if let Some(action) = action {
                    target.push_str(&format!("action={action};"));
                }
                target.push_str(&format!("package={package};"));
                if with_title {
                    let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("Video");
                    target.push_str(&format!("S.title={};", utf8_percent_encode(title, COMPONENT)));
                }
                target.push_str("end");
                target
            }
        }
    }
}

/// Result of asking the OS to open a target in a new context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// The request was refused outright.
    Blocked,
    /// No way to tell whether anything handled it.
    Indeterminate,
}

/// Hands launch targets to whatever handles custom schemes on this system.
pub trait Opener {
    fn open_new(&mut self, target: &str) -> Result<OpenOutcome, ActionError>;
    /// Open `target` in the current context; the fallback when `open_new` was not confirmed.
    fn navigate(&mut self, target: &str) -> Result<(), ActionError>;
}

/// A resolved launch, ready to hand to an [`Opener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub player: &'static ExternalPlayer,
    pub target: String,
}

/// Look up `player_id` and build its target for `source`.
pub fn resolve(player_id: &str, source: Option<&MediaSource>, title: Option<&str>) -> Result<LaunchPlan, ActionError> {
    let player = find_player(player_id).ok_or_else(|| ActionError::UnknownPlayer(player_id.to_string()))?;
    let source = source.ok_or(ActionError::InvalidLink)?;
    Ok(LaunchPlan {
        player,
        target: player.target(source.as_str(), title),
    })
}
