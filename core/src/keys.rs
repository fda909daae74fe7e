//! Player shortcuts for the watch page.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::Config;
use crate::error::Result;
use crate::player::PlayerBackend;

/// What the surrounding page looks like when a key arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortcutContext {
    pub menu_open: bool,
    /// Focus sits on a button or menu item that owns its own keys.
    pub focus_on_control: bool,
    pub player_ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shortcut {
    TogglePlay,
    ToggleFullscreen,
    ToggleMute,
    /// Relative seek in seconds.
    Seek(f64),
    /// Relative volume change on the `0..=1` scale.
    Volume(f64),
}

/// Whether a key was consumed. `Handled` keeps the key from reaching any
/// other binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

impl KeyOutcome {
    pub fn is_handled(self) -> bool {
        self == KeyOutcome::Handled
    }
}

/// Feedback to show after a shortcut ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub text: String,
    pub duration: Duration,
}

const BLOCKING_MODIFIERS: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::META)
    .union(KeyModifiers::SUPER);

/// Map a key to a player shortcut, or `None` when the key is not ours.
pub fn dispatch(key: &KeyEvent, ctx: ShortcutContext, config: &Config) -> Option<Shortcut> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.intersects(BLOCKING_MODIFIERS) {
        return None;
    }
    if !ctx.player_ready || ctx.focus_on_control || ctx.menu_open {
        return None;
    }

    let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
        config.fine_seek_step_secs
    } else {
        config.seek_step_secs
    };

    match key.code {
        KeyCode::Char('k') | KeyCode::Char(' ') => Some(Shortcut::TogglePlay),
        KeyCode::Char('f') => Some(Shortcut::ToggleFullscreen),
        KeyCode::Char('m') => Some(Shortcut::ToggleMute),
        KeyCode::Right => Some(Shortcut::Seek(step)),
        KeyCode::Left => Some(Shortcut::Seek(-step)),
        KeyCode::Up => Some(Shortcut::Volume(config.volume_step)),
        KeyCode::Down => Some(Shortcut::Volume(-config.volume_step)),
        _ => None,
    }
}

/// Run `shortcut` against the player.
pub fn apply(shortcut: Shortcut, player: &mut dyn PlayerBackend, config: &Config) -> Result<Option<Feedback>> {
    let short = |text: String| {
        Some(Feedback {
            text,
            duration: config.short_toast(),
        })
    };

    match shortcut {
        Shortcut::TogglePlay => {
            if player.paused() {
                player.play()?;
            } else {
                player.pause()?;
            }
            Ok(None)
        }
        Shortcut::ToggleFullscreen => {
            player.set_fullscreen(!player.fullscreen())?;
            Ok(None)
        }
        Shortcut::ToggleMute => {
            let muted = !player.muted();
            player.set_muted(muted)?;
            Ok(short(if muted { "Muted" } else { "Unmuted" }.to_string()))
        }
        Shortcut::Seek(delta) => {
            let target = player.position() + delta;
            let duration = player.duration();
            let target = if duration.is_finite() { target.min(duration) } else { target };
            player.seek_to(target.max(0.0))?;
            Ok(None)
        }
        Shortcut::Volume(delta) => {
            let volume = (player.volume() + delta).clamp(0.0, 1.0);
            player.set_volume(volume)?;
            Ok(short(format!("Volume: {}%", (volume * 100.0).round() as u32)))
        }
    }
}
