//! Pure player state machine: `(state, event) -> (state, effects)`.

use crate::error::PlaybackError;

use super::backend::PlayerBackend;
use super::metadata::{MediaFacts, MetadataView};

pub const STARTUP_TIMEOUT_MESSAGE: &str = "Player took too long to load. Check connection/refresh.";
pub const COMPONENT_TIMEOUT_MESSAGE: &str = "Player failed to load completely. Please refresh.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Playing,
    Buffering,
    Ended,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The session bound a source and is waiting for the player component.
    Attach,
    /// The player component is up and accepting commands.
    ComponentReady,
    /// The underlying media provider was swapped; everything known is stale.
    ProviderChange,
    CanPlay,
    LoadedMetadata,
    Waiting,
    Playing,
    Paused,
    Error(PlaybackError),
    Ended,
    /// The user asked to reload after an error.
    Retry,
    RetryFailed(String),
    StartupTimedOut,
    ComponentTimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowLoading(bool),
    ShowError(String),
    HideError,
    Metadata(MetadataView),
    StartComponentTimer,
    CancelComponentTimer,
    StartStartupTimer,
    CancelStartupTimer,
    /// Reload the source and resume playback.
    Reload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub phase: Phase,
    /// The player component is available.
    pub ready: bool,
    pub started: bool,
    pub metadata_captured: bool,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
    pub muted: bool,
    pub volume: f64,
    pub paused: bool,
    pub ended: bool,
    pub position: f64,
    pub playback_rate: f64,
    /// The binding's dimensions and audio flag are final.
    pub facts_settled: bool,
    pub autoplay: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            ready: false,
            started: false,
            metadata_captured: false,
            duration: f64::NAN,
            width: 0,
            height: 0,
            has_audio: false,
            muted: false,
            volume: 1.0,
            paused: true,
            ended: false,
            position: 0.0,
            playback_rate: 1.0,
            facts_settled: true,
            autoplay: true,
        }
    }
}

impl PlayerState {
    /// Copy the binding's current readings into the state before a transition.
    pub fn observe(&mut self, backend: &dyn PlayerBackend) {
        self.duration = backend.duration();
        self.width = backend.width();
        self.height = backend.height();
        self.has_audio = backend.has_audio();
        self.muted = backend.muted();
        self.volume = backend.volume();
        self.paused = backend.paused();
        self.ended = backend.ended();
        self.position = backend.position();
        self.playback_rate = backend.playback_rate();
        self.facts_settled = backend.facts_settled();
        self.autoplay = backend.autoplay();
    }

    pub fn facts(&self) -> MediaFacts {
        MediaFacts {
            duration: self.duration,
            width: self.width,
            height: self.height,
            has_audio: self.has_audio,
        }
    }

    fn capture_metadata(&mut self, effects: &mut Vec<Effect>) {
        if self.metadata_captured {
            return;
        }
        let facts = self.facts();
        if !facts.duration_known() {
            effects.push(Effect::Metadata(MetadataView::unavailable()));
            return;
        }
        // Shown right away, but only final once a stream is known.
        if self.facts_settled && (facts.has_video() || facts.has_audio) {
            self.metadata_captured = true;
        }
        effects.push(Effect::Metadata(MetadataView::from_facts(&facts)));
    }

    fn fail(&mut self, message: String, effects: &mut Vec<Effect>) {
        self.phase = Phase::Error;
        effects.push(Effect::ShowLoading(false));
        effects.push(Effect::ShowError(message));
        effects.push(Effect::CancelStartupTimer);
    }
}

/// Compute the next state and the visible side effects of `event`.
pub fn transition(state: &PlayerState, event: &PlayerEvent) -> (PlayerState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        PlayerEvent::Attach => {
            next.phase = Phase::Loading;
            effects.push(Effect::ShowLoading(true));
            effects.push(Effect::StartComponentTimer);
        }
        PlayerEvent::ComponentReady => {
            if !next.ready {
                next.ready = true;
                effects.push(Effect::CancelComponentTimer);
                effects.push(Effect::StartStartupTimer);
            }
        }
        PlayerEvent::ProviderChange => {
            next.started = false;
            next.metadata_captured = false;
            next.phase = Phase::Loading;
            effects.push(Effect::ShowLoading(true));
        }
        PlayerEvent::CanPlay => {
            if !next.autoplay || next.started {
                effects.push(Effect::ShowLoading(false));
            }
            effects.push(Effect::HideError);
            if next.phase == Phase::Loading || next.phase == Phase::Error {
                next.phase = Phase::Ready;
            }
            next.capture_metadata(&mut effects);
        }
        PlayerEvent::LoadedMetadata => {
            next.capture_metadata(&mut effects);
        }
        PlayerEvent::Playing => {
            next.phase = Phase::Playing;
            next.started = true;
            next.paused = false;
            next.ended = false;
            effects.push(Effect::ShowLoading(false));
            effects.push(Effect::HideError);
            next.capture_metadata(&mut effects);
            effects.push(Effect::CancelStartupTimer);
        }
        PlayerEvent::Paused => {
            next.paused = true;
            if next.phase == Phase::Buffering {
                effects.push(Effect::ShowLoading(false));
            }
            if matches!(next.phase, Phase::Playing | Phase::Buffering) {
                next.phase = Phase::Ready;
            }
        }
        PlayerEvent::Waiting => {
            if next.started && next.position > 0.0 && !next.paused && !next.ended {
                next.phase = Phase::Buffering;
                effects.push(Effect::ShowLoading(true));
            }
        }
        PlayerEvent::Error(err) => {
            next.fail(err.to_string(), &mut effects);
            effects.push(Effect::CancelComponentTimer);
        }
        PlayerEvent::Ended => {
            next.phase = Phase::Ended;
            next.ended = true;
            effects.push(Effect::ShowLoading(false));
        }
        PlayerEvent::Retry => {
            next.started = false;
            next.metadata_captured = false;
            next.ended = false;
            next.phase = Phase::Loading;
            effects.push(Effect::HideError);
            effects.push(Effect::ShowLoading(true));
            effects.push(Effect::Reload);
        }
        PlayerEvent::RetryFailed(reason) => {
            let reason = if reason.trim().is_empty() { "Could not load video." } else { reason };
            next.fail(format!("Retry failed: {}", reason), &mut effects);
        }
        PlayerEvent::StartupTimedOut => {
            if !next.started {
                next.fail(STARTUP_TIMEOUT_MESSAGE.to_string(), &mut effects);
            }
        }
        PlayerEvent::ComponentTimedOut => {
            if !next.ready {
                next.fail(COMPONENT_TIMEOUT_MESSAGE.to_string(), &mut effects);
            }
        }
    }

    (next, effects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_state() -> PlayerState {
        PlayerState {
            phase: Phase::Loading,
            ready: true,
            duration: 600.0,
            width: 1280,
            height: 720,
            has_audio: true,
            ..PlayerState::default()
        }
    }

    fn metadata_effects(effects: &[Effect]) -> usize {
        effects.iter().filter(|e| matches!(e, Effect::Metadata(_))).count()
    }

    #[test]
    fn test_attach_shows_loading_and_waits_for_component() {
        let (next, effects) = transition(&PlayerState::default(), &PlayerEvent::Attach);
        assert_eq!(next.phase, Phase::Loading);
        assert_eq!(effects, vec![Effect::ShowLoading(true), Effect::StartComponentTimer]);
    }

    #[test]
    fn test_component_ready_is_idempotent() {
        let (next, effects) = transition(&PlayerState::default(), &PlayerEvent::ComponentReady);
        assert!(next.ready);
        assert_eq!(effects, vec![Effect::CancelComponentTimer, Effect::StartStartupTimer]);

        let (_, effects) = transition(&next, &PlayerEvent::ComponentReady);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_metadata_captured_once() {
        let (state, effects) = transition(&loaded_state(), &PlayerEvent::LoadedMetadata);
        assert!(state.metadata_captured);
        assert_eq!(metadata_effects(&effects), 1);

        let (state, effects) = transition(&state, &PlayerEvent::CanPlay);
        assert_eq!(metadata_effects(&effects), 0);
        let (_, effects) = transition(&state, &PlayerEvent::Playing);
        assert_eq!(metadata_effects(&effects), 0);
    }

    #[test]
    fn test_unknown_duration_does_not_mark_captured() {
        let state = PlayerState {
            duration: f64::NAN,
            ..loaded_state()
        };
        let (state, effects) = transition(&state, &PlayerEvent::LoadedMetadata);
        assert!(!state.metadata_captured);
        assert_eq!(effects, vec![Effect::Metadata(MetadataView::unavailable())]);
    }

    #[test]
    fn test_metadata_without_streams_is_captured_again() {
        let early = PlayerState {
            width: 0,
            height: 0,
            has_audio: false,
            ..loaded_state()
        };
        let (state, effects) = transition(&early, &PlayerEvent::LoadedMetadata);
        assert!(!state.metadata_captured);
        assert!(effects.contains(&Effect::Metadata(MetadataView::from_facts(&early.facts()))));

        let later = PlayerState {
            width: 1920,
            height: 1080,
            has_audio: true,
            ..state
        };
        let (state, effects) = transition(&later, &PlayerEvent::CanPlay);
        assert!(state.metadata_captured);
        let view = effects.iter().find_map(|e| match e {
            Effect::Metadata(view) => Some(view.clone()),
            _ => None,
        });
        assert_eq!(view.map(|v| v.resolution), Some("Res: 1920x1080".to_string()));
    }

    #[test]
    fn test_unsettled_facts_are_not_final() {
        let state = PlayerState {
            facts_settled: false,
            ..loaded_state()
        };
        let (state, effects) = transition(&state, &PlayerEvent::LoadedMetadata);
        assert!(!state.metadata_captured);
        assert_eq!(metadata_effects(&effects), 1);

        let state = PlayerState {
            facts_settled: true,
            ..state
        };
        let (state, _) = transition(&state, &PlayerEvent::Playing);
        assert!(state.metadata_captured);
    }

    #[test]
    fn test_can_play_keeps_loading_while_autoplay_pending() {
        let (_, effects) = transition(&loaded_state(), &PlayerEvent::CanPlay);
        assert!(!effects.contains(&Effect::ShowLoading(false)));
        assert!(effects.contains(&Effect::HideError));

        let manual = PlayerState {
            autoplay: false,
            ..loaded_state()
        };
        let (next, effects) = transition(&manual, &PlayerEvent::CanPlay);
        assert!(effects.contains(&Effect::ShowLoading(false)));
        assert_eq!(next.phase, Phase::Ready);
    }

    #[test]
    fn test_playing_cancels_startup_timer() {
        let (next, effects) = transition(&loaded_state(), &PlayerEvent::Playing);
        assert!(next.started);
        assert_eq!(next.phase, Phase::Playing);
        assert!(effects.contains(&Effect::ShowLoading(false)));
        assert!(effects.contains(&Effect::HideError));
        assert!(effects.contains(&Effect::CancelStartupTimer));
    }

    #[test]
    fn test_waiting_before_start_is_ignored() {
        let state = PlayerState {
            position: 3.0,
            paused: false,
            ..loaded_state()
        };
        let (next, effects) = transition(&state, &PlayerEvent::Waiting);
        assert!(effects.is_empty());
        assert_eq!(next.phase, Phase::Loading);
    }

    #[test]
    fn test_waiting_while_playing_shows_loading() {
        let playing = PlayerState {
            phase: Phase::Playing,
            started: true,
            paused: false,
            position: 12.0,
            ..loaded_state()
        };
        let (next, effects) = transition(&playing, &PlayerEvent::Waiting);
        assert_eq!(next.phase, Phase::Buffering);
        assert_eq!(effects, vec![Effect::ShowLoading(true)]);

        for guard in [
            PlayerState { paused: true, ..playing.clone() },
            PlayerState { ended: true, ..playing.clone() },
            PlayerState { position: 0.0, ..playing.clone() },
        ] {
            let (_, effects) = transition(&guard, &PlayerEvent::Waiting);
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn test_error_from_any_phase() {
        let phases = [Phase::Idle, Phase::Loading, Phase::Ready, Phase::Playing, Phase::Buffering, Phase::Ended];
        for phase in phases {
            let state = PlayerState {
                phase,
                started: phase == Phase::Playing,
                ..loaded_state()
            };
            let (next, effects) = transition(&state, &PlayerEvent::Error(PlaybackError::Network));
            assert_eq!(next.phase, Phase::Error, "{phase:?}");
            assert!(effects.contains(&Effect::ShowError("Network error.".into())));
            assert!(effects.contains(&Effect::ShowLoading(false)));
            assert!(effects.contains(&Effect::CancelStartupTimer));
        }
    }

    #[test]
    fn test_pause_while_buffering_hides_loading() {
        let buffering = PlayerState {
            phase: Phase::Buffering,
            started: true,
            paused: false,
            position: 4.0,
            ..loaded_state()
        };
        let (next, effects) = transition(&buffering, &PlayerEvent::Paused);
        assert!(next.paused);
        assert_eq!(next.phase, Phase::Ready);
        assert_eq!(effects, vec![Effect::ShowLoading(false)]);
    }

    #[test]
    fn test_ended_hides_loading() {
        let (next, effects) = transition(&loaded_state(), &PlayerEvent::Ended);
        assert_eq!(next.phase, Phase::Ended);
        assert_eq!(effects, vec![Effect::ShowLoading(false)]);
    }

    #[test]
    fn test_retry_resets_flags() {
        let state = PlayerState {
            phase: Phase::Error,
            started: true,
            metadata_captured: true,
            ..loaded_state()
        };
        let (next, effects) = transition(&state, &PlayerEvent::Retry);
        assert!(!next.started);
        assert!(!next.metadata_captured);
        assert_eq!(next.phase, Phase::Loading);
        assert_eq!(effects, vec![Effect::HideError, Effect::ShowLoading(true), Effect::Reload]);

        let (next, effects) = transition(&next, &PlayerEvent::RetryFailed("socket closed".into()));
        assert_eq!(next.phase, Phase::Error);
        assert!(effects.contains(&Effect::ShowError("Retry failed: socket closed".into())));
    }

    #[test]
    fn test_timeouts_only_fire_when_relevant() {
        let started = PlayerState {
            started: true,
            ..loaded_state()
        };
        let (_, effects) = transition(&started, &PlayerEvent::StartupTimedOut);
        assert!(effects.is_empty());

        let (next, effects) = transition(&loaded_state(), &PlayerEvent::StartupTimedOut);
        assert_eq!(next.phase, Phase::Error);
        assert!(effects.contains(&Effect::ShowError(STARTUP_TIMEOUT_MESSAGE.into())));

        let (_, effects) = transition(&loaded_state(), &PlayerEvent::ComponentTimedOut);
        assert!(effects.is_empty());
        let (_, effects) = transition(&PlayerState::default(), &PlayerEvent::ComponentTimedOut);
        assert!(effects.contains(&Effect::ShowError(COMPONENT_TIMEOUT_MESSAGE.into())));
    }

    #[test]
    fn test_provider_change_resets() {
        let state = PlayerState {
            phase: Phase::Playing,
            started: true,
            metadata_captured: true,
            ..loaded_state()
        };
        let (next, effects) = transition(&state, &PlayerEvent::ProviderChange);
        assert!(!next.started && !next.metadata_captured);
        assert_eq!(effects, vec![Effect::ShowLoading(true)]);
    }
}
