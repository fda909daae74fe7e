mod backend;
mod machine;
mod metadata;
mod tracks;

#[cfg(test)]
pub(crate) mod fake;

pub use backend::PlayerBackend;
pub use machine::{
    COMPONENT_TIMEOUT_MESSAGE, Effect, Phase, PlayerEvent, PlayerState, STARTUP_TIMEOUT_MESSAGE, transition,
};
pub use metadata::{MediaFacts, MetadataView, estimate_bitrate_mbps, estimate_size_bytes};
pub use tracks::{Track, TrackKind};

use log::debug;

/// Owns the player state and turns binding events into effects.
#[derive(Debug, Default)]
pub struct PlayerAdapter {
    state: PlayerState,
}

impl PlayerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Run one event through the state machine after refreshing the state
    /// from the binding's readings.
    pub fn handle(&mut self, event: PlayerEvent, backend: Option<&dyn PlayerBackend>) -> Vec<Effect> {
        if let Some(backend) = backend {
            self.state.observe(backend);
        }
        let (next, effects) = transition(&self.state, &event);
        if next.phase != self.state.phase {
            debug!("Player {:?} -> {:?} on {:?}", self.state.phase, next.phase, event);
        }
        self.state = next;
        effects
    }
}
