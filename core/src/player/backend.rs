use crate::error::Result;

use super::metadata::MediaFacts;
use super::tracks::Track;

/// Capabilities the watch session needs from a concrete player binding.
///
/// Getters report the binding's latest known state and must be cheap; the
/// session reads them on every event. Commands may fail if the binding has
/// gone away.
pub trait PlayerBackend {
    /// Whether the media can currently be controlled.
    fn is_ready(&self) -> bool;
    /// Seconds, NaN while unknown.
    fn duration(&self) -> f64;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn has_audio(&self) -> bool;
    fn muted(&self) -> bool;
    /// Linear volume in `0.0..=1.0`.
    fn volume(&self) -> f64;
    fn paused(&self) -> bool;
    fn ended(&self) -> bool;
    fn position(&self) -> f64;
    fn fullscreen(&self) -> bool;
    fn playback_rate(&self) -> f64;
    /// Audio, video and subtitle tracks of the loaded media.
    fn tracks(&self) -> Vec<Track>;

    /// Whether the stream facts (dimensions, audio) are final for this media.
    /// Metadata read before that is shown but captured again later.
    fn facts_settled(&self) -> bool {
        true
    }

    /// Whether playback starts on its own once media can play.
    fn autoplay(&self) -> bool {
        true
    }

    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek_to(&mut self, secs: f64) -> Result<()>;
    fn set_volume(&mut self, volume: f64) -> Result<()>;
    fn set_muted(&mut self, muted: bool) -> Result<()>;
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()>;
    fn set_playback_rate(&mut self, rate: f64) -> Result<()>;
    /// Show subtitle track `id`, or none.
    fn select_subtitle(&mut self, id: Option<i64>) -> Result<()>;
    fn select_audio(&mut self, id: i64) -> Result<()>;
    /// Reload the current source from the start.
    fn load(&mut self) -> Result<()>;

    fn facts(&self) -> MediaFacts {
        MediaFacts {
            duration: self.duration(),
            width: self.width(),
            height: self.height(),
            has_audio: self.has_audio(),
        }
    }
}
