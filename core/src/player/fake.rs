use crate::error::{Result, WatchError};

use super::{PlayerBackend, Track, TrackKind};

/// In-memory binding for tests.
#[derive(Debug, Clone)]
pub struct FakePlayer {
    pub ready: bool,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
    pub muted: bool,
    pub volume: f64,
    pub paused: bool,
    pub ended: bool,
    pub position: f64,
    pub fullscreen: bool,
    pub rate: f64,
    pub tracks: Vec<Track>,
    pub settled: bool,
    pub autoplay: bool,
    pub loads: usize,
    pub fail_load: bool,
}

impl Default for FakePlayer {
    fn default() -> Self {
        Self {
            ready: true,
            duration: 600.0,
            width: 1920,
            height: 1080,
            has_audio: true,
            muted: false,
            volume: 0.5,
            paused: true,
            ended: false,
            position: 0.0,
            fullscreen: false,
            rate: 1.0,
            tracks: Vec::new(),
            settled: true,
            autoplay: true,
            loads: 0,
            fail_load: false,
        }
    }
}

impl FakePlayer {
    fn select(&mut self, kind: TrackKind, id: Option<i64>) {
        for track in self.tracks.iter_mut().filter(|t| t.kind == kind) {
            track.selected = Some(track.id) == id;
        }
    }
}

impl PlayerBackend for FakePlayer {
    fn is_ready(&self) -> bool {
        self.ready
    }
    fn duration(&self) -> f64 {
        self.duration
    }
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn has_audio(&self) -> bool {
        self.has_audio
    }
    fn muted(&self) -> bool {
        self.muted
    }
    fn volume(&self) -> f64 {
        self.volume
    }
    fn paused(&self) -> bool {
        self.paused
    }
    fn ended(&self) -> bool {
        self.ended
    }
    fn position(&self) -> f64 {
        self.position
    }
    fn fullscreen(&self) -> bool {
        self.fullscreen
    }
    fn playback_rate(&self) -> f64 {
        self.rate
    }
    fn tracks(&self) -> Vec<Track> {
        self.tracks.clone()
    }
    fn facts_settled(&self) -> bool {
        self.settled
    }
    fn autoplay(&self) -> bool {
        self.autoplay
    }

    fn play(&mut self) -> Result<()> {
        self.paused = false;
        Ok(())
    }
    fn pause(&mut self) -> Result<()> {
        self.paused = true;
        Ok(())
    }
    fn seek_to(&mut self, secs: f64) -> Result<()> {
        self.position = secs;
        Ok(())
    }
    fn set_volume(&mut self, volume: f64) -> Result<()> {
        self.volume = volume;
        Ok(())
    }
    fn set_muted(&mut self, muted: bool) -> Result<()> {
        self.muted = muted;
        Ok(())
    }
    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.fullscreen = fullscreen;
        Ok(())
    }
    fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        self.rate = rate;
        Ok(())
    }
    fn select_subtitle(&mut self, id: Option<i64>) -> Result<()> {
        self.select(TrackKind::Subtitle, id);
        Ok(())
    }
    fn select_audio(&mut self, id: i64) -> Result<()> {
        self.select(TrackKind::Audio, Some(id));
        Ok(())
    }
    fn load(&mut self) -> Result<()> {
        if self.fail_load {
            return Err(WatchError::PlayerUnavailable("player process exited".into()));
        }
        self.loads += 1;
        self.position = 0.0;
        Ok(())
    }
}
