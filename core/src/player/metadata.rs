use crate::format::{format_size, format_time};

/// What the player knows about the loaded media.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaFacts {
    /// Seconds; NaN while unknown.
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
}

impl MediaFacts {
    pub fn has_video(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn duration_known(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }
}

const PIXELS_4K: u64 = 3840 * 2160;
const PIXELS_1080P: u64 = 1920 * 1080;
const PIXELS_720P: u64 = 1280 * 720;

/// Rough bitrate guess in Mbps from the resolution tier.
pub fn estimate_bitrate_mbps(facts: &MediaFacts) -> f64 {
    let pixels = u64::from(facts.width) * u64::from(facts.height);
    if pixels >= PIXELS_4K {
        8.0
    } else if pixels >= PIXELS_1080P {
        4.0
    } else if pixels >= PIXELS_720P {
        2.5
    } else if pixels > 0 {
        1.5
    } else if facts.has_audio {
        0.192
    } else {
        1.0
    }
}

/// Estimated file size in bytes when the server does not report one.
pub fn estimate_size_bytes(facts: &MediaFacts) -> f64 {
    estimate_bitrate_mbps(facts) * 1e6 / 8.0 * facts.duration
}

/// The three metadata fields shown under the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataView {
    pub duration: String,
    pub resolution: String,
    pub size: String,
}

impl MetadataView {
    pub fn placeholder() -> Self {
        Self {
            duration: "Dur: ...".into(),
            resolution: "Res: ...".into(),
            size: "Size: ...".into(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            duration: "Dur: N/A".into(),
            resolution: "Res: N/A".into(),
            size: "Size: N/A".into(),
        }
    }

    pub fn from_facts(facts: &MediaFacts) -> Self {
        if !facts.duration_known() {
            return Self::unavailable();
        }

        let resolution = if facts.has_video() {
            format!("Res: {}x{}", facts.width, facts.height)
        } else if facts.has_audio {
            "Res: Audio Only".to_string()
        } else {
            "Res: N/A".to_string()
        };

        Self {
            duration: format!("Dur: {}", format_time(facts.duration, facts.duration >= 3600.0)),
            resolution,
            size: format_size(estimate_size_bytes(facts)),
        }
    }
}
