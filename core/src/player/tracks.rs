/// Kind of a selectable media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
}

/// One track the player reports for the loaded media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Player-assigned id, unique within its kind and starting at 1.
    pub id: i64,
    pub kind: TrackKind,
    pub title: Option<String>,
    pub lang: Option<String>,
    pub selected: bool,
}

impl Track {
    pub fn new(id: i64, kind: TrackKind) -> Self {
        Self {
            id,
            kind,
            title: None,
            lang: None,
            selected: false,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn lang(mut self, lang: &str) -> Self {
        self.lang = Some(lang.to_string());
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// The track's title, or a numbered fallback.
    pub fn name(&self) -> String {
        match self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => title.to_string(),
            None => match self.kind {
                TrackKind::Audio => format!("Audio {}", self.id),
                TrackKind::Video => format!("Video {}", self.id),
                TrackKind::Subtitle => format!("Track {}", self.id),
            },
        }
    }

    /// Language badge; `N/A` when the container does not say.
    pub fn badge(&self) -> &str {
        self.lang.as_deref().filter(|l| !l.is_empty()).unwrap_or("N/A")
    }
}
