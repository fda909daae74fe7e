/// Visibility of the loading and error layers over the video area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlays {
    loading: bool,
    error: Option<String>,
}

const DEFAULT_ERROR: &str = "Could not load video.";

impl Overlays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_loading(&mut self, show: bool) {
        self.loading = show;
    }

    /// Show the error layer. The loading layer is always hidden underneath it.
    pub fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.error = Some(if message.trim().is_empty() {
            DEFAULT_ERROR.to_string()
        } else {
            message
        });
        self.loading = false;
    }

    pub fn hide_error(&mut self) {
        self.error = None;
    }

    pub fn loading_visible(&self) -> bool {
        self.loading
    }

    pub fn error_visible(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
