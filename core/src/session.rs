//! The watch page: one media source, one player, and the chrome around it.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use log::{debug, info, warn};

use crate::actions::{Clipboard, DownloadRequest};
use crate::config::Config;
use crate::error::{ActionError, Result, WatchError};
use crate::format::{download_filename, title_from_url};
use crate::keys::{self, KeyOutcome, ShortcutContext};
use crate::launch::{self, OpenOutcome, Opener};
use crate::listeners::{ListenerKind, ListenerOwner, ListenerRegistry};
use crate::menu::{self, Control, Focus, MenuAction, MenuController, MenuId, MenuKey};
use crate::overlay::Overlays;
use crate::player::{Effect, MetadataView, PlayerAdapter, PlayerBackend, PlayerEvent, PlayerState, TrackKind};
use crate::source::MediaSource;
use crate::theme::Theme;
use crate::timer::{TimerKind, Timers};
use crate::toast::{Severity, Toast, Toaster};

#[cfg(test)]
mod tests;

pub const INVALID_SOURCE_MESSAGE: &str = "Video source URL is missing or invalid.";
pub const LOADING_TITLE: &str = "Loading video...";
const NO_PLAYER: &str = "Player is not available.";

/// Everything outside the session that an input may need to touch.
pub struct Ports<'a> {
    pub player: Option<&'a mut dyn PlayerBackend>,
    pub opener: &'a mut dyn Opener,
    pub clipboard: &'a mut dyn Clipboard,
}

#[derive(Debug, Clone)]
struct PendingLaunch {
    name: &'static str,
    target: String,
}

pub struct WatchSession {
    config: Config,
    source: Option<MediaSource>,
    title: Option<String>,
    metadata: MetadataView,
    overlays: Overlays,
    toaster: Toaster,
    menus: MenuController,
    listeners: ListenerRegistry,
    timers: Timers,
    adapter: PlayerAdapter,
    focus: Focus,
    theme: Theme,
    pending_launch: Option<PendingLaunch>,
    pending_download: Option<DownloadRequest>,
    disposed: bool,
}

impl WatchSession {
    /// Build the page for `page_url`. An unusable URL leaves the session
    /// without a source and the error overlay up; nothing is ever loaded.
    pub fn create(config: Config, page_url: &str, title: Option<&str>) -> Self {
        let mut overlays = Overlays::new();
        let source = match MediaSource::resolve(page_url) {
            Ok(source) => {
                info!("Source resolved: {}", source);
                Some(source)
            }
            Err(e) => {
                warn!("{}", e);
                overlays.show_error(INVALID_SOURCE_MESSAGE);
                None
            }
        };

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| source.as_ref().and_then(|s| title_from_url(s.url())));

        let mut listeners = ListenerRegistry::new();
        listeners.register(ListenerOwner::Shortcuts, ListenerKind::KeyDown);

        Self {
            toaster: Toaster::new(config.toast_duration()),
            menus: MenuController::standard(&config.speeds),
            theme: config.theme,
            config,
            source,
            title,
            metadata: MetadataView::placeholder(),
            overlays,
            listeners,
            timers: Timers::new(),
            adapter: PlayerAdapter::new(),
            focus: Focus::Page,
            pending_launch: None,
            pending_download: None,
            disposed: false,
        }
    }

    /// Start waiting for the player component. Returns the source it should load.
    pub fn attach(&mut self) -> Result<MediaSource> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| WatchError::SourceInvalid(INVALID_SOURCE_MESSAGE.to_string()))?;
        let effects = self.adapter.handle(PlayerEvent::Attach, None);
        self.apply(effects, None);
        Ok(source)
    }

    /// Tear everything down. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.menus.close_all(&mut self.listeners);
        self.listeners.clear();
        self.timers.clear();
        self.toaster.hide();
        self.pending_launch = None;
        self.pending_download = None;
        self.focus = Focus::Page;
        self.disposed = true;
        info!("Session disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Feed one event from the player binding through the state machine.
    pub fn player_event(&mut self, event: PlayerEvent, player: &mut dyn PlayerBackend) {
        if self.disposed {
            return;
        }
        let effects = self.adapter.handle(event, Some(&*player));
        self.apply(effects, Some(player));
    }

    /// The binding went away or never came up. A visible error is left in place.
    pub fn player_unavailable(&mut self, reason: &str) {
        warn!("Player unavailable: {}", reason);
        self.timers.cancel(TimerKind::ComponentWait);
        self.timers.cancel(TimerKind::Startup);
        if self.overlays.error_visible() {
            debug!("Keeping error {:?}", self.overlays.error_message());
            return;
        }
        self.overlays.show_error(reason);
    }

    /// Reload after an error. Does nothing while no error is showing.
    pub fn retry(&mut self, player: Option<&mut (dyn PlayerBackend + '_)>) {
        if self.disposed || self.source.is_none() || !self.overlays.error_visible() {
            return;
        }
        info!("Retrying playback");
        let effects = self.adapter.handle(PlayerEvent::Retry, player.as_deref());
        self.apply(effects, player);
    }

    fn apply(&mut self, effects: Vec<Effect>, mut player: Option<&mut (dyn PlayerBackend + '_)>) {
        for effect in effects {
            match effect {
                Effect::ShowLoading(show) => self.overlays.show_loading(show),
                Effect::ShowError(message) => {
                    warn!("Showing error: {}", message);
                    self.overlays.show_error(message);
                }
                Effect::HideError => self.overlays.hide_error(),
                Effect::Metadata(view) => self.metadata = view,
                Effect::StartComponentTimer => {
                    self.timers.schedule(TimerKind::ComponentWait, self.config.component_timeout())
                }
                Effect::CancelComponentTimer => {
                    self.timers.cancel(TimerKind::ComponentWait);
                }
                Effect::StartStartupTimer => self.timers.schedule(TimerKind::Startup, self.config.startup_timeout()),
                Effect::CancelStartupTimer => {
                    self.timers.cancel(TimerKind::Startup);
                }
                Effect::Reload => {
                    let reloaded = match player.as_deref_mut() {
                        Some(p) => p.load().and_then(|_| p.play()),
                        None => Err(WatchError::PlayerUnavailable(NO_PLAYER.to_string())),
                    };
                    if let Err(e) = reloaded {
                        warn!("Reload failed: {}", e);
                        let effects = self
                            .adapter
                            .handle(PlayerEvent::RetryFailed(e.to_string()), player.as_deref());
                        self.apply(effects, None);
                    }
                }
            }
        }
    }

    /// Fire every timer due at `now`.
    pub fn tick(&mut self, now: Instant, ports: &mut Ports<'_>) {
        if self.disposed {
            return;
        }
        for kind in self.timers.take_due(now) {
            debug!("Timer fired: {:?}", kind);
            match kind {
                TimerKind::ComponentWait => {
                    let effects = self.adapter.handle(PlayerEvent::ComponentTimedOut, None);
                    self.apply(effects, None);
                }
                TimerKind::Startup => {
                    let effects = self.adapter.handle(PlayerEvent::StartupTimedOut, None);
                    self.apply(effects, None);
                }
                TimerKind::ToastHide => self.toaster.hide(),
                TimerKind::LaunchFallback => {
                    if let Some(pending) = self.pending_launch.take() {
                        info!("Falling back to direct open for {}", pending.name);
                        if let Err(e) = ports.opener.navigate(&pending.target) {
                            warn!("Fallback open failed: {}", e);
                            self.notify(ActionError::LaunchFailed(pending.name.to_string()).to_string(), Severity::Error);
                        }
                    }
                }
            }
        }
    }

    /// Show a toast with the default duration.
    pub fn notify(&mut self, text: impl Into<String>, severity: Severity) {
        self.notify_for(text, severity, None);
    }

    pub fn notify_for(&mut self, text: impl Into<String>, severity: Severity, duration: Option<Duration>) {
        let shown = self.toaster.show(text, severity, duration);
        self.timers.schedule(TimerKind::ToastHide, shown);
    }

    /// Route a key press: open menu first, then player shortcuts, then the
    /// focused control. `Ignored` keys belong to the caller.
    pub fn handle_key(&mut self, key: &KeyEvent, ports: &mut Ports<'_>) -> KeyOutcome {
        if self.disposed || key.kind == KeyEventKind::Release {
            return KeyOutcome::Ignored;
        }

        if let Some(id) = self.menus.open_menu() {
            if self.listeners.is_registered(ListenerOwner::Menu(id), ListenerKind::KeyDown) {
                match self.menus.handle_key(id, key, &mut self.listeners) {
                    MenuKey::Handled(focus) => {
                        self.focus = focus;
                        return KeyOutcome::Handled;
                    }
                    MenuKey::Activated(action) => {
                        self.run_menu_action(action, ports);
                        return KeyOutcome::Handled;
                    }
                    MenuKey::Closed(focus) => {
                        self.focus = focus;
                        return KeyOutcome::Ignored;
                    }
                    MenuKey::Ignored => return KeyOutcome::Ignored,
                }
            }
        }

        if self.listeners.is_registered(ListenerOwner::Shortcuts, ListenerKind::KeyDown) {
            let ctx = ShortcutContext {
                menu_open: self.menus.open_menu().is_some(),
                focus_on_control: self.focus != Focus::Page,
                player_ready: ports.player.as_deref().is_some_and(|p| p.is_ready()),
            };
            if let Some(shortcut) = keys::dispatch(key, ctx, &self.config) {
                if let Some(player) = ports.player.as_deref_mut() {
                    match keys::apply(shortcut, player, &self.config) {
                        Ok(Some(feedback)) => self.notify_for(feedback.text, Severity::Info, Some(feedback.duration)),
                        Ok(None) => {}
                        Err(e) => warn!("Shortcut {:?} failed: {}", shortcut, e),
                    }
                }
                return KeyOutcome::Handled;
            }
        }

        if let Focus::Control(control) = self.focus {
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.activate(control, ports);
                    return KeyOutcome::Handled;
                }
                KeyCode::Esc => {
                    self.focus = Focus::Page;
                    return KeyOutcome::Handled;
                }
                _ => {}
            }
        }

        KeyOutcome::Ignored
    }

    /// Press a control, by keyboard or mouse.
    pub fn activate(&mut self, control: Control, ports: &mut Ports<'_>) {
        if self.disposed {
            return;
        }
        debug!("Control activated: {:?}", control);
        match control {
            Control::OpenIn => self.toggle_menu(MenuId::Stream),
            Control::Speed => self.toggle_menu(MenuId::Speed),
            Control::Tracks => {
                self.refresh_tracks(ports.player.as_deref());
                self.toggle_menu(MenuId::Tracks);
            }
            Control::Download => {
                self.focus = Focus::Control(control);
                self.pending_download = self.prepare_download();
            }
            Control::CopyLink => {
                self.focus = Focus::Control(control);
                self.copy_link(ports.clipboard);
            }
            Control::Theme => {
                self.focus = Focus::Control(control);
                self.toggle_theme();
            }
            Control::Retry => self.retry(ports.player.as_deref_mut()),
        }
    }

    pub fn toggle_menu(&mut self, id: MenuId) {
        if let Some(focus) = self.menus.toggle(id, &mut self.listeners) {
            self.focus = focus;
        }
    }

    /// A click landed outside the open menu.
    pub fn click_outside(&mut self) {
        let Some(id) = self.menus.open_menu() else {
            return;
        };
        if self.listeners.is_registered(ListenerOwner::Menu(id), ListenerKind::OutsideClick) {
            if let Some(focus) = self.menus.close(id, &mut self.listeners) {
                self.focus = focus;
            }
        }
    }

    /// A click on item `index` of menu `id`.
    pub fn click_menu_item(&mut self, id: MenuId, index: usize, ports: &mut Ports<'_>) {
        if let Some(focus) = self.menus.focus_item(id, index) {
            self.focus = focus;
            if let Some(action) = self.menus.focused_action(id) {
                self.run_menu_action(action, ports);
            }
        }
    }

    fn run_menu_action(&mut self, action: MenuAction, ports: &mut Ports<'_>) {
        match action {
            MenuAction::Launch(id) => self.launch(id, ports.opener),
            MenuAction::SetSpeed(rate) => self.set_speed(rate, ports.player.as_deref_mut()),
            MenuAction::Subtitle(id) => self.select_subtitle(id, ports.player.as_deref_mut()),
            MenuAction::Audio(id) => self.select_audio(id, ports.player.as_deref_mut()),
        }
    }

    /// Rebuild the tracks menu from what the player reports now.
    pub fn refresh_tracks(&mut self, player: Option<&(dyn PlayerBackend + '_)>) {
        let tracks = player.map(|p| p.tracks()).unwrap_or_default();
        debug!("{} tracks reported", tracks.len());
        self.menus.set_items(MenuId::Tracks, menu::track_items(&tracks));
    }

    pub fn select_subtitle(&mut self, id: Option<i64>, player: Option<&mut (dyn PlayerBackend + '_)>) {
        let Some(player) = player else {
            self.notify(NO_PLAYER, Severity::Warning);
            return;
        };
        let name = id.and_then(|id| {
            player
                .tracks()
                .into_iter()
                .find(|t| t.kind == TrackKind::Subtitle && t.id == id)
                .map(|t| t.name())
        });
        match player.select_subtitle(id) {
            Ok(()) => match name {
                Some(name) => self.notify(format!("Subtitles: {}", name), Severity::Info),
                None => self.notify("Subtitles off", Severity::Info),
            },
            Err(e) => {
                warn!("Subtitle change failed: {}", e);
                self.notify("Could not change subtitles.", Severity::Error);
            }
        }
        self.refresh_tracks(Some(&*player));
    }

    pub fn select_audio(&mut self, id: i64, player: Option<&mut (dyn PlayerBackend + '_)>) {
        let Some(player) = player else {
            self.notify(NO_PLAYER, Severity::Warning);
            return;
        };
        let name = player
            .tracks()
            .into_iter()
            .find(|t| t.kind == TrackKind::Audio && t.id == id)
            .map_or_else(|| format!("Audio {}", id), |t| t.name());
        match player.select_audio(id) {
            Ok(()) => self.notify(format!("Audio: {}", name), Severity::Info),
            Err(e) => {
                warn!("Audio track change failed: {}", e);
                self.notify("Could not change audio track.", Severity::Error);
            }
        }
        self.refresh_tracks(Some(&*player));
    }

    /// Move keyboard focus along the control row, wrapping through the page.
    pub fn focus_next(&mut self, forward: bool) {
        if let Some(focus) = self.menus.close_all(&mut self.listeners) {
            self.focus = focus;
        }
        let mut order: Vec<Focus> = vec![Focus::Page];
        order.extend(Control::TAB_ORDER.iter().map(|c| Focus::Control(*c)));
        if self.overlays.error_visible() && self.source.is_some() {
            order.push(Focus::Control(Control::Retry));
        }

        let current = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % order.len()
        } else {
            (current + order.len() - 1) % order.len()
        };
        self.focus = order[next];
    }

    /// Hand the source to an external player.
    pub fn launch(&mut self, player_id: &str, opener: &mut dyn Opener) {
        if let Some(focus) = self.menus.close_all(&mut self.listeners) {
            self.focus = focus;
        }

        let plan = match launch::resolve(player_id, self.source.as_ref(), self.title.as_deref()) {
            Ok(plan) => plan,
            Err(e) => {
                warn!("Launch refused: {}", e);
                self.notify(format!("Invalid URL or player type: {}", player_id), Severity::Error);
                return;
            }
        };

        let name = plan.player.name;
        info!("Opening {}: {}", name, plan.target);
        match opener.open_new(&plan.target) {
            Ok(OpenOutcome::Opened) => self.notify(format!("Attempting to launch {}...", name), Severity::Info),
            Ok(OpenOutcome::Blocked | OpenOutcome::Indeterminate) => {
                self.notify(format!("Trying to open {}...", name), Severity::Info);
                self.pending_launch = Some(PendingLaunch {
                    name,
                    target: plan.target,
                });
                self.timers.schedule(TimerKind::LaunchFallback, self.config.launch_fallback());
            }
            Err(e) => {
                warn!("Error opening external player: {}", e);
                self.notify(ActionError::LaunchFailed(name.to_string()).to_string(), Severity::Error);
            }
        }
    }

    pub fn set_speed(&mut self, rate: f64, player: Option<&mut (dyn PlayerBackend + '_)>) {
        if let Some(focus) = self.menus.close(MenuId::Speed, &mut self.listeners) {
            self.focus = focus;
        }
        let Some(player) = player else {
            self.notify(NO_PLAYER, Severity::Warning);
            return;
        };
        match player.set_playback_rate(rate) {
            Ok(()) => self.notify(format!("Playback speed: {}x", rate), Severity::Info),
            Err(e) => {
                warn!("Speed change failed: {}", e);
                self.notify("Could not change speed.", Severity::Error);
            }
        }
    }

    pub fn copy_link(&mut self, clipboard: &mut dyn Clipboard) {
        let Some(source) = &self.source else {
            self.notify(ActionError::InvalidLink.to_string(), Severity::Error);
            return;
        };
        match clipboard.set_text(source.as_str()) {
            Ok(()) => self.notify("Link copied!", Severity::Success),
            Err(e) => {
                warn!("Clipboard write failed: {}", e);
                self.notify(ActionError::CopyFailed.to_string(), Severity::Error);
            }
        }
    }

    /// Work out where the source would be saved and announce the download.
    pub fn prepare_download(&mut self) -> Option<DownloadRequest> {
        let Some(source) = &self.source else {
            self.notify("Invalid URL.", Severity::Error);
            return None;
        };
        let request = DownloadRequest {
            url: source.url().clone(),
            filename: download_filename(self.title.as_deref(), source.url()),
            dir: self.config.resolved_download_dir(),
        };
        info!("Download requested: {} -> {}", request.url, request.destination().display());
        self.notify("Download started...", Severity::Success);
        Some(request)
    }

    /// The download queued by the last Download activation, if any.
    pub fn take_download(&mut self) -> Option<DownloadRequest> {
        self.pending_download.take()
    }

    pub fn report_download(&mut self, result: std::result::Result<String, ActionError>) {
        match result {
            Ok(name) => self.notify(format!("Saved {}", name), Severity::Success),
            Err(e) => {
                warn!("{}", e);
                self.notify("Download failed.", Severity::Error);
            }
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        debug!("Theme set to {}", self.theme);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    /// Title for the header, or the loading placeholder.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(LOADING_TITLE)
    }

    pub fn metadata(&self) -> &MetadataView {
        &self.metadata
    }

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toaster.current()
    }

    pub fn menus(&self) -> &MenuController {
        &self.menus
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn player_state(&self) -> &PlayerState {
        self.adapter.state()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }
}
