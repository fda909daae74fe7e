use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, info, warn};
use ratatui::layout::{Position, Rect};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use watchlink_core::menu::{Control, MenuId};
use watchlink_core::{PlayerBackend, Ports, WatchSession};

use crate::actions::{self, DownloadResult, SystemClipboard, SystemOpener};
use crate::mpv::{MpvPlayer, MpvUpdate};

/// Screen regions from the last draw, used to route mouse clicks.
#[derive(Debug, Default, Clone)]
pub struct HitMap {
    pub controls: Vec<(Control, Rect)>,
    /// The open dropdown, its outer area, and one row per item.
    pub menu: Option<(MenuId, Rect, Vec<Rect>)>,
}

impl HitMap {
    fn control_at(&self, pos: Position) -> Option<Control> {
        self.controls.iter().find(|(_, r)| r.contains(pos)).map(|(c, _)| *c)
    }
}

/// The system-facing half of the app: everything the session drives.
struct Bindings {
    player: Option<MpvPlayer>,
    opener: SystemOpener,
    clipboard: SystemClipboard,
}

impl Bindings {
    fn ports(&mut self) -> Ports<'_> {
        Ports {
            player: self.player.as_mut().map(|p| p as &mut dyn PlayerBackend),
            opener: &mut self.opener,
            clipboard: &mut self.clipboard,
        }
    }
}

pub struct App {
    pub session: WatchSession,
    bindings: Bindings,
    runtime: Runtime,
    downloads_tx: mpsc::UnboundedSender<DownloadResult>,
    downloads_rx: mpsc::UnboundedReceiver<DownloadResult>,
    /// Help dialog visibility
    pub show_help: bool,
    /// Whether the app should exit
    pub should_quit: bool,
    pub hit_map: HitMap,
    pub started_at: Instant,
}

impl App {
    pub fn new(session: WatchSession, runtime: Runtime) -> Self {
        let (downloads_tx, downloads_rx) = mpsc::unbounded_channel();
        Self {
            session,
            bindings: Bindings {
                player: None,
                opener: SystemOpener::default(),
                clipboard: SystemClipboard,
            },
            runtime,
            downloads_tx,
            downloads_rx,
            show_help: false,
            should_quit: false,
            hit_map: HitMap::default(),
            started_at: Instant::now(),
        }
    }

    /// Attach the session and bring up mpv on its source.
    pub fn start(&mut self) {
        let source = match self.session.attach() {
            Ok(source) => source,
            Err(e) => {
                warn!("Not starting a player: {}", e);
                return;
            }
        };

        let config = self.session.config();
        match MpvPlayer::spawn(self.runtime.handle(), &config.mpv_path, &source, config.autoplay) {
            Ok(player) => self.bindings.player = Some(player),
            Err(e) => {
                let reason = format!("Could not start player: {:#}", e);
                self.session.player_unavailable(&reason);
            }
        }
    }

    pub fn player(&self) -> Option<&MpvPlayer> {
        self.bindings.player.as_ref()
    }

    /// Pump player and download results into the session and fire due timers.
    pub fn update(&mut self) -> Result<()> {
        if let Some(player) = self.bindings.player.as_mut() {
            for update in player.poll() {
                match update {
                    MpvUpdate::Event(event) => self.session.player_event(event, player),
                    MpvUpdate::Gone(reason) => self.session.player_unavailable(&reason),
                }
            }
        }

        while let Ok(result) = self.downloads_rx.try_recv() {
            self.session.report_download(result);
        }

        self.session.tick(Instant::now(), &mut self.bindings.ports());
        Ok(())
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind == KeyEventKind::Release {
            return Ok(());
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return Ok(());
        }

        let outcome = self.session.handle_key(&key, &mut self.bindings.ports());
        if !outcome.is_handled() {
            self.handle_app_key(key);
        }
        self.start_pending_download();
        Ok(())
    }

    /// Bindings that belong to the terminal app rather than the page.
    fn handle_app_key(&mut self, key: KeyEvent) {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return;
        }
        match key.code {
            KeyCode::Tab => self.session.focus_next(true),
            KeyCode::BackTab => self.session.focus_next(false),
            KeyCode::Char('q') => {
                info!("Quit requested");
                self.should_quit = true;
            }
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('t') => self.activate(Control::Theme),
            KeyCode::Char('r') => self.activate(Control::Retry),
            KeyCode::Char('o') => self.activate(Control::OpenIn),
            KeyCode::Char('s') => self.activate(Control::Speed),
            KeyCode::Char('a') => self.activate(Control::Tracks),
            KeyCode::Char('d') => self.activate(Control::Download),
            KeyCode::Char('c') => self.activate(Control::CopyLink),
            _ => debug!("Unbound key {:?}", key.code),
        }
    }

    fn activate(&mut self, control: Control) {
        self.session.activate(control, &mut self.bindings.ports());
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<()> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(());
        }
        let pos = Position::new(mouse.column, mouse.row);

        if let Some((id, area, items)) = self.hit_map.menu.clone() {
            if area.contains(pos) {
                if let Some(index) = items.iter().position(|r| r.contains(pos)) {
                    self.session.click_menu_item(id, index, &mut self.bindings.ports());
                }
                return Ok(());
            }
            let trigger = self.session.menus().menu(id).map(|m| m.trigger);
            if trigger.is_some() && self.hit_map.control_at(pos) == trigger {
                self.session.toggle_menu(id);
                return Ok(());
            }
            self.session.click_outside();
        }

        if let Some(control) = self.hit_map.control_at(pos) {
            self.activate(control);
            self.start_pending_download();
        }
        Ok(())
    }

    fn start_pending_download(&mut self) {
        if let Some(request) = self.session.take_download() {
            actions::spawn_download(self.runtime.handle(), request, self.downloads_tx.clone());
        }
    }

    /// Dispose the session and stop mpv.
    pub fn shutdown(&mut self) {
        self.session.dispose();
        if let Some(mut player) = self.bindings.player.take() {
            self.runtime.block_on(player.stop());
        }
    }
}
