//! Dropdown menus with roving focus.

use crossterm::event::{KeyCode, KeyEvent};
use log::debug;

use crate::launch::PLAYERS;
use crate::listeners::{ListenerKind, ListenerOwner, ListenerRegistry};
use crate::player::{Track, TrackKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuId {
    /// "Open in" external players.
    Stream,
    /// Playback speed.
    Speed,
    /// Subtitle and audio track selection, filled from the player.
    Tracks,
}

/// Focusable controls on the page, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    OpenIn,
    Speed,
    Tracks,
    Download,
    CopyLink,
    Theme,
    Retry,
}

impl Control {
    pub const TAB_ORDER: [Control; 6] = [
        Control::OpenIn,
        Control::Speed,
        Control::Tracks,
        Control::Download,
        Control::CopyLink,
        Control::Theme,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::OpenIn => "Open in",
            Control::Speed => "Speed",
            Control::Tracks => "Tracks",
            Control::Download => "Download",
            Control::CopyLink => "Copy link",
            Control::Theme => "Theme",
            Control::Retry => "Retry",
        }
    }
}

/// Where keyboard focus currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The video area; shortcuts are live.
    #[default]
    Page,
    Control(Control),
    MenuItem(MenuId, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    Launch(&'static str),
    SetSpeed(f64),
    /// Show subtitle track `id`; `None` turns subtitles off.
    Subtitle(Option<i64>),
    Audio(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub action: MenuAction,
    /// Marks the option currently in effect.
    pub selected: bool,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            action,
            selected: false,
        }
    }

    fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

/// Items for the tracks menu. Subtitles come first with an Off entry; audio
/// tracks are listed only when there is a choice to make.
pub fn track_items(tracks: &[Track]) -> Vec<MenuItem> {
    let mut items = Vec::new();

    let subtitles: Vec<&Track> = tracks.iter().filter(|t| t.kind == TrackKind::Subtitle).collect();
    if !subtitles.is_empty() {
        let none_selected = !subtitles.iter().any(|t| t.selected);
        items.push(MenuItem::new("Subtitles: Off", MenuAction::Subtitle(None)).selected(none_selected));
        items.extend(subtitles.iter().map(|t| {
            MenuItem::new(format!("Sub: {} [{}]", t.name(), t.badge()), MenuAction::Subtitle(Some(t.id)))
                .selected(t.selected)
        }));
    }

    let audio: Vec<&Track> = tracks.iter().filter(|t| t.kind == TrackKind::Audio).collect();
    if audio.len() > 1 {
        items.extend(audio.iter().map(|t| {
            MenuItem::new(format!("Audio: {} [{}]", t.name(), t.badge()), MenuAction::Audio(t.id)).selected(t.selected)
        }));
    }

    items
}

#[derive(Debug, Clone)]
pub struct Menu {
    pub id: MenuId,
    pub trigger: Control,
    pub items: Vec<MenuItem>,
    open: bool,
    focus: usize,
}

impl Menu {
    pub fn new(id: MenuId, trigger: Control, items: Vec<MenuItem>) -> Self {
        Self {
            id,
            trigger,
            items,
            open: false,
            focus: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }
}

/// What a key press did while a menu was open.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuKey {
    /// Consumed; the new focus is reported.
    Handled(Focus),
    /// The focused item was chosen. The menu is still open.
    Activated(MenuAction),
    /// The menu closed but the key should keep its default meaning (Tab).
    Closed(Focus),
    Ignored,
}

/// All dropdowns on the page. At most one is open at a time.
#[derive(Debug)]
pub struct MenuController {
    menus: Vec<Menu>,
}

impl MenuController {
    pub fn new(menus: Vec<Menu>) -> Self {
        Self { menus }
    }

    /// The standard page menus: external players and the given speeds.
    pub fn standard(speeds: &[f64]) -> Self {
        let players = PLAYERS
            .iter()
            .map(|p| MenuItem::new(p.name, MenuAction::Launch(p.id)))
            .collect();
        let speeds = speeds
            .iter()
            .map(|s| MenuItem::new(format!("{s}x"), MenuAction::SetSpeed(*s)))
            .collect();

        Self::new(vec![
            Menu::new(MenuId::Stream, Control::OpenIn, players),
            Menu::new(MenuId::Speed, Control::Speed, speeds),
            Menu::new(MenuId::Tracks, Control::Tracks, Vec::new()),
        ])
    }

    pub fn menu(&self, id: MenuId) -> Option<&Menu> {
        self.menus.iter().find(|m| m.id == id)
    }

    fn menu_mut(&mut self, id: MenuId) -> Option<&mut Menu> {
        self.menus.iter_mut().find(|m| m.id == id)
    }

    pub fn open_menu(&self) -> Option<MenuId> {
        self.menus.iter().find(|m| m.open).map(|m| m.id)
    }

    pub fn is_open(&self, id: MenuId) -> bool {
        self.menu(id).is_some_and(Menu::is_open)
    }

    /// Open `id`, closing any other menu first. Returns the new focus.
    pub fn open(&mut self, id: MenuId, listeners: &mut ListenerRegistry) -> Option<Focus> {
        if self.is_open(id) {
            return self.menu(id).map(|m| Focus::MenuItem(id, m.focus));
        }
        if let Some(other) = self.open_menu() {
            self.close(other, listeners);
        }

        let menu = self.menu_mut(id)?;
        menu.open = true;
        menu.focus = 0;
        let owner = ListenerOwner::Menu(id);
        listeners.register(owner, ListenerKind::OutsideClick);
        listeners.register(owner, ListenerKind::KeyDown);
        debug!("Menu {:?} opened", id);

        if menu.items.is_empty() {
            Some(Focus::Control(menu.trigger))
        } else {
            Some(Focus::MenuItem(id, 0))
        }
    }

    /// Close `id` if open. Returns focus to its trigger.
    pub fn close(&mut self, id: MenuId, listeners: &mut ListenerRegistry) -> Option<Focus> {
        let menu = self.menu_mut(id)?;
        if !menu.open {
            return None;
        }
        menu.open = false;
        let owner = ListenerOwner::Menu(id);
        listeners.unregister(owner, ListenerKind::OutsideClick);
        listeners.unregister(owner, ListenerKind::KeyDown);
        debug!("Menu {:?} closed", id);
        Some(Focus::Control(menu.trigger))
    }

    pub fn toggle(&mut self, id: MenuId, listeners: &mut ListenerRegistry) -> Option<Focus> {
        if self.is_open(id) {
            self.close(id, listeners)
        } else {
            self.open(id, listeners)
        }
    }

    /// Replace the items of `id`, keeping focus on a valid row.
    pub fn set_items(&mut self, id: MenuId, items: Vec<MenuItem>) {
        if let Some(menu) = self.menu_mut(id) {
            menu.focus = menu.focus.min(items.len().saturating_sub(1));
            menu.items = items;
        }
    }

    pub fn close_all(&mut self, listeners: &mut ListenerRegistry) -> Option<Focus> {
        self.open_menu().and_then(|id| self.close(id, listeners))
    }

    /// Move focus to item `index` of an open menu.
    pub fn focus_item(&mut self, id: MenuId, index: usize) -> Option<Focus> {
        let menu = self.menu_mut(id)?;
        if !menu.open || index >= menu.items.len() {
            return None;
        }
        menu.focus = index;
        Some(Focus::MenuItem(id, index))
    }

    pub fn focused_action(&self, id: MenuId) -> Option<MenuAction> {
        let menu = self.menu(id)?;
        menu.items.get(menu.focus).map(|item| item.action.clone())
    }

    /// Key navigation for the open menu `id`.
    pub fn handle_key(&mut self, id: MenuId, key: &KeyEvent, listeners: &mut ListenerRegistry) -> MenuKey {
        let Some(menu) = self.menu_mut(id) else {
            return MenuKey::Ignored;
        };
        if !menu.open {
            return MenuKey::Ignored;
        }

        let len = menu.items.len();
        if key.code == KeyCode::Esc {
            return self.close(id, listeners).map_or(MenuKey::Ignored, MenuKey::Handled);
        }
        if matches!(key.code, KeyCode::Tab | KeyCode::BackTab) {
            return self.close(id, listeners).map_or(MenuKey::Ignored, MenuKey::Closed);
        }
        if len == 0 {
            return MenuKey::Ignored;
        }

        let focus = match key.code {
            KeyCode::Down => (menu.focus + 1) % len,
            KeyCode::Up => (menu.focus + len - 1) % len,
            KeyCode::Home => 0,
            KeyCode::End => len - 1,
            KeyCode::Enter | KeyCode::Char(' ') => {
                return menu
                    .items
                    .get(menu.focus)
                    .map_or(MenuKey::Ignored, |item| MenuKey::Activated(item.action.clone()));
            }
            _ => return MenuKey::Ignored,
        };
        menu.focus = focus;
        MenuKey::Handled(Focus::MenuItem(id, focus))
    }
}
