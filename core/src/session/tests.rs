use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::*;
use crate::actions::testing::MemoryClipboard;
use crate::error::PlaybackError;
use crate::player::fake::FakePlayer;
use crate::player::{Track, TrackKind};

const PAGE: &str = "https://cdn.example.com/watch/movies/Big%20Buck%20Bunny.mkv";

#[derive(Debug, Default)]
struct RecordingOpener {
    outcome: Option<OpenOutcome>,
    opened: Vec<String>,
    navigated: Vec<String>,
}

impl RecordingOpener {
    fn answering(outcome: OpenOutcome) -> Self {
        Self {
            outcome: Some(outcome),
            ..Self::default()
        }
    }
}

impl Opener for RecordingOpener {
    fn open_new(&mut self, target: &str) -> std::result::Result<OpenOutcome, ActionError> {
        self.opened.push(target.to_string());
        self.outcome.ok_or_else(|| ActionError::LaunchFailed("test".into()))
    }

    fn navigate(&mut self, target: &str) -> std::result::Result<(), ActionError> {
        self.navigated.push(target.to_string());
        Ok(())
    }
}

struct Rig {
    player: FakePlayer,
    opener: RecordingOpener,
    clipboard: MemoryClipboard,
}

impl Rig {
    fn new() -> Self {
        Self {
            player: FakePlayer::default(),
            opener: RecordingOpener::answering(OpenOutcome::Opened),
            clipboard: MemoryClipboard::default(),
        }
    }

    fn ports(&mut self) -> Ports<'_> {
        Ports {
            player: Some(&mut self.player),
            opener: &mut self.opener,
            clipboard: &mut self.clipboard,
        }
    }
}

fn session() -> WatchSession {
    WatchSession::create(Config::default(), PAGE, None)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn toast_text(session: &WatchSession) -> Option<&str> {
    session.toast().map(|t| t.text.as_str())
}

fn menu_listeners(session: &WatchSession, id: MenuId) -> (usize, usize) {
    let owner = ListenerOwner::Menu(id);
    (
        session.listeners().count(owner, ListenerKind::OutsideClick),
        session.listeners().count(owner, ListenerKind::KeyDown),
    )
}

#[test]
fn test_create_derives_source_and_title() {
    let session = session();
    assert_eq!(
        session.source().map(MediaSource::as_str),
        Some("https://cdn.example.com/movies/Big%20Buck%20Bunny.mkv")
    );
    assert_eq!(session.display_title(), "Big Buck Bunny.mkv");
    assert_eq!(session.metadata(), &MetadataView::placeholder());
    assert!(
        session
            .listeners()
            .is_registered(ListenerOwner::Shortcuts, ListenerKind::KeyDown)
    );
}

#[test]
fn test_invalid_source_never_attaches() {
    let mut session = WatchSession::create(Config::default(), "ftp://host/watch/x.mp4", None);
    assert_eq!(session.overlays().error_message(), Some(INVALID_SOURCE_MESSAGE));
    assert_eq!(session.display_title(), LOADING_TITLE);
    assert!(matches!(session.attach(), Err(WatchError::SourceInvalid(_))));
    assert!(!session.timers().is_pending(TimerKind::ComponentWait));
}

#[test]
fn test_startup_flow() {
    let mut rig = Rig::new();
    let mut session = session();
    session.attach().unwrap();
    assert!(session.overlays().loading_visible());
    assert!(session.timers().is_pending(TimerKind::ComponentWait));

    session.player_event(PlayerEvent::ComponentReady, &mut rig.player);
    assert!(!session.timers().is_pending(TimerKind::ComponentWait));
    assert!(session.timers().is_pending(TimerKind::Startup));

    session.player_event(PlayerEvent::LoadedMetadata, &mut rig.player);
    assert_eq!(session.metadata().resolution, "Res: 1920x1080");
    assert_eq!(session.metadata().duration, "Dur: 10:00");

    session.player_event(PlayerEvent::CanPlay, &mut rig.player);
    assert!(session.overlays().loading_visible());

    rig.player.paused = false;
    session.player_event(PlayerEvent::Playing, &mut rig.player);
    assert!(!session.overlays().loading_visible());
    assert!(!session.timers().is_pending(TimerKind::Startup));
    assert!(session.player_state().started);
}

#[test]
fn test_component_timeout_shows_error() {
    let mut rig = Rig::new();
    let mut session = session();
    session.attach().unwrap();

    session.tick(Instant::now() + Duration::from_secs(11), &mut rig.ports());
    assert_eq!(session.overlays().error_message(), Some(crate::player::COMPONENT_TIMEOUT_MESSAGE));
    assert!(!session.overlays().loading_visible());
}

#[test]
fn test_startup_timeout_only_before_playback() {
    let mut rig = Rig::new();
    let mut session = session();
    session.attach().unwrap();
    session.player_event(PlayerEvent::ComponentReady, &mut rig.player);

    session.tick(Instant::now() + Duration::from_secs(16), &mut rig.ports());
    assert_eq!(session.overlays().error_message(), Some(crate::player::STARTUP_TIMEOUT_MESSAGE));
}

#[test]
fn test_error_then_retry() {
    let mut rig = Rig::new();
    let mut session = session();
    session.attach().unwrap();
    session.player_event(PlayerEvent::ComponentReady, &mut rig.player);
    session.player_event(PlayerEvent::Error(PlaybackError::classify(Some(2), None)), &mut rig.player);
    assert_eq!(session.overlays().error_message(), Some("Network error."));
    assert!(!session.overlays().loading_visible());

    session.retry(Some(&mut rig.player));
    assert!(!session.overlays().error_visible());
    assert!(session.overlays().loading_visible());
    assert_eq!(rig.player.loads, 1);
    assert!(!rig.player.paused);
}

#[test]
fn test_retry_failure_is_reported() {
    let mut rig = Rig::new();
    rig.player.fail_load = true;
    let mut session = session();
    session.attach().unwrap();
    session.player_event(PlayerEvent::Error(PlaybackError::Decode), &mut rig.player);

    session.retry(Some(&mut rig.player));
    assert_eq!(session.overlays().error_message(), Some("Retry failed: player process exited"));
}

#[test]
fn test_retry_without_error_is_a_no_op() {
    let mut rig = Rig::new();
    let mut session = session();
    session.attach().unwrap();
    session.retry(Some(&mut rig.player));
    assert_eq!(rig.player.loads, 0);
}

#[test]
fn test_disconnect_keeps_playback_error_and_retry_recovers() {
    let mut rig = Rig::new();
    let mut session = session();
    session.attach().unwrap();
    session.player_event(PlayerEvent::ComponentReady, &mut rig.player);
    session.player_event(PlayerEvent::Error(PlaybackError::Network), &mut rig.player);

    session.player_unavailable("Player process exited.");
    assert_eq!(session.overlays().error_message(), Some("Network error."));

    session.retry(Some(&mut rig.player));
    assert!(!session.overlays().error_visible());
    assert_eq!(rig.player.loads, 1);

    session.player_event(PlayerEvent::CanPlay, &mut rig.player);
    session.player_event(PlayerEvent::Playing, &mut rig.player);
    assert!(!session.overlays().error_visible());
    assert!(!session.overlays().loading_visible());
}

#[test]
fn test_disconnect_without_error_is_shown() {
    let mut session = session();
    session.attach().unwrap();
    session.player_unavailable("Player process exited.");
    assert_eq!(session.overlays().error_message(), Some("Player process exited."));
    assert!(!session.timers().is_pending(TimerKind::ComponentWait));
}

#[test]
fn test_metadata_fills_in_once_streams_are_known() {
    let mut rig = Rig::new();
    rig.player.width = 0;
    rig.player.height = 0;
    rig.player.has_audio = false;
    let mut session = session();
    session.attach().unwrap();
    session.player_event(PlayerEvent::ComponentReady, &mut rig.player);
    session.player_event(PlayerEvent::LoadedMetadata, &mut rig.player);
    assert!(!session.player_state().metadata_captured);

    rig.player.width = 1920;
    rig.player.height = 1080;
    rig.player.has_audio = true;
    session.player_event(PlayerEvent::CanPlay, &mut rig.player);
    session.player_event(PlayerEvent::Playing, &mut rig.player);
    assert_eq!(session.metadata().resolution, "Res: 1920x1080");
    assert!(session.player_state().metadata_captured);
}

#[test]
fn test_launch_opened() {
    let mut rig = Rig::new();
    let mut session = session();
    session.launch("vlc", &mut rig.opener);
    assert_eq!(toast_text(&session), Some("Attempting to launch VLC..."));
    assert_eq!(rig.opener.opened, vec!["vlc://https://cdn.example.com/movies/Big%20Buck%20Bunny.mkv"]);
    assert!(!session.timers().is_pending(TimerKind::LaunchFallback));
}

#[test]
fn test_blocked_launch_falls_back_after_delay() {
    let mut rig = Rig::new();
    rig.opener = RecordingOpener::answering(OpenOutcome::Blocked);
    let mut session = session();

    session.launch("potplayer", &mut rig.opener);
    assert_eq!(toast_text(&session), Some("Trying to open PotPlayer..."));

    session.tick(Instant::now(), &mut rig.ports());
    assert!(rig.opener.navigated.is_empty());

    session.tick(Instant::now() + Duration::from_millis(301), &mut rig.ports());
    assert_eq!(rig.opener.navigated, rig.opener.opened);
}

#[test]
fn test_unknown_player_is_refused() {
    let mut rig = Rig::new();
    let mut session = session();
    session.launch("winamp", &mut rig.opener);
    assert_eq!(toast_text(&session), Some("Invalid URL or player type: winamp"));
    assert!(rig.opener.opened.is_empty());

    session.tick(Instant::now() + Duration::from_secs(1), &mut rig.ports());
    assert!(rig.opener.navigated.is_empty());
}

#[test]
fn test_opener_error_suggests_copy() {
    let mut rig = Rig::new();
    rig.opener = RecordingOpener::default();
    let mut session = session();
    session.launch("mx", &mut rig.opener);
    assert_eq!(toast_text(&session), Some("Failed to open MX Player. Try copy link."));
}

#[test]
fn test_menu_key_launches_and_closes() {
    let mut rig = Rig::new();
    let mut session = session();
    session.activate(Control::OpenIn, &mut rig.ports());
    assert!(session.menus().is_open(MenuId::Stream));
    assert_eq!(menu_listeners(&session, MenuId::Stream), (1, 1));

    assert_eq!(session.handle_key(&key(KeyCode::Down), &mut rig.ports()), KeyOutcome::Handled);
    assert_eq!(session.focus(), Focus::MenuItem(MenuId::Stream, 1));
    assert_eq!(session.handle_key(&key(KeyCode::Enter), &mut rig.ports()), KeyOutcome::Handled);

    assert!(!session.menus().is_open(MenuId::Stream));
    assert_eq!(menu_listeners(&session, MenuId::Stream), (0, 0));
    assert_eq!(toast_text(&session), Some("Attempting to launch PotPlayer..."));
}

#[test]
fn test_tab_closes_menu_without_handling() {
    let mut rig = Rig::new();
    let mut session = session();
    session.toggle_menu(MenuId::Stream);
    assert_eq!(session.handle_key(&key(KeyCode::Tab), &mut rig.ports()), KeyOutcome::Ignored);
    assert_eq!(session.focus(), Focus::Control(Control::OpenIn));
    assert_eq!(menu_listeners(&session, MenuId::Stream), (0, 0));
}

#[test]
fn test_click_outside_closes_menu() {
    let mut session = session();
    session.toggle_menu(MenuId::Speed);
    session.click_outside();
    assert!(!session.menus().is_open(MenuId::Speed));
    assert_eq!(session.focus(), Focus::Control(Control::Speed));
    assert_eq!(menu_listeners(&session, MenuId::Speed), (0, 0));
}

#[test]
fn test_listener_counts_after_open_close_sequences() {
    let mut rig = Rig::new();
    let mut session = session();
    for _ in 0..3 {
        session.toggle_menu(MenuId::Stream);
        session.toggle_menu(MenuId::Speed);
        assert_eq!(menu_listeners(&session, MenuId::Stream), (0, 0));
        assert_eq!(menu_listeners(&session, MenuId::Speed), (1, 1));
        session.handle_key(&key(KeyCode::Esc), &mut rig.ports());
        session.click_outside();
        assert_eq!(menu_listeners(&session, MenuId::Speed), (0, 0));
    }
    session.click_menu_item(MenuId::Speed, 0, &mut rig.ports());
    assert_eq!(rig.player.rate, 1.0);
}

#[test]
fn test_speed_menu_sets_rate() {
    let mut rig = Rig::new();
    let mut session = session();
    session.toggle_menu(MenuId::Speed);
    session.click_menu_item(MenuId::Speed, 4, &mut rig.ports());
    assert_eq!(rig.player.rate, 1.5);
    assert_eq!(toast_text(&session), Some("Playback speed: 1.5x"));
    assert!(!session.menus().is_open(MenuId::Speed));
}

fn track_rig() -> Rig {
    let mut rig = Rig::new();
    rig.player.tracks = vec![
        Track::new(1, TrackKind::Audio).selected(true),
        Track::new(2, TrackKind::Audio).title("Commentary"),
        Track::new(1, TrackKind::Subtitle).title("English").lang("eng"),
    ];
    rig
}

#[test]
fn test_tracks_menu_selects_subtitles_and_audio() {
    let mut rig = track_rig();
    let mut session = session();
    session.activate(Control::Tracks, &mut rig.ports());
    assert!(session.menus().is_open(MenuId::Tracks));
    assert_eq!(session.focus(), Focus::MenuItem(MenuId::Tracks, 0));
    let labels: Vec<String> = session.menus().menu(MenuId::Tracks).unwrap().items.iter().map(|i| i.label.clone()).collect();
    assert_eq!(labels, ["Subtitles: Off", "Sub: English [eng]", "Audio: Audio 1 [N/A]", "Audio: Commentary [N/A]"]);

    session.click_menu_item(MenuId::Tracks, 1, &mut rig.ports());
    assert!(rig.player.tracks[2].selected);
    assert_eq!(toast_text(&session), Some("Subtitles: English"));
    assert!(session.menus().is_open(MenuId::Tracks));
    assert!(session.menus().menu(MenuId::Tracks).unwrap().items[1].selected);

    session.handle_key(&key(KeyCode::Home), &mut rig.ports());
    assert_eq!(session.handle_key(&key(KeyCode::Enter), &mut rig.ports()), KeyOutcome::Handled);
    assert!(!rig.player.tracks[2].selected);
    assert_eq!(toast_text(&session), Some("Subtitles off"));

    session.click_menu_item(MenuId::Tracks, 3, &mut rig.ports());
    assert!(!rig.player.tracks[0].selected);
    assert!(rig.player.tracks[1].selected);
    assert_eq!(toast_text(&session), Some("Audio: Commentary"));
    assert_eq!(menu_listeners(&session, MenuId::Tracks), (1, 1));

    session.handle_key(&key(KeyCode::Esc), &mut rig.ports());
    assert_eq!(session.focus(), Focus::Control(Control::Tracks));
    assert_eq!(menu_listeners(&session, MenuId::Tracks), (0, 0));
}

#[test]
fn test_tracks_menu_is_empty_without_tracks() {
    let mut rig = Rig::new();
    let mut session = session();
    session.activate(Control::Tracks, &mut rig.ports());
    assert!(session.menus().is_open(MenuId::Tracks));
    assert!(session.menus().menu(MenuId::Tracks).unwrap().items.is_empty());
    assert_eq!(session.focus(), Focus::Control(Control::Tracks));
    assert_eq!(session.handle_key(&key(KeyCode::Enter), &mut rig.ports()), KeyOutcome::Ignored);
}

#[test]
fn test_shortcuts_reach_player() {
    let mut rig = Rig::new();
    let mut session = session();

    assert_eq!(session.handle_key(&key(KeyCode::Char('k')), &mut rig.ports()), KeyOutcome::Handled);
    assert!(!rig.player.paused);

    assert_eq!(session.handle_key(&key(KeyCode::Char('m')), &mut rig.ports()), KeyOutcome::Handled);
    let toast = session.toast().unwrap();
    assert_eq!(toast.text, "Muted");
    assert_eq!(toast.duration, Duration::from_millis(1500));

    assert_eq!(session.handle_key(&key(KeyCode::Char('q')), &mut rig.ports()), KeyOutcome::Ignored);
}

#[test]
fn test_shortcuts_ignored_while_menu_open_or_control_focused() {
    let mut rig = Rig::new();
    let mut session = session();
    session.toggle_menu(MenuId::Stream);
    assert_eq!(session.handle_key(&key(KeyCode::Char('k')), &mut rig.ports()), KeyOutcome::Ignored);
    assert!(rig.player.paused);

    session.handle_key(&key(KeyCode::Esc), &mut rig.ports());
    assert_eq!(session.focus(), Focus::Control(Control::OpenIn));
    session.handle_key(&key(KeyCode::Char('f')), &mut rig.ports());
    assert!(!rig.player.fullscreen);
}

#[test]
fn test_shortcuts_need_ready_player() {
    let mut rig = Rig::new();
    rig.player.ready = false;
    let mut session = session();
    assert_eq!(session.handle_key(&key(KeyCode::Char(' ')), &mut rig.ports()), KeyOutcome::Ignored);
    assert!(rig.player.paused);
}

#[test]
fn test_focus_cycle() {
    let mut session = session();
    session.focus_next(true);
    assert_eq!(session.focus(), Focus::Control(Control::OpenIn));
    session.focus_next(false);
    assert_eq!(session.focus(), Focus::Page);
    session.focus_next(false);
    assert_eq!(session.focus(), Focus::Control(Control::Theme));
}

#[test]
fn test_copy_link() {
    let mut rig = Rig::new();
    let mut session = session();
    session.activate(Control::CopyLink, &mut rig.ports());
    assert_eq!(rig.clipboard.contents.as_deref(), session.source().map(MediaSource::as_str));
    assert_eq!(toast_text(&session), Some("Link copied!"));

    rig.clipboard.fail = true;
    session.copy_link(&mut rig.clipboard);
    assert_eq!(toast_text(&session), Some("Copy failed."));
}

#[test]
fn test_download_request_uses_title() {
    let mut rig = Rig::new();
    let mut session = WatchSession::create(Config::default(), PAGE, Some("My: Film"));
    session.activate(Control::Download, &mut rig.ports());
    let request = session.take_download().unwrap();
    assert_eq!(request.filename, "My_Film.mkv");
    assert_eq!(toast_text(&session), Some("Download started..."));
    assert!(session.take_download().is_none());

    session.report_download(Ok(request.filename.clone()));
    assert_eq!(toast_text(&session), Some("Saved My_Film.mkv"));
    session.report_download(Err(ActionError::DownloadFailed("404".into())));
    assert_eq!(toast_text(&session), Some("Download failed."));
}

#[test]
fn test_toast_hides_on_deadline() {
    let mut rig = Rig::new();
    let mut session = session();
    session.notify("hello", Severity::Info);
    session.tick(Instant::now() + Duration::from_millis(2900), &mut rig.ports());
    assert!(session.toast().is_some());
    session.tick(Instant::now() + Duration::from_millis(3100), &mut rig.ports());
    assert!(session.toast().is_none());
}

#[test]
fn test_dispose_clears_everything() {
    let mut rig = Rig::new();
    let mut session = session();
    session.attach().unwrap();
    session.toggle_menu(MenuId::Stream);
    rig.opener = RecordingOpener::answering(OpenOutcome::Indeterminate);
    session.launch("mpc", &mut rig.opener);

    session.dispose();
    assert!(session.listeners().is_empty());
    assert!(session.timers().is_empty());
    assert!(session.toast().is_none());

    session.tick(Instant::now() + Duration::from_secs(30), &mut rig.ports());
    assert!(rig.opener.navigated.is_empty());
    assert_eq!(session.handle_key(&key(KeyCode::Char('k')), &mut rig.ports()), KeyOutcome::Ignored);
    session.dispose();
    assert!(session.is_disposed());
}
