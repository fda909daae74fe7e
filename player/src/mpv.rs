//! mpv driven over its JSON IPC socket.
//!
//! mpv runs as a child process with `--input-ipc-server`. A connector task
//! dials the socket until it answers, then splits it into a writer fed by a
//! command channel and a reader that forwards property changes and events.
//! Everything the UI needs is cached in [`MpvProps`] so the
//! [`PlayerBackend`] getters never block.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use watchlink_core::error::{PlaybackError, WatchError};
use watchlink_core::player::{Track, TrackKind};
use watchlink_core::{MediaSource, PlayerBackend, PlayerEvent};

const CONNECT_RETRY: Duration = Duration::from_millis(100);

/// Properties observed on connect, in observer-id order.
const OBSERVED: [&str; 13] = [
    "pause",
    "duration",
    "width",
    "height",
    "volume",
    "mute",
    "time-pos",
    "paused-for-cache",
    "eof-reached",
    "fullscreen",
    "speed",
    "audio-codec-name",
    "track-list",
];

/// One line from the IPC socket.
#[derive(Debug, Deserialize)]
struct IpcMessage {
    event: Option<String>,
    name: Option<String>,
    #[serde(default)]
    data: Value,
    reason: Option<String>,
    file_error: Option<String>,
    error: Option<String>,
    request_id: Option<u64>,
}

/// One entry of mpv's `track-list` property.
#[derive(Debug, Deserialize)]
struct MpvTrack {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    title: Option<String>,
    lang: Option<String>,
    #[serde(default)]
    selected: bool,
}

impl MpvTrack {
    fn into_track(self) -> Option<Track> {
        let kind = match self.kind.as_str() {
            "video" => TrackKind::Video,
            "audio" => TrackKind::Audio,
            "sub" => TrackKind::Subtitle,
            _ => return None,
        };
        let mut track = Track::new(self.id, kind).selected(self.selected);
        track.title = self.title;
        track.lang = self.lang;
        Some(track)
    }
}

#[derive(Debug)]
enum Incoming {
    Connected,
    Message(IpcMessage),
    Closed(String),
}

/// What the UI loop should do after draining the socket.
#[derive(Debug, Clone, PartialEq)]
pub enum MpvUpdate {
    Event(PlayerEvent),
    Gone(String),
}

/// Last known player readings.
#[derive(Debug, Clone, PartialEq)]
pub struct MpvProps {
    pub connected: bool,
    pub loaded: bool,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
    pub muted: bool,
    pub volume: f64,
    pub paused: bool,
    pub buffering: bool,
    pub ended: bool,
    pub position: f64,
    pub fullscreen: bool,
    pub speed: f64,
    /// `None` until mpv has reported the track list for the current file.
    pub tracks: Option<Vec<Track>>,
}

impl Default for MpvProps {
    fn default() -> Self {
        Self {
            connected: false,
            loaded: false,
            duration: f64::NAN,
            width: 0,
            height: 0,
            has_audio: false,
            muted: false,
            volume: 1.0,
            paused: true,
            buffering: false,
            ended: false,
            position: 0.0,
            fullscreen: false,
            speed: 1.0,
            tracks: None,
        }
    }
}

impl MpvProps {
    /// Dimensions and audio agree with the track list, so metadata read now is final.
    pub fn facts_settled(&self) -> bool {
        let Some(tracks) = &self.tracks else {
            return false;
        };
        let has = |kind: TrackKind| tracks.iter().any(|t| t.kind == kind);
        let video_ok = !has(TrackKind::Video) || (self.width > 0 && self.height > 0);
        let audio_ok = !has(TrackKind::Audio) || self.has_audio;
        video_ok && audio_ok
    }

    fn select(&mut self, kind: TrackKind, id: Option<i64>) {
        for track in self.tracks.iter_mut().flatten().filter(|t| t.kind == kind) {
            track.selected = Some(track.id) == id;
        }
    }

    /// Fold one IPC message into the cache and report the player event it implies.
    fn apply(&mut self, msg: &IpcMessage) -> Option<PlayerEvent> {
        if let Some(error) = msg.error.as_deref().filter(|e| *e != "success") {
            debug!("mpv request {:?} failed: {}", msg.request_id, error);
            return None;
        }

        match msg.event.as_deref()? {
            "property-change" => self.property(msg.name.as_deref()?, &msg.data),
            "file-loaded" => {
                self.loaded = true;
                self.ended = false;
                Some(PlayerEvent::CanPlay)
            }
            "playback-restart" => (!self.paused).then_some(PlayerEvent::Playing),
            "end-file" => match msg.reason.as_deref() {
                Some("error") => {
                    self.loaded = false;
                    Some(PlayerEvent::Error(classify_file_error(msg.file_error.as_deref())))
                }
                Some("eof") => {
                    self.ended = true;
                    Some(PlayerEvent::Ended)
                }
                _ => None,
            },
            "start-file" => {
                self.loaded = false;
                self.tracks = None;
                Some(PlayerEvent::ProviderChange)
            }
            _ => None,
        }
    }

    fn property(&mut self, name: &str, data: &Value) -> Option<PlayerEvent> {
        match name {
            "pause" => {
                self.paused = data.as_bool()?;
                if self.paused {
                    Some(PlayerEvent::Paused)
                } else if self.loaded && !self.buffering {
                    Some(PlayerEvent::Playing)
                } else {
                    None
                }
            }
            "duration" => {
                self.duration = data.as_f64().unwrap_or(f64::NAN);
                Some(PlayerEvent::LoadedMetadata)
            }
            "width" => {
                self.width = data.as_u64().unwrap_or(0) as u32;
                Some(PlayerEvent::LoadedMetadata)
            }
            "height" => {
                self.height = data.as_u64().unwrap_or(0) as u32;
                Some(PlayerEvent::LoadedMetadata)
            }
            "volume" => {
                self.volume = (data.as_f64()? / 100.0).clamp(0.0, 1.0);
                None
            }
            "mute" => {
                self.muted = data.as_bool()?;
                None
            }
            "time-pos" => {
                self.position = data.as_f64().unwrap_or(0.0);
                None
            }
            "paused-for-cache" => {
                self.buffering = data.as_bool()?;
                if self.buffering {
                    Some(PlayerEvent::Waiting)
                } else if !self.paused && self.loaded {
                    Some(PlayerEvent::Playing)
                } else {
                    None
                }
            }
            "eof-reached" => {
                let ended = data.as_bool().unwrap_or(false);
                let newly = ended && !self.ended;
                self.ended = ended;
                newly.then_some(PlayerEvent::Ended)
            }
            "fullscreen" => {
                self.fullscreen = data.as_bool()?;
                None
            }
            "speed" => {
                self.speed = data.as_f64()?;
                None
            }
            "audio-codec-name" => {
                self.has_audio = data.as_str().is_some_and(|c| !c.is_empty());
                Some(PlayerEvent::LoadedMetadata)
            }
            "track-list" => {
                let tracks = match serde_json::from_value::<Vec<MpvTrack>>(data.clone()) {
                    Ok(tracks) => tracks.into_iter().filter_map(MpvTrack::into_track).collect(),
                    Err(e) => {
                        debug!("Unreadable track-list: {}", e);
                        Vec::new()
                    }
                };
                self.tracks = Some(tracks);
                Some(PlayerEvent::LoadedMetadata)
            }
            _ => None,
        }
    }
}

/// Map mpv's `file_error` text onto the media error codes the page reports.
fn classify_file_error(file_error: Option<&str>) -> PlaybackError {
    let code = match file_error {
        Some("unrecognized file format") | Some("no audio or video data played") => Some(4),
        Some("loading failed") => Some(2),
        Some(e) if e.contains("demux") || e.contains("decod") => Some(3),
        _ => None,
    };
    PlaybackError::classify(code, file_error)
}

/// Command line for the mpv child. `--idle=yes` keeps mpv and its socket
/// alive after a failed load so the session can retry with `loadfile`.
fn mpv_args(socket: &Path, source: &MediaSource, autoplay: bool) -> Vec<String> {
    vec![
        format!("--input-ipc-server={}", socket.display()),
        "--force-window=yes".to_string(),
        "--keep-open=yes".to_string(),
        "--idle=yes".to_string(),
        "--no-terminal".to_string(),
        format!("--pause={}", if autoplay { "no" } else { "yes" }),
        source.as_str().to_string(),
    ]
}

pub struct MpvPlayer {
    child: Child,
    socket: PathBuf,
    source: String,
    autoplay: bool,
    props: MpvProps,
    commands: mpsc::UnboundedSender<Value>,
    incoming: mpsc::UnboundedReceiver<Incoming>,
    next_request: u64,
    gone: bool,
}

impl MpvPlayer {
    /// Start mpv on `source` and begin dialing its IPC socket.
    pub fn spawn(handle: &Handle, mpv_path: &str, source: &MediaSource, autoplay: bool) -> Result<Self> {
        let _guard = handle.enter();
        let socket = std::env::temp_dir().join(format!("watchlink-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket);

        let mut cmd = Command::new(mpv_path);
        cmd.args(mpv_args(&socket, source, autoplay))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let child = cmd.spawn().with_context(|| format!("Failed to start {}", mpv_path))?;
        info!("mpv started (pid {:?}) on {}", child.id(), socket.display());

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        handle.spawn(run_connection(socket.clone(), command_rx, incoming_tx));

        let mut player = Self {
            child,
            socket,
            source: source.as_str().to_string(),
            autoplay,
            props: MpvProps::default(),
            commands: command_tx,
            incoming: incoming_rx,
            next_request: 1,
            gone: false,
        };
        for (id, name) in OBSERVED.iter().enumerate() {
            player.send(json!(["observe_property", id + 1, name]))?;
        }
        Ok(player)
    }

    /// Drain everything the reader task has forwarded since the last call.
    pub fn poll(&mut self) -> Vec<MpvUpdate> {
        let mut updates = Vec::new();
        while let Ok(incoming) = self.incoming.try_recv() {
            match incoming {
                Incoming::Connected => {
                    self.props.connected = true;
                    updates.push(MpvUpdate::Event(PlayerEvent::ComponentReady));
                }
                Incoming::Message(msg) => {
                    if let Some(event) = self.props.apply(&msg) {
                        updates.push(MpvUpdate::Event(event));
                    }
                }
                Incoming::Closed(reason) => {
                    self.gone = true;
                    self.props.connected = false;
                    updates.push(MpvUpdate::Gone(reason));
                }
            }
        }
        updates
    }

    fn send(&mut self, command: Value) -> watchlink_core::Result<()> {
        let request_id = self.next_request;
        self.next_request += 1;
        debug!("mpv <- {} (#{})", command, request_id);
        self.commands
            .send(json!({ "command": command, "request_id": request_id }))
            .map_err(|_| WatchError::PlayerUnavailable("mpv is not running.".to_string()))
    }

    fn set_property(&mut self, name: &str, value: Value) -> watchlink_core::Result<()> {
        self.send(json!(["set_property", name, value]))
    }

    /// Ask mpv to quit and make sure the process is gone.
    pub async fn stop(&mut self) {
        let _ = self.send(json!(["quit"]));
        if tokio::time::timeout(Duration::from_millis(500), self.child.wait()).await.is_err() {
            warn!("mpv did not quit in time, killing it");
            let _ = self.child.kill().await;
        }
        let _ = std::fs::remove_file(&self.socket);
        info!("mpv stopped");
    }
}

async fn run_connection(
    socket: PathBuf,
    mut commands: mpsc::UnboundedReceiver<Value>,
    incoming: mpsc::UnboundedSender<Incoming>,
) {
    let stream = match connect(&socket, &incoming).await {
        Some(stream) => stream,
        None => return,
    };
    let _ = incoming.send(Incoming::Connected);
    let (reader, mut writer) = stream.into_split();

    let writer_task = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            let mut line = command.to_string();
            line.push('\n');
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                warn!("mpv write failed: {}", e);
                break;
            }
        }
    });

    let mut lines = BufReader::new(reader).lines();
    let reason = loop {
        match lines.next_line().await {
            Ok(Some(line)) => match serde_json::from_str::<IpcMessage>(&line) {
                Ok(msg) => {
                    if incoming.send(Incoming::Message(msg)).is_err() {
                        break "receiver dropped".to_string();
                    }
                }
                Err(e) => debug!("Ignoring mpv line {:?}: {}", line, e),
            },
            Ok(None) => break "Player process exited.".to_string(),
            Err(e) => break format!("Player connection lost: {}", e),
        }
    };
    info!("mpv connection closed: {}", reason);
    writer_task.abort();
    let _ = incoming.send(Incoming::Closed(reason));
}

/// Dial until the socket answers or the UI stops listening.
async fn connect(socket: &Path, incoming: &mpsc::UnboundedSender<Incoming>) -> Option<UnixStream> {
    loop {
        match UnixStream::connect(socket).await {
            Ok(stream) => {
                debug!("Connected to {}", socket.display());
                return Some(stream);
            }
            Err(_) if !incoming.is_closed() => tokio::time::sleep(CONNECT_RETRY).await,
            Err(_) => return None,
        }
    }
}

impl PlayerBackend for MpvPlayer {
    fn is_ready(&self) -> bool {
        self.props.connected && !self.gone
    }
    fn duration(&self) -> f64 {
        self.props.duration
    }
    fn width(&self) -> u32 {
        self.props.width
    }
    fn height(&self) -> u32 {
        self.props.height
    }
    fn has_audio(&self) -> bool {
        self.props.has_audio
    }
    fn muted(&self) -> bool {
        self.props.muted
    }
    fn volume(&self) -> f64 {
        self.props.volume
    }
    fn paused(&self) -> bool {
        self.props.paused
    }
    fn ended(&self) -> bool {
        self.props.ended
    }
    fn position(&self) -> f64 {
        self.props.position
    }
    fn fullscreen(&self) -> bool {
        self.props.fullscreen
    }
    fn playback_rate(&self) -> f64 {
        self.props.speed
    }
    fn tracks(&self) -> Vec<Track> {
        self.props.tracks.clone().unwrap_or_default()
    }
    fn facts_settled(&self) -> bool {
        self.props.facts_settled()
    }
    fn autoplay(&self) -> bool {
        self.autoplay
    }

    fn play(&mut self) -> watchlink_core::Result<()> {
        if self.props.ended {
            self.seek_to(0.0)?;
        }
        self.set_property("pause", json!(false))?;
        self.props.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> watchlink_core::Result<()> {
        self.set_property("pause", json!(true))?;
        self.props.paused = true;
        Ok(())
    }

    fn seek_to(&mut self, secs: f64) -> watchlink_core::Result<()> {
        self.send(json!(["seek", secs, "absolute"]))?;
        self.props.position = secs;
        Ok(())
    }

    fn set_volume(&mut self, volume: f64) -> watchlink_core::Result<()> {
        self.set_property("volume", json!((volume * 100.0).round()))?;
        self.props.volume = volume;
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> watchlink_core::Result<()> {
        self.set_property("mute", json!(muted))?;
        self.props.muted = muted;
        Ok(())
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> watchlink_core::Result<()> {
        self.set_property("fullscreen", json!(fullscreen))?;
        self.props.fullscreen = fullscreen;
        Ok(())
    }

    fn set_playback_rate(&mut self, rate: f64) -> watchlink_core::Result<()> {
        self.set_property("speed", json!(rate))?;
        self.props.speed = rate;
        Ok(())
    }

    fn select_subtitle(&mut self, id: Option<i64>) -> watchlink_core::Result<()> {
        let value = id.map_or_else(|| json!("no"), |id| json!(id));
        self.set_property("sid", value)?;
        self.props.select(TrackKind::Subtitle, id);
        Ok(())
    }

    fn select_audio(&mut self, id: i64) -> watchlink_core::Result<()> {
        self.set_property("aid", json!(id))?;
        self.props.select(TrackKind::Audio, Some(id));
        Ok(())
    }

    fn load(&mut self) -> watchlink_core::Result<()> {
        if self.gone {
            return Err(WatchError::PlayerUnavailable("mpv is not running.".to_string()));
        }
        let source = self.source.clone();
        self.send(json!(["loadfile", source, "replace"]))?;
        self.props.loaded = false;
        self.props.tracks = None;
        self.props.ended = false;
        Ok(())
    }
}
