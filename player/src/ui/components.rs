use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use watchlink_core::format::format_time;
use watchlink_core::toast::{Severity, Toast};
use watchlink_core::Theme;

/// Colors for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub dim: Color,
    pub accent: Color,
    pub focus_bg: Color,
    pub focus_fg: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Black,
                fg: Color::White,
                dim: Color::DarkGray,
                accent: Color::Cyan,
                focus_bg: Color::Blue,
                focus_fg: Color::White,
                error: Color::LightRed,
            },
            Theme::Light => Self {
                bg: Color::White,
                fg: Color::Black,
                dim: Color::Gray,
                accent: Color::Blue,
                focus_bg: Color::LightBlue,
                focus_fg: Color::Black,
                error: Color::Red,
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Info => self.accent,
            Severity::Success => Color::Green,
            Severity::Warning => Color::Yellow,
            Severity::Error => self.error,
        }
    }
}

/// Playback position bar
pub struct ProgressBar<'a> {
    position: f64,
    duration: f64,
    is_paused: bool,
    title: Option<&'a str>,
    palette: Palette,
}

impl<'a> ProgressBar<'a> {
    pub fn new(position: f64, duration: f64, palette: Palette) -> Self {
        Self {
            position,
            duration,
            is_paused: false,
            title: None,
            palette,
        }
    }

    pub fn paused(mut self, is_paused: bool) -> Self {
        self.is_paused = is_paused;
        self
    }

    pub fn title(mut self, title: Option<&'a str>) -> Self {
        self.title = title;
        self
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let known = self.duration.is_finite() && self.duration > 0.0;
        let ratio = if known {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let show_hours = known && self.duration >= 3600.0;
        let label = if known {
            format!(
                "{} / {}",
                format_time(self.position, show_hours),
                format_time(self.duration, show_hours)
            )
        } else {
            format_time(self.position, false)
        };

        let display_title = match (self.is_paused, self.title) {
            (true, Some(title)) => format!("⏸  {} ", title),
            (false, Some(title)) => format!("▶  {} ", title),
            (true, None) => "⏸  Paused ".to_string(),
            (false, None) => "▶  Playing ".to_string(),
        };

        Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.palette.dim))
                    .title(display_title),
            )
            .gauge_style(
                Style::default()
                    .fg(self.palette.accent)
                    .bg(self.palette.bg)
                    .add_modifier(Modifier::BOLD),
            )
            .ratio(ratio)
            .label(label)
            .render(area, buf);
    }
}

/// Volume indicator
pub struct VolumeIndicator {
    volume: u8, // 0-100
    muted: bool,
    palette: Palette,
}

impl VolumeIndicator {
    pub fn new(volume: u8, muted: bool, palette: Palette) -> Self {
        Self {
            volume: volume.min(100),
            muted,
            palette,
        }
    }
}

impl Widget for VolumeIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (icon, color) = if self.muted {
            ("🔇", self.palette.dim)
        } else if self.volume == 0 {
            ("🔇", self.palette.fg)
        } else if self.volume < 30 {
            ("🔈", self.palette.fg)
        } else if self.volume < 70 {
            ("🔉", self.palette.fg)
        } else {
            ("🔊", self.palette.fg)
        };

        let text = if self.muted {
            format!("{} Muted", icon)
        } else {
            format!("{} {}%", icon, self.volume)
        };

        Paragraph::new(Text::from(text))
            .style(Style::default().fg(color))
            .alignment(Alignment::Right)
            .render(area, buf);
    }
}

/// Floating toast with a draining progress line.
pub struct ToastWidget<'a> {
    toast: &'a Toast,
    now: Instant,
    palette: Palette,
}

impl<'a> ToastWidget<'a> {
    pub fn new(toast: &'a Toast, now: Instant, palette: Palette) -> Self {
        Self { toast, now, palette }
    }

    /// Where the toast goes inside `area`: centered, just above the bottom rows.
    pub fn area_in(toast: &Toast, area: Rect) -> Rect {
        let width = (toast.text.width() as u16 + 4).max(16).min(area.width);
        let height = 4.min(area.height);
        Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + area.height.saturating_sub(height + 4),
            width,
            height,
        }
    }
}

impl Widget for ToastWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = self.palette.severity(self.toast.severity);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .style(self.palette.base());
        let inner = block.inner(area);

        Clear.render(area, buf);
        block.render(area, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(inner);

        Paragraph::new(self.toast.text.as_str())
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .render(rows[0], buf);

        // Bar drains from full to empty over the toast's lifetime.
        let remaining = 1.0 - self.toast.progress(self.now);
        let filled = (rows[1].width as f64 * remaining).round() as u16;
        for x in rows[1].x..rows[1].x + filled.min(rows[1].width) {
            buf[(x, rows[1].y)].set_symbol("▔").set_fg(color);
        }
    }
}

/// Key reference
pub struct HelpOverlay {
    palette: Palette,
}

impl HelpOverlay {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }
}

const HELP_KEYS: [(&str, &str); 17] = [
    ("k / Space", "Play/Pause"),
    ("f", "Fullscreen"),
    ("m", "Mute"),
    ("←/→", "Seek 10 seconds"),
    ("Shift+←/→", "Seek 5 seconds"),
    ("↑/↓", "Volume"),
    ("Tab / Shift+Tab", "Move between buttons"),
    ("Enter", "Press focused button"),
    ("o", "Open in external player"),
    ("s", "Playback speed"),
    ("a", "Subtitles and audio tracks"),
    ("d", "Download"),
    ("c", "Copy link"),
    ("t", "Toggle theme"),
    ("r", "Retry after an error"),
    ("?", "Toggle help"),
    ("q / Ctrl+C", "Quit"),
];

impl Widget for HelpOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(Span::styled("Keyboard Controls", bold.add_modifier(Modifier::UNDERLINED))),
            Line::from(""),
        ];
        lines.extend(HELP_KEYS.iter().map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{:>16}", key), bold.fg(self.palette.accent)),
                Span::raw(format!("  {}", what)),
            ])
        }));

        let help = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .title(" Help ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.palette.accent)),
            )
            .style(self.palette.base())
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false });

        Clear.render(area, buf);
        help.render(area, buf);
    }
}

/// Get a spinner frame for loading animations
pub fn get_spinner_frame(duration_ms: u128) -> &'static str {
    const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"];
    let frame_idx = (duration_ms / 80) % SPINNER_FRAMES.len() as u128;
    SPINNER_FRAMES[frame_idx as usize]
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
