pub mod components;

pub use components::*;

use std::time::Instant;

use anyhow::Result;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use watchlink_core::menu::{Control, Focus, MenuId};
use watchlink_core::{PlayerBackend, WatchSession};

use crate::app::{App, HitMap};

/// Draw the watch page
pub fn draw_ui(f: &mut Frame, app: &mut App) -> Result<()> {
    let session = &app.session;
    let palette = Palette::for_theme(session.theme());
    let area = f.area();
    let mut hits = HitMap::default();

    f.render_widget(Block::default().style(palette.base()), area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Title and file details
            Constraint::Min(5),    // Player area
            Constraint::Length(3), // Action bar
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    draw_header(f, session, palette, vertical[0]);
    draw_player_area(f, app, palette, vertical[1], &mut hits);
    draw_action_bar(f, &app.session, palette, vertical[2], &mut hits);

    let hints = Paragraph::new(" ? help   Tab move   Enter press   q quit")
        .style(Style::default().fg(palette.dim).bg(palette.bg));
    f.render_widget(hints, vertical[3]);

    if let Some(id) = app.session.menus().open_menu() {
        draw_dropdown(f, &app.session, palette, id, &mut hits);
    }

    if let Some(toast) = app.session.toast() {
        let toast_area = ToastWidget::area_in(toast, area);
        f.render_widget(ToastWidget::new(toast, Instant::now(), palette), toast_area);
    }

    if app.show_help {
        f.render_widget(HelpOverlay::new(palette), centered_rect(60, 80, area));
    }

    app.hit_map = hits;
    Ok(())
}

fn draw_header(f: &mut Frame, session: &WatchSession, palette: Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.dim))
        .title(" watchlink ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let meta = session.metadata();
    let lines = vec![
        Line::from(Span::styled(
            session.display_title(),
            Style::default().fg(palette.fg).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(meta.duration.as_str(), Style::default().fg(palette.dim)),
            Span::raw("  |  "),
            Span::styled(meta.resolution.as_str(), Style::default().fg(palette.dim)),
            Span::raw("  |  "),
            Span::styled(meta.size.as_str(), Style::default().fg(palette.dim)),
        ]),
    ];
    f.render_widget(Paragraph::new(Text::from(lines)).style(palette.base()), inner);
}

fn draw_player_area(f: &mut Frame, app: &App, palette: Palette, area: Rect, hits: &mut HitMap) {
    let session = &app.session;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.dim))
        .title(" Player ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let overlays = session.overlays();
    if let Some(message) = overlays.error_message() {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);
        let error = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(palette.error).add_modifier(Modifier::BOLD));
        f.render_widget(error, rows[1]);

        if session.source().is_some() {
            let width = 13.min(rows[3].width);
            let button = Rect {
                x: rows[3].x + (rows[3].width.saturating_sub(width)) / 2,
                width,
                ..rows[3]
            };
            let focused = session.focus() == Focus::Control(Control::Retry);
            f.render_widget(button_widget("Retry (r)", focused, palette), button);
            hits.controls.push((Control::Retry, button));
        }
        return;
    }

    if overlays.loading_visible() {
        let spinner = get_spinner_frame(app.started_at.elapsed().as_millis());
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        let loading = Paragraph::new(format!("{} Loading video... {}", spinner, spinner))
            .alignment(Alignment::Center)
            .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD));
        f.render_widget(loading, rows[1]);
        return;
    }

    let Some(player) = app.player() else {
        let idle = Paragraph::new("No player attached.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(palette.dim));
        f.render_widget(idle, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(3)])
        .split(inner);

    let state = if player.ended() {
        "Ended"
    } else if player.paused() {
        "Paused"
    } else {
        "Playing in the mpv window"
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(state, Style::default().fg(palette.fg).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("   {}x{}", player.playback_rate(), if player.fullscreen() { "   fullscreen" } else { "" }),
            Style::default().fg(palette.dim),
        ),
    ]));
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(12)])
        .split(rows[0]);
    f.render_widget(status, top[0]);

    let volume = VolumeIndicator::new((player.volume() * 100.0).round() as u8, player.muted(), palette);
    f.render_widget(volume, top[1]);

    let progress = ProgressBar::new(player.position(), player.duration(), palette)
        .paused(player.paused())
        .title(Some(session.display_title()));
    f.render_widget(progress, rows[2]);
}

fn control_label(session: &WatchSession, control: Control) -> String {
    let arrow = |id: MenuId| if session.menus().is_open(id) { "▴" } else { "▾" };
    match control {
        Control::OpenIn => format!("{} {}", control.label(), arrow(MenuId::Stream)),
        Control::Speed => format!("{} {}", control.label(), arrow(MenuId::Speed)),
        Control::Tracks => format!("{} {}", control.label(), arrow(MenuId::Tracks)),
        Control::Theme => format!("{}: {}", control.label(), session.theme()),
        _ => control.label().to_string(),
    }
}

fn button_widget(label: &str, focused: bool, palette: Palette) -> Paragraph<'_> {
    let style = if focused {
        Style::default()
            .fg(palette.focus_fg)
            .bg(palette.focus_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        palette.base()
    };
    Paragraph::new(label).alignment(Alignment::Center).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(if focused { style } else { Style::default().fg(palette.dim) }),
    )
}

fn draw_action_bar(f: &mut Frame, session: &WatchSession, palette: Palette, area: Rect, hits: &mut HitMap) {
    let count = Control::TAB_ORDER.len() as u32;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, count); Control::TAB_ORDER.len()])
        .split(area);

    for (control, chunk) in Control::TAB_ORDER.iter().zip(chunks.iter()) {
        let focused = match session.focus() {
            Focus::Control(c) => c == *control,
            Focus::MenuItem(id, _) => session.menus().menu(id).is_some_and(|m| m.trigger == *control),
            Focus::Page => false,
        };
        let label = control_label(session, *control);
        f.render_widget(button_widget(&label, focused, palette), *chunk);
        hits.controls.push((*control, *chunk));
    }
}

const NO_TRACKS: &str = "No tracks found";

fn draw_dropdown(f: &mut Frame, session: &WatchSession, palette: Palette, id: MenuId, hits: &mut HitMap) {
    let Some(menu) = session.menus().menu(id) else {
        return;
    };
    let Some(trigger) = hits.controls.iter().find(|(c, _)| *c == menu.trigger).map(|(_, r)| *r) else {
        return;
    };

    let widest = menu
        .items
        .iter()
        .map(|item| item.label.width())
        .max()
        .unwrap_or(NO_TRACKS.width()) as u16;
    let width = (widest + 5).max(trigger.width).min(f.area().width.saturating_sub(trigger.x));
    let height = (menu.items.len().max(1) as u16 + 2).min(trigger.y);
    let area = Rect {
        x: trigger.x,
        y: trigger.y.saturating_sub(height),
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(palette.base());
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    if menu.items.is_empty() {
        let empty = Paragraph::new(format!(" {}", NO_TRACKS)).style(Style::default().fg(palette.dim));
        f.render_widget(empty, inner);
    }

    let mut rows = Vec::with_capacity(menu.items.len());
    for (index, item) in menu.items.iter().enumerate() {
        let row = inner.y + index as u16;
        if row >= inner.y + inner.height {
            break;
        }
        let rect = Rect {
            y: row,
            height: 1,
            ..inner
        };
        let focused = session.focus() == Focus::MenuItem(id, index);
        let style = if focused {
            Style::default().fg(palette.focus_fg).bg(palette.focus_bg)
        } else {
            palette.base()
        };
        let marker = if item.selected { "●" } else { " " };
        f.render_widget(Paragraph::new(format!("{} {}", marker, item.label)).style(style), rect);
        rows.push(rect);
    }

    hits.menu = Some((id, area, rows));
}
