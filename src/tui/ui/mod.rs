//! UI module: View components for the TUI.

pub mod admin;
pub mod history;
pub mod home;
pub mod login;
pub mod performance;
pub mod prediction;
pub mod upload;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::application::{AppContext, BackendStatus, Notice, Screen};
use crate::tui::styles::{MedicalTheme, LOGO_SMALL};

/// Function key bound to each screen.
pub const SCREEN_KEYS: [(Screen, &str); 7] = [
    (Screen::Home, "F1"),
    (Screen::Login, "F2"),
    (Screen::Upload, "F3"),
    (Screen::Prediction, "F4"),
    (Screen::History, "F5"),
    (Screen::Performance, "F6"),
    (Screen::Admin, "F7"),
];

/// Top bar: product name, reachable screens, and who is logged in.
pub fn render_header(f: &mut Frame, area: Rect, ctx: &AppContext) {
    let mut spans = vec![
        Span::styled(format!(" {LOGO_SMALL} "), MedicalTheme::header()),
        Span::raw(" "),
    ];
    for (screen, key) in SCREEN_KEYS {
        if !screen.permits(ctx.identity()) {
            continue;
        }
        let style = if screen == ctx.screen() {
            MedicalTheme::selected()
        } else {
            MedicalTheme::key_desc()
        };
        spans.push(Span::styled(key, MedicalTheme::key_hint()));
        spans.push(Span::styled(format!(" {} ", screen.title()), style));
        spans.push(Span::raw(" "));
    }
    match ctx.identity() {
        Some(identity) => {
            spans.push(Span::styled("│ ", MedicalTheme::text_muted()));
            spans.push(Span::styled(identity.username.clone(), MedicalTheme::text()));
            spans.push(Span::styled(format!(" ({})", identity.role), MedicalTheme::text_secondary()));
            spans.push(Span::styled("  F9", MedicalTheme::key_hint()));
            spans.push(Span::styled(" Logout", MedicalTheme::key_desc()));
        }
        None => spans.push(Span::styled("│ not logged in", MedicalTheme::text_muted())),
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(header, area);
}

/// Height of the banner row: one line while the backend is unreachable.
#[must_use]
pub fn banner_height(ctx: &AppContext) -> u16 {
    u16::from(ctx.backend_status() == BackendStatus::Unreachable)
}

pub fn render_banner(f: &mut Frame, area: Rect) {
    let banner = Paragraph::new(Line::from(Span::styled(
        " BACKEND UNREACHABLE: login, parsing, scoring and history are unavailable ",
        MedicalTheme::banner(),
    )))
    .style(MedicalTheme::banner());
    f.render_widget(banner, area);
}

/// Outcome of the last action, or the busy indicator.
pub fn render_status(f: &mut Frame, area: Rect, notice: Option<&Notice>, pending: usize) {
    let mut spans = Vec::new();
    if pending > 0 {
        spans.push(Span::styled(format!("[{pending} pending] "), MedicalTheme::warning()));
    }
    if let Some(notice) = notice {
        spans.push(Span::styled(notice.text.clone(), MedicalTheme::notice(notice.level)));
    }
    spans.push(Span::styled("   Ctrl+Q", MedicalTheme::key_hint()));
    spans.push(Span::styled(" Quit", MedicalTheme::key_desc()));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(vec![Span::styled(
        "DISCLAIMER: Screening aid only. Results must be confirmed by a clinician before any prescribing decision.",
        MedicalTheme::text_muted(),
    )])];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

/// A titled single-line input box.
pub fn render_input(f: &mut Frame, area: Rect, label: &str, value: &str, focused: bool, masked: bool) {
    let (border, title) = if focused {
        (MedicalTheme::border_focused(), MedicalTheme::focused())
    } else {
        (MedicalTheme::border(), MedicalTheme::text_secondary())
    };
    let shown = if masked {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let mut spans = vec![Span::raw(" "), Span::styled(shown, MedicalTheme::text())];
    if focused {
        spans.push(Span::styled("▌", MedicalTheme::cursor()));
    }
    let block = Block::default()
        .title(Span::styled(format!(" {label} "), title))
        .borders(Borders::ALL)
        .border_style(border);
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// "[key] desc" pairs on one line.
#[must_use]
pub fn key_hints(hints: &[(&'static str, &'static str)]) -> Line<'static> {
    let spans = hints
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                Span::styled(format!("{desc}  "), MedicalTheme::key_desc()),
            ]
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

/// Screen title bar, as on every screen.
pub fn render_title(f: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(title.to_string(), MedicalTheme::title()),
        Span::styled(format!(" │ {subtitle}"), MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(header, area);
}
