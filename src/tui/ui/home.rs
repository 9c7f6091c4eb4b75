//! Landing screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{key_hints, render_title};
use crate::application::{AppContext, BackendStatus};
use crate::tui::styles::MedicalTheme;

pub fn render_home(f: &mut Frame, area: Rect, ctx: &AppContext) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    render_title(f, chunks[0], "NephroGuard", "CKD screening for patients on HIV therapy");

    let status = match ctx.backend_status() {
        BackendStatus::Unknown => Span::styled("checking...", MedicalTheme::text_muted()),
        BackendStatus::Online => Span::styled("online", MedicalTheme::success()),
        BackendStatus::Unreachable => Span::styled("unreachable", MedicalTheme::danger()),
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Chronic kidney disease screening with tenofovir (TDF) safety advice.",
            MedicalTheme::text(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "1. Upload a lab report or enter values by hand.",
            MedicalTheme::text_secondary(),
        )),
        Line::from(Span::styled(
            "2. Run the diagnosis to get CKD stage, eGFR and the TDF advisory.",
            MedicalTheme::text_secondary(),
        )),
        Line::from(Span::styled(
            "3. Save the record and print daily reports from History.",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Clinical services: ", MedicalTheme::text_secondary()),
            status,
        ]),
    ];
    if ctx.identity().is_none() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Press ", MedicalTheme::text_muted()),
            Span::styled("F2", MedicalTheme::key_hint()),
            Span::styled(" to log in.", MedicalTheme::text_muted()),
        ]));
    }

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        );
    f.render_widget(body, chunks[1]);

    f.render_widget(
        Paragraph::new(key_hints(&[("F2", "Login"), ("F6", "Model performance")])),
        chunks[2],
    );
}
