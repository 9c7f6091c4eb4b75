//! Upload screen: choose a lab report, or skip to manual entry.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{key_hints, render_input, render_title};
use crate::ports::ACCEPTED_EXTENSIONS;
use crate::tui::styles::MedicalTheme;

#[derive(Debug, Default)]
pub struct UploadState {
    pub path: String,
}

pub fn render_upload(f: &mut Frame, area: Rect, state: &UploadState, busy: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_title(f, chunks[0], "Upload", "Extract values from a lab report");
    render_input(f, chunks[1], "Report file path", &state.path, !busy, false);

    let status = if busy {
        Line::from(Span::styled(
            "Parsing document... uploads are disabled until it finishes.",
            MedicalTheme::warning(),
        ))
    } else {
        Line::from(Span::styled(
            "The parsed values replace the current form; review them before scoring.",
            MedicalTheme::text_secondary(),
        ))
    };
    let info = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Accepted: ", MedicalTheme::text_secondary()),
            Span::styled(
                ACCEPTED_EXTENSIONS
                    .iter()
                    .map(|e| format!(".{e}"))
                    .collect::<Vec<_>>()
                    .join(" "),
                MedicalTheme::text(),
            ),
        ]),
        Line::from(""),
        status,
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(info, chunks[2]);

    f.render_widget(
        Paragraph::new(key_hints(&[
            ("Enter", "Parse report"),
            ("F4", "Manual entry"),
            ("Esc", "Clear"),
        ])),
        chunks[3],
    );
}
