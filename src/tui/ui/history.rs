//! History screen: stored records, search, record view, daily report.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use super::{key_hints, render_input, render_title};
use crate::application::{AppContext, HistoryStatus};
use crate::domain::{is_negative_label, PatientRecord};
use crate::tui::styles::MedicalTheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFocus {
    #[default]
    Search,
    Date,
}

#[derive(Debug)]
pub struct HistoryState {
    pub query: String,
    /// Date prefix for the daily report, "YYYY-MM-DD"
    pub report_date: String,
    pub focus: HistoryFocus,
    pub selected: usize,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self {
            query: String::new(),
            report_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            focus: HistoryFocus::default(),
            selected: 0,
        }
    }
}

impl HistoryState {
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            HistoryFocus::Search => HistoryFocus::Date,
            HistoryFocus::Date => HistoryFocus::Search,
        };
    }

    pub fn input_char(&mut self, c: char) {
        match self.focus {
            HistoryFocus::Search => {
                self.query.push(c);
                self.selected = 0;
            }
            HistoryFocus::Date => self.report_date.push(c),
        }
    }

    pub fn delete_char(&mut self) {
        match self.focus {
            HistoryFocus::Search => {
                self.query.pop();
                self.selected = 0;
            }
            HistoryFocus::Date => {
                self.report_date.pop();
            }
        }
    }

    /// Keep the cursor inside a list of `len` rows.
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

pub fn render_history(f: &mut Frame, area: Rect, ctx: &AppContext, state: &HistoryState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_title(f, chunks[0], "History", "Saved patient records");

    let inputs = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);
    render_input(
        f,
        inputs[0],
        "Search name / staff / diagnosis",
        &state.query,
        state.focus == HistoryFocus::Search,
        false,
    );
    render_input(
        f,
        inputs[1],
        "Report date",
        &state.report_date,
        state.focus == HistoryFocus::Date,
        false,
    );

    let hits = ctx.search_history(&state.query);
    render_table(f, chunks[2], ctx.history_status(), &hits, state.selected);

    f.render_widget(
        Paragraph::new(key_hints(&[
            ("Tab", "Search/Date"),
            ("↑↓", "Select"),
            ("Enter", "View record"),
            ("Ctrl+E", "Print daily report"),
            ("F5", "Refresh"),
        ])),
        chunks[3],
    );

    if let Some(record) = ctx.selected_record() {
        render_record(f, area, record);
    }
}

fn render_table(
    f: &mut Frame,
    area: Rect,
    status: HistoryStatus,
    hits: &[&PatientRecord],
    selected: usize,
) {
    let title = match status {
        HistoryStatus::Loading => " Records (loading...) ".to_string(),
        HistoryStatus::Failed => " Records (could not be loaded) ".to_string(),
        _ => format!(" Records ({}) ", hits.len()),
    };
    let block = Block::default()
        .title(Span::styled(title, MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    if hits.is_empty() {
        let message = match status {
            HistoryStatus::Loading => "Loading...",
            HistoryStatus::Failed => "History is unavailable. Press F5 to retry.",
            _ => "No matching records.",
        };
        f.render_widget(
            Paragraph::new(Span::styled(message, MedicalTheme::text_muted())).block(block),
            area,
        );
        return;
    }

    let header = Row::new(["Date", "Name", "Age / Gender", "Diagnosis", "Stage", "TDF", "By"])
        .style(MedicalTheme::header());
    let rows = hits.iter().map(|r| {
        let diagnosis_style = MedicalTheme::verdict(is_negative_label(&r.diagnosis));
        Row::new(vec![
            Cell::from(r.date.clone()),
            Cell::from(r.name.clone()),
            Cell::from(r.age_gender()),
            Cell::from(Span::styled(r.diagnosis.clone(), diagnosis_style)),
            Cell::from(r.stage.clone()),
            Cell::from(r.tdf_status.clone()),
            Cell::from(r.created_by.clone()),
        ])
        .style(MedicalTheme::text())
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Percentage(20),
            Constraint::Length(14),
            Constraint::Percentage(20),
            Constraint::Length(9),
            Constraint::Length(16),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(MedicalTheme::selected());

    let mut table_state = TableState::default().with_selected(Some(selected));
    f.render_stateful_widget(table, area, &mut table_state);
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Single-record report drawn over the list.
fn render_record(f: &mut Frame, area: Rect, record: &PatientRecord) {
    let popup = centered(area, 70, 70);
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<14}"), MedicalTheme::text_secondary()),
            Span::styled(value, MedicalTheme::text()),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled(record.name.clone(), MedicalTheme::title())),
        Line::from(""),
        field("Date", record.date.clone()),
        field("Age / Gender", record.age_gender()),
        Line::from(vec![
            Span::styled(format!("{:<14}", "Diagnosis"), MedicalTheme::text_secondary()),
            Span::styled(
                record.diagnosis.clone(),
                MedicalTheme::verdict(is_negative_label(&record.diagnosis)),
            ),
        ]),
        field("CKD stage", record.stage.clone()),
        field("eGFR", record.gfr.clone()),
        field("TDF status", record.tdf_status.clone()),
        field("Recorded by", record.created_by.clone()),
    ];
    if !record.extra.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Clinical values", MedicalTheme::subtitle())));
        for (key, value) in &record.extra {
            let text = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            lines.push(field(key, text));
        }
    }
    lines.push(Line::from(""));
    lines.push(key_hints(&[("Ctrl+P", "Print"), ("Esc", "Close")]));

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(Span::styled(" Patient Report ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border_focused()),
        ),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_report_date_is_today() {
        let state = HistoryState::default();
        assert_eq!(state.report_date.len(), 10);
        assert_eq!(state.report_date, chrono::Local::now().format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_typing_resets_selection() {
        let mut state = HistoryState {
            selected: 4,
            ..HistoryState::default()
        };
        state.input_char('j');
        assert_eq!(state.selected, 0);
        assert_eq!(state.query, "j");

        state.toggle_focus();
        state.delete_char();
        assert_eq!(state.report_date.len(), 9);
        state.clamp(0);
        assert_eq!(state.selected, 0);
    }
}
