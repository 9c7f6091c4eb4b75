//! Prediction screen: the clinical form, the verdict, and saving.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use super::{key_hints, render_title};
use crate::application::AppContext;
use crate::domain::{DiagnosisResult, FieldKind, FormField};
use crate::tui::styles::MedicalTheme;

/// Rows: every form field, then the patient name.
pub const ROW_COUNT: usize = FormField::ALL.len() + 1;

#[derive(Debug, Default)]
pub struct PredictionState {
    pub selected: usize,
    pub patient_name: String,
}

impl PredictionState {
    /// The form field under the cursor; `None` on the patient-name row.
    #[must_use]
    pub fn selected_field(&self) -> Option<FormField> {
        FormField::ALL.get(self.selected).copied()
    }

    pub fn next_row(&mut self) {
        self.selected = (self.selected + 1) % ROW_COUNT;
    }

    pub fn prev_row(&mut self) {
        self.selected = (self.selected + ROW_COUNT - 1) % ROW_COUNT;
    }
}

pub fn render_prediction(f: &mut Frame, area: Rect, ctx: &AppContext, state: &PredictionState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let subtitle = if ctx.is_predicting() {
        "Scoring..."
    } else {
        "Review the values, then run the diagnosis"
    };
    render_title(f, chunks[0], "Prediction", subtitle);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_form(f, columns[0], ctx, state);
    render_result(f, columns[1], ctx);

    f.render_widget(
        Paragraph::new(key_hints(&[
            ("↑↓", "Field"),
            ("←→", "Change option"),
            ("Enter", "Diagnose"),
            ("Ctrl+S", "Save record"),
            ("Ctrl+R", "Reset"),
        ])),
        chunks[2],
    );
}

fn render_form(f: &mut Frame, area: Rect, ctx: &AppContext, state: &PredictionState) {
    let form = ctx.form();
    let mut rows: Vec<Row> = FormField::ALL
        .iter()
        .map(|&field| {
            let value = form.get(field);
            let value_cell = match field.kind() {
                FieldKind::Choice(_) => Cell::from(Line::from(vec![
                    Span::styled("‹ ", MedicalTheme::text_muted()),
                    Span::styled(value, MedicalTheme::text()),
                    Span::styled(" ›", MedicalTheme::text_muted()),
                ])),
                FieldKind::Text if value.is_empty() => {
                    Cell::from(Span::styled("-", MedicalTheme::text_muted()))
                }
                FieldKind::Text if field != FormField::BloodPressure && !form.is_numeric(field) => {
                    Cell::from(Span::styled(value, MedicalTheme::warning()))
                }
                FieldKind::Text => Cell::from(Span::styled(value, MedicalTheme::text())),
            };
            Row::new(vec![
                Cell::from(Span::styled(field.label(), MedicalTheme::text_secondary())),
                value_cell,
            ])
        })
        .collect();
    rows.push(Row::new(vec![
        Cell::from(Span::styled("Patient name", MedicalTheme::subtitle())),
        Cell::from(Span::styled(state.patient_name.clone(), MedicalTheme::text())),
    ]));

    let table = Table::new(rows, [Constraint::Percentage(55), Constraint::Percentage(45)])
        .block(
            Block::default()
                .title(Span::styled(" Clinical Form ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .row_highlight_style(MedicalTheme::selected());

    let mut table_state = TableState::default().with_selected(Some(state.selected));
    f.render_stateful_widget(table, area, &mut table_state);
}

fn render_result(f: &mut Frame, area: Rect, ctx: &AppContext) {
    let block = Block::default()
        .title(Span::styled(" Diagnosis ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let lines = match ctx.result() {
        Some(result) => result_lines(result, ctx.is_saving()),
        None if ctx.is_predicting() => vec![
            Line::from(""),
            Line::from(Span::styled("Waiting for the scoring service...", MedicalTheme::text_muted())),
        ],
        None => vec![
            Line::from(""),
            Line::from(Span::styled("No diagnosis yet.", MedicalTheme::text_muted())),
            Line::from(Span::styled(
                "Press Enter to score the current form.",
                MedicalTheme::text_muted(),
            )),
        ],
    };

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

fn result_lines(result: &DiagnosisResult, saving: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            result.prediction.clone(),
            MedicalTheme::verdict(result.is_negative()),
        )),
        Line::from(vec![
            Span::styled("Confidence: ", MedicalTheme::text_secondary()),
            Span::styled(result.confidence.clone(), MedicalTheme::text()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("CKD stage:  ", MedicalTheme::text_secondary()),
            Span::styled(result.stage.clone(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("eGFR:       ", MedicalTheme::text_secondary()),
            Span::styled(format!("{} mL/min/1.73m²", result.gfr), MedicalTheme::text()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("TDF: ", MedicalTheme::text_secondary()),
            Span::styled(result.tdf.status.clone(), MedicalTheme::tdf(result.tdf.color)),
        ]),
        Line::from(Span::styled(result.tdf.msg.clone(), MedicalTheme::text())),
    ];
    lines.push(Line::from(""));
    lines.push(if saving {
        Line::from(Span::styled("Saving record...", MedicalTheme::warning()))
    } else {
        Line::from(Span::styled(
            "Enter the patient name (last row) and press Ctrl+S to save.",
            MedicalTheme::text_muted(),
        ))
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_navigation_wraps_through_name_row() {
        let mut state = PredictionState::default();
        assert_eq!(state.selected_field(), Some(FormField::ALL[0]));
        state.prev_row();
        assert_eq!(state.selected, ROW_COUNT - 1);
        assert!(state.selected_field().is_none());
        state.next_row();
        assert_eq!(state.selected, 0);
    }
}
