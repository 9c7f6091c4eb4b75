//! Model performance screen. Static figures from the validation run.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::render_title;
use crate::tui::styles::MedicalTheme;

/// Published validation metric for one candidate model, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMetric {
    pub model: &'static str,
    pub accuracy: u16,
    pub precision: u16,
    pub recall: u16,
}

pub const MODEL_METRICS: [ModelMetric; 5] = [
    ModelMetric { model: "DNN", accuracy: 99, precision: 99, recall: 98 },
    ModelMetric { model: "XGBoost", accuracy: 97, precision: 95, recall: 96 },
    ModelMetric { model: "KNN", accuracy: 97, precision: 95, recall: 96 },
    ModelMetric { model: "Random Forest", accuracy: 95, precision: 95, recall: 94 },
    ModelMetric { model: "SVM", accuracy: 93, precision: 91, recall: 92 },
];

fn bar(percent: u16) -> String {
    let filled = usize::from(percent.min(100) / 5);
    format!("{}{} {percent}%", "█".repeat(filled), "░".repeat(20 - filled))
}

pub fn render_performance(f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    render_title(f, chunks[0], "Model Performance", "Validation results of candidate models");

    let header = Row::new(["Model", "Accuracy", "Precision", "Recall"]).style(MedicalTheme::header());
    let rows = MODEL_METRICS.iter().map(|m| {
        Row::new(vec![
            Cell::from(Span::styled(m.model, MedicalTheme::text())),
            Cell::from(Span::styled(bar(m.accuracy), MedicalTheme::metric(m.accuracy))),
            Cell::from(Span::styled(bar(m.precision), MedicalTheme::metric(m.precision))),
            Cell::from(Span::styled(bar(m.recall), MedicalTheme::metric(m.recall))),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(15),
            Constraint::Length(26),
            Constraint::Length(26),
            Constraint::Min(26),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(table, chunks[1]);

    f.render_widget(
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "The deep neural network scored best and serves all predictions.",
                MedicalTheme::text_secondary(),
            )),
        ]),
        chunks[2],
    );
}
