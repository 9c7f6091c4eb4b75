//! Admin screen: staff roster and account creation.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};
use zeroize::Zeroize;

use super::{key_hints, render_input, render_title};
use crate::application::AppContext;
use crate::tui::styles::MedicalTheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminFocus {
    #[default]
    Roster,
    Username,
    Password,
}

#[derive(Default)]
pub struct AdminState {
    pub username: String,
    pub password: String,
    pub focus: AdminFocus,
    pub selected: usize,
    /// Roster id awaiting a second Delete press.
    pub pending_removal: Option<u32>,
}

impl AdminState {
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            AdminFocus::Roster => AdminFocus::Username,
            AdminFocus::Username => AdminFocus::Password,
            AdminFocus::Password => AdminFocus::Roster,
        };
        self.pending_removal = None;
    }

    pub fn input_char(&mut self, c: char) {
        match self.focus {
            AdminFocus::Username => self.username.push(c),
            AdminFocus::Password => self.password.push(c),
            AdminFocus::Roster => {}
        }
    }

    pub fn delete_char(&mut self) {
        match self.focus {
            AdminFocus::Username => {
                self.username.pop();
            }
            AdminFocus::Password => {
                self.password.pop();
            }
            AdminFocus::Roster => {}
        }
    }

    /// Clear the form after a request has been queued.
    pub fn clear_form(&mut self) {
        self.username.clear();
        self.password.zeroize();
    }
}

impl Drop for AdminState {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

pub fn render_admin(f: &mut Frame, area: Rect, ctx: &AppContext, state: &AdminState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    render_title(f, chunks[0], "Admin", "Staff accounts");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_roster(f, columns[0], ctx, state);
    render_create_form(f, columns[1], ctx, state);

    f.render_widget(
        Paragraph::new(key_hints(&[
            ("Tab", "Focus"),
            ("↑↓", "Select"),
            ("Del", "Remove access"),
            ("Ctrl+E", "Edit"),
            ("Enter", "Create account"),
        ])),
        chunks[2],
    );
}

fn render_roster(f: &mut Frame, area: Rect, ctx: &AppContext, state: &AdminState) {
    let header = Row::new(["ID", "Username", "Role", "Status"]).style(MedicalTheme::header());
    let rows = ctx.roster().iter().map(|e| {
        let style = if state.pending_removal == Some(e.id) {
            MedicalTheme::danger()
        } else {
            MedicalTheme::text()
        };
        Row::new(vec![
            e.id.to_string(),
            e.username.clone(),
            e.role.to_string(),
            e.status.to_string(),
        ])
        .style(style)
    });

    let border = if state.focus == AdminFocus::Roster {
        MedicalTheme::border_focused()
    } else {
        MedicalTheme::border()
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Percentage(45),
            Constraint::Length(8),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(Span::styled(" Roster ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(border),
    )
    .row_highlight_style(MedicalTheme::selected());

    let mut table_state = TableState::default().with_selected(Some(state.selected));
    f.render_stateful_widget(table, area, &mut table_state);
}

fn render_create_form(f: &mut Frame, area: Rect, ctx: &AppContext, state: &AdminState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    render_input(
        f,
        rows[0],
        "New username",
        &state.username,
        state.focus == AdminFocus::Username,
        false,
    );
    render_input(
        f,
        rows[1],
        "New password",
        &state.password,
        state.focus == AdminFocus::Password,
        true,
    );

    let status = if ctx.is_creating_account() {
        Span::styled("Creating account...", MedicalTheme::warning())
    } else if state.pending_removal.is_some() {
        Span::styled("Press Del again to confirm removal.", MedicalTheme::danger())
    } else {
        Span::styled("New accounts are created with the user role.", MedicalTheme::text_muted())
    };
    f.render_widget(Paragraph::new(vec![Line::from(""), Line::from(status)]), rows[2]);
}
