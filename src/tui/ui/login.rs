//! Login screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame,
};
use zeroize::Zeroize;

use super::{key_hints, render_input, render_title};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Default)]
pub struct LoginState {
    pub username: String,
    pub password: String,
    pub focus: LoginField,
}

impl LoginState {
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn input_char(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    pub fn delete_char(&mut self) {
        self.focused_mut().pop();
    }

    /// Wipe the password buffer once it has been handed off.
    pub fn clear_password(&mut self) {
        self.password.zeroize();
    }
}

impl Drop for LoginState {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

pub fn render_login(f: &mut Frame, area: Rect, state: &LoginState, busy: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let subtitle = if busy { "Signing in..." } else { "Staff sign-in" };
    render_title(f, chunks[0], "Login", subtitle);
    render_input(
        f,
        chunks[1],
        "Username",
        &state.username,
        state.focus == LoginField::Username,
        false,
    );
    render_input(
        f,
        chunks[2],
        "Password",
        &state.password,
        state.focus == LoginField::Password,
        true,
    );
    f.render_widget(
        Paragraph::new(key_hints(&[("Tab", "Switch field"), ("Enter", "Log in")])),
        chunks[4],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_follows_focus() {
        let mut state = LoginState::default();
        for c in "admin".chars() {
            state.input_char(c);
        }
        state.toggle_focus();
        state.input_char('1');
        state.input_char('2');
        state.delete_char();
        assert_eq!(state.username, "admin");
        assert_eq!(state.password, "1");
        state.clear_password();
        assert!(state.password.is_empty());
    }
}
