//! Screen navigation with a declarative guard table.

use crate::domain::Identity;

/// Screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    Login,
    Upload,
    Prediction,
    Performance,
    Admin,
    History,
}

/// Who may enter a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AdminOnly,
}

impl Screen {
    pub const ALL: [Screen; 7] = [
        Self::Home,
        Self::Login,
        Self::Upload,
        Self::Prediction,
        Self::Performance,
        Self::Admin,
        Self::History,
    ];

    /// The guard table.
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Home | Self::Login => Access::Public,
            Self::Upload | Self::Prediction | Self::Performance | Self::History => {
                Access::Authenticated
            }
            Self::Admin => Access::AdminOnly,
        }
    }

    #[must_use]
    pub fn permits(self, identity: Option<&Identity>) -> bool {
        match self.access() {
            Access::Public => true,
            Access::Authenticated => identity.is_some(),
            Access::AdminOnly => identity.is_some_and(Identity::is_admin),
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Login => "Login",
            Self::Upload => "Upload",
            Self::Prediction => "Prediction",
            Self::Performance => "Analysis",
            Self::Admin => "Admin",
            Self::History => "History",
        }
    }
}

/// Direct-jump state machine over [`Screen`]. No back stack.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Screen,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            current: Screen::Home,
        }
    }
}

impl Navigator {
    #[must_use]
    pub fn current(&self) -> Screen {
        self.current
    }

    /// Move to `target` if its guard admits `identity`.
    ///
    /// Refusal is silent: the current screen is kept and `false` returned.
    pub fn navigate(&mut self, target: Screen, identity: Option<&Identity>) -> bool {
        if !target.permits(identity) {
            tracing::debug!(?target, "Navigation refused by guard");
            return false;
        }
        if self.current != target {
            tracing::debug!(from = ?self.current, to = ?target, "Navigating");
        }
        self.current = target;
        true
    }

    pub fn go_home(&mut self) {
        self.current = Screen::Home;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    const GATED: [Screen; 5] = [
        Screen::Upload,
        Screen::Prediction,
        Screen::Performance,
        Screen::History,
        Screen::Admin,
    ];

    #[test]
    fn test_anonymous_refused_everywhere_gated() {
        for start in [Screen::Home, Screen::Login] {
            for target in GATED {
                let mut nav = Navigator::default();
                assert!(nav.navigate(start, None));
                assert!(!nav.navigate(target, None), "{target:?} should be refused");
                assert_eq!(nav.current(), start);
            }
        }
    }

    #[test]
    fn test_user_refused_admin_only() {
        let user = Identity::new("nurse", Role::User);
        let mut nav = Navigator::default();
        assert!(nav.navigate(Screen::History, Some(&user)));
        assert!(!nav.navigate(Screen::Admin, Some(&user)));
        assert_eq!(nav.current(), Screen::History);
    }

    #[test]
    fn test_admin_reaches_every_screen() {
        let admin = Identity::new("admin", Role::Admin);
        let mut nav = Navigator::default();
        for target in Screen::ALL {
            assert!(nav.navigate(target, Some(&admin)));
            assert_eq!(nav.current(), target);
        }
    }

    #[test]
    fn test_go_home_from_admin() {
        let admin = Identity::new("admin", Role::Admin);
        let mut nav = Navigator::default();
        nav.navigate(Screen::Admin, Some(&admin));
        nav.go_home();
        assert_eq!(nav.current(), Screen::Home);
    }

    #[test]
    fn test_public_screens_always_open() {
        for target in Screen::ALL {
            if target.access() == Access::Public {
                assert!(target.permits(None));
            } else {
                assert!(!target.permits(None));
            }
        }
    }
}
