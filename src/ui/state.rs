use crate::models::Session;

/// Aktuell vy i applikationen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Projects,
    WeeklyUpdate,
    Milestones,
    Reports,
}

impl View {
    pub fn all() -> &'static [Self] {
        &[
            Self::Dashboard,
            Self::Projects,
            Self::WeeklyUpdate,
            Self::Milestones,
            Self::Reports,
        ]
    }

    /// Etikett i navigeringen
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "📊 Översikt",
            Self::Projects => "📁 Projekt",
            Self::WeeklyUpdate => "📝 Veckouppdatering",
            Self::Milestones => "🏁 Milstolpar",
            Self::Reports => "📄 Rapporter",
        }
    }
}

/// Centraliserat applikationstillstånd
#[derive(Debug, Default)]
pub struct AppState {
    /// Aktuell vy
    pub current_view: View,

    /// Inloggad användare; None visar inloggningsskärmen
    pub session: Option<Session>,

    /// Valt projekt, delas mellan vyerna
    pub selected_project_id: Option<i64>,

    /// Statusmeddelande
    pub status_message: Option<StatusMessage>,

    /// Dark mode
    pub dark_mode: bool,

    /// Data har ändrats, vyer med cache ska läsa om
    pub data_changed: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn login(&mut self, session: Session) {
        self.session = Some(session);
        self.current_view = View::Dashboard;
        self.data_changed = true;
    }

    /// Logga ut och släpp sessionen
    pub fn logout(&mut self) {
        self.session = None;
        self.selected_project_id = None;
        self.current_view = View::Dashboard;
        self.status_message = None;
    }

    /// Navigera till vy
    pub fn navigate(&mut self, view: View) {
        self.current_view = view;
    }

    /// Visa statusmeddelande
    pub fn show_status(&mut self, message: &str, status_type: StatusType) {
        self.status_message = Some(StatusMessage {
            text: message.to_string(),
            status_type,
            created_at: std::time::Instant::now(),
        });
    }

    /// Visa framgångsmeddelande
    pub fn show_success(&mut self, message: &str) {
        self.show_status(message, StatusType::Success);
    }

    /// Visa felmeddelande (loggas också)
    pub fn show_error(&mut self, message: &str) {
        tracing::error!("{}", message);
        self.show_status(message, StatusType::Error);
    }

    pub fn show_warning(&mut self, message: &str) {
        tracing::warn!("{}", message);
        self.show_status(message, StatusType::Warning);
    }

    pub fn show_info(&mut self, message: &str) {
        self.show_status(message, StatusType::Info);
    }

    /// Rensa statusmeddelande om det är för gammalt
    pub fn clear_old_status(&mut self) {
        if let Some(ref status) = self.status_message {
            if status.created_at.elapsed().as_secs() > 8 {
                self.status_message = None;
            }
        }
    }
}

/// Statusmeddelande
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub status_type: StatusType,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    Success,
    Error,
    Info,
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_and_logout() {
        let mut state = AppState::new();
        assert!(!state.is_logged_in());

        state.navigate(View::Reports);
        state.login(Session::new("pm"));
        assert!(state.is_logged_in());
        assert_eq!(state.current_view, View::Dashboard);

        state.selected_project_id = Some(3);
        state.show_error("Något gick fel");
        state.logout();
        assert!(state.session.is_none());
        assert!(state.selected_project_id.is_none());
        assert!(state.status_message.is_none());
    }

    #[test]
    fn test_status_message() {
        let mut state = AppState::new();
        state.show_success("Sparat");
        let status = state.status_message.as_ref().unwrap();
        assert_eq!(status.text, "Sparat");
        assert_eq!(status.status_type, StatusType::Success);

        state.clear_old_status();
        assert!(state.status_message.is_some());
    }
}
