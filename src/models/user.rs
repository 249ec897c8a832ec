use chrono::NaiveDateTime;

/// Lagrad användare. Lösenordet finns bara som saltad hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: Option<String>,
}

/// Inloggad session, skickas explicit till vyerna
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub logged_in_at: NaiveDateTime,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            logged_in_at: chrono::Local::now().naive_local(),
        }
    }
}
