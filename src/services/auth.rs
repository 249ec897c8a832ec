//! Inloggning och registrering
//!
//! Lösenord lagras som `pbkdf2-sha256$<iterationer>$<salt hex>$<hash hex>`.

use anyhow::Result;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::db::Database;
use crate::models::Session;
use crate::utils::AppError;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
pub const MIN_PASSWORD_LEN: usize = 8;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Hasha ett lösenord med ett nytt slumpat salt
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| AppError::other("Kunde inte generera salt"))?;

    Ok(hash_with_salt(password, &salt, PBKDF2_ITERATIONS))
}

fn hash_with_salt(password: &str, salt: &[u8], iterations: u32) -> String {
    let iterations = NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN);
    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(ALGORITHM, iterations, salt, password.as_bytes(), &mut hash);

    format!(
        "{}${}${}${}",
        HASH_SCHEME,
        iterations,
        hex::encode(salt),
        hex::encode(hash)
    )
}

/// Kontrollera ett lösenord mot en lagrad hash. Felformaterad hash ger false.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    if scheme != HASH_SCHEME {
        return false;
    }

    let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (hex::decode(salt), hex::decode(hash)) else {
        return false;
    };

    pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &hash).is_ok()
}

pub struct AuthService<'a> {
    db: &'a Database,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Finns det minst ett konto? Annars erbjuds att skapa det första.
    pub fn has_users(&self) -> Result<bool> {
        Ok(self.db.users().count()? > 0)
    }

    pub fn register(&self, username: &str, password: &str) -> Result<i64> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::validation("Användarnamn krävs").into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Lösenordet måste vara minst {} tecken",
                MIN_PASSWORD_LEN
            ))
            .into());
        }

        let hash = hash_password(password)?;
        let id = self.db.users().create(username, &hash)?;
        info!("Registrerade användare {}", username);
        Ok(id)
    }

    /// Logga in; alla misslyckanden ger samma generiska fel.
    /// Användarnamnet slås upp exakt som det angavs.
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let user = self.db.users().find_by_username(username)?;

        let accepted = match &user {
            Some(user) => verify_password(password, &user.password_hash),
            None => {
                // Samma arbete som för en känd användare
                let _ = verify_password(password, dummy_hash());
                false
            }
        };

        if !accepted {
            warn!("Misslyckad inloggning för {}", username);
            return Err(AppError::Auth.into());
        }

        info!("Inloggad: {}", username);
        Ok(Session::new(username))
    }
}

/// Beräknas en gång; okända användare kostar då en verifiering, precis som kända
fn dummy_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH.get_or_init(|| hash_with_salt("", &[0u8; SALT_LEN], PBKDF2_ITERATIONS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_error(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<AppError>(), Some(AppError::Auth))
    }

    #[test]
    fn test_hash_format_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        let parts: Vec<&str> = hash.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "pbkdf2-sha256");
        assert_eq!(parts[1], "100000");
        assert_eq!(parts[2].len(), SALT_LEN * 2);
        assert_eq!(parts[3].len(), HASH_LEN * 2);

        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("correct horsE", &hash));
    }

    #[test]
    fn test_salt_differs_between_hashes() {
        assert_ne!(hash_password("samepass").unwrap(), hash_password("samepass").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "pbkdf2-sha256$abc$00$00"));
        assert!(!verify_password("x", "pbkdf2-sha256$0$00$00"));
        assert!(!verify_password("x", "md5$1000$00$00"));
        assert!(!verify_password("x", "pbkdf2-sha256$1000$zz$00"));
        assert!(!verify_password("x", "pbkdf2-sha256$1000$00$00$extra"));
    }

    #[test]
    fn test_login_accepts_only_exact_pair() {
        let db = Database::open_in_memory().unwrap();
        let auth = AuthService::new(&db);
        assert!(!auth.has_users().unwrap());

        auth.register("pm", "s3cret-pass").unwrap();
        assert!(auth.has_users().unwrap());

        let session = auth.login("pm", "s3cret-pass").unwrap();
        assert_eq!(session.username, "pm");

        assert!(auth_error(&auth.login("pm", "wrong-pass").unwrap_err()));
        assert!(auth_error(&auth.login("PM", "s3cret-pass").unwrap_err()));
        assert!(auth_error(&auth.login("nobody", "s3cret-pass").unwrap_err()));
        assert!(auth_error(&auth.login(" pm", "s3cret-pass").unwrap_err()));
        assert!(auth_error(&auth.login("  pm ", "s3cret-pass").unwrap_err()));
        assert!(auth_error(&auth.login("pm\n", "s3cret-pass").unwrap_err()));
    }

    #[test]
    fn test_register_trims_username() {
        let db = Database::open_in_memory().unwrap();
        let auth = AuthService::new(&db);
        auth.register("  lead ", "s3cret-pass").unwrap();

        assert_eq!(auth.login("lead", "s3cret-pass").unwrap().username, "lead");
        assert!(auth_error(&auth.login("  lead ", "s3cret-pass").unwrap_err()));
    }

    #[test]
    fn test_dummy_hash_is_reused() {
        let first = dummy_hash();
        assert!(std::ptr::eq(first, dummy_hash()));
        assert!(verify_password("", first));
    }

    #[test]
    fn test_login_with_malformed_stored_hash() {
        let db = Database::open_in_memory().unwrap();
        db.users().create("legacy", "not-a-hash").unwrap();

        let err = AuthService::new(&db).login("legacy", "not-a-hash").unwrap_err();
        assert!(auth_error(&err));
    }

    #[test]
    fn test_register_validation() {
        let db = Database::open_in_memory().unwrap();
        let auth = AuthService::new(&db);

        let err = auth.register("  ", "longenough").unwrap_err();
        assert!(err.downcast_ref::<AppError>().is_some_and(AppError::is_validation));

        let err = auth.register("pm", "short").unwrap_err();
        assert!(err.downcast_ref::<AppError>().is_some_and(AppError::is_validation));

        auth.register("pm", "longenough").unwrap();
        let err = auth.register("pm", "otherpass").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::AlreadyExists(_))
        ));
    }
}
