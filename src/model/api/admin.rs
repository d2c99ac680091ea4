use argon2::Config;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::db::admin::Admin;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw admin credentials, received from a user. These are never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error(
        "username must be non-empty and password at least {} characters",
        MIN_PASSWORD_LENGTH
    )]
    Unacceptable,
    #[error(transparent)]
    Hash(#[from] argon2::Error),
}

impl TryFrom<AdminCredentials> for Admin {
    type Error = CredentialsError;

    /// Convert [`AdminCredentials`] to a new [`Admin`] by hashing the password.
    /// This enforces that the username is non-empty, and the password meets minimum length.
    fn try_from(cred: AdminCredentials) -> Result<Self, Self::Error> {
        if cred.username.trim().is_empty() || cred.password.len() < MIN_PASSWORD_LENGTH {
            return Err(CredentialsError::Unacceptable);
        }

        // 16 bytes is recommended for password hashing.
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(cred.password.as_bytes(), &salt, &Config::default())?;
        Ok(Self {
            username: cred.username,
            password_hash,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let admin = Admin::try_from(AdminCredentials::example()).unwrap();
        assert_eq!(admin.username, AdminCredentials::example().username);
        assert_ne!(admin.password_hash, AdminCredentials::example().password);
        assert!(admin.verify_password(AdminCredentials::example().password));
        assert!(!admin.verify_password("wrongpassword"));
    }

    #[test]
    fn salts_differ() {
        let first = Admin::try_from(AdminCredentials::example()).unwrap();
        let second = Admin::try_from(AdminCredentials::example()).unwrap();
        assert_ne!(first.password_hash, second.password_hash);
    }

    #[test]
    fn reject_unacceptable_credentials() {
        assert!(matches!(
            Admin::try_from(AdminCredentials::empty()),
            Err(CredentialsError::Unacceptable)
        ));
        let short = AdminCredentials {
            username: "comelec".into(),
            password: "short".into(),
        };
        assert!(matches!(
            Admin::try_from(short),
            Err(CredentialsError::Unacceptable)
        ));
    }
}
