use serde::{Deserialize, Serialize};

/// Username of the bootstrap admin created when none exist.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// An admin user, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub username: String,
    pub password_hash: String,
}

impl Admin {
    /// Check whether the given password is correct.
    /// A malformed stored hash never verifies.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}
