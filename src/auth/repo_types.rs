use sqlx::FromRow;
use time::OffsetDateTime;

use super::claims::TokenSubject;

/// User record in the credential store.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,                    // assigned by the store
    pub name: String,               // display name
    pub email: String,              // normalized, unique
    pub password_hash: String,      // Argon2 PHC string, never the plaintext
    pub created_at: OffsetDateTime, // set once at registration
}

/// A user that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl TokenSubject for User {
    fn email(&self) -> &str {
        &self.email
    }

    fn user_id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
