use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;

use super::{
    errors::{AuthError, StoreError},
    jwt::JwtKeys,
    password::PasswordHasher,
    repo::UserStore,
    repo_types::{NewUser, User},
};

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registration and login over a credential store.
///
/// Both operations return a freshly signed session token. Failures are
/// typed; logging and response formatting happen at the HTTP boundary.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, keys: JwtKeys) -> Self {
        Self {
            store,
            hasher: Arc::new(hasher),
            keys,
        }
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);

        if name.is_empty() {
            return Err(AuthError::Validation("Name must not be empty.".into()));
        }
        if !is_valid_email(&email) {
            return Err(AuthError::Validation("Invalid email.".into()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password must not be empty.".into()));
        }

        if self.store.exists_by_email(&email).await? {
            return Err(AuthError::DuplicateEmail);
        }

        let hasher = Arc::clone(&self.hasher);
        let plain = password.to_owned();
        let password_hash = run_blocking(move || hasher.hash(&plain)).await?;

        let user = self
            .store
            .save(NewUser {
                name: name.to_owned(),
                email,
                password_hash,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent registration
                StoreError::Conflict => AuthError::DuplicateEmail,
                other => AuthError::Storage(other),
            })?;

        // The user is persisted at this point; a signing failure leaves it
        // in place and surfaces as a server error.
        Ok(self.keys.issue_for(&user)?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = self.authenticate(email, password).await?;
        Ok(self.keys.issue_for(&user)?)
    }

    /// Resolve credentials to a stored user. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        let found = self.store.find_by_email(&email).await?;

        let hasher = Arc::clone(&self.hasher);
        let plain = password.to_owned();
        match found {
            Some(user) => {
                let hash = user.password_hash.clone();
                let matches = run_blocking(move || hasher.verify(&plain, &hash)).await?;
                if matches {
                    Ok(user)
                } else {
                    Err(AuthError::InvalidCredentials)
                }
            }
            None => {
                run_blocking(move || {
                    hasher.verify_dummy(&plain);
                    Ok(())
                })
                .await?;
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Run CPU-bound hashing on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Internal(format!("blocking task failed: {e}")))?
}
