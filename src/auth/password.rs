use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use super::errors::AuthError;
use crate::config::HashConfig;

/// Salted Argon2id hashing with a fixed cost profile.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Verified against when the email is unknown, so both login failure
    // paths cost one full hash. It uses the current cost profile, so users
    // stored under older params still verify at their own cost.
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cfg: &HashConfig) -> Result<Self, AuthError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| AuthError::Hashing(format!("invalid argon2 parameters: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, SaltString::generate(&mut OsRng).as_str())?;
        Ok(Self { argon2, dummy_hash })
    }

    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        hash_with(&self.argon2, plain)
    }

    /// `Ok(false)` on mismatch; an unparseable stored hash is an error.
    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::Hashing(format!("invalid stored hash: {e}")))?;
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(format!("verify error: {e}"))),
        }
    }

    /// Burn the same work as a real verification. Always fails.
    pub fn verify_dummy(&self, plain: &str) {
        // outcome is irrelevant, only the work matters
        let _ = self.verify(plain, &self.dummy_hash);
    }
}

fn hash_with(argon2: &Argon2<'_>, plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .to_string();
    Ok(hash)
}

#[cfg(test)]
pub(crate) fn cheap_config() -> HashConfig {
    HashConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}
