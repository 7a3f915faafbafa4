use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::{
    claims::{Claims, TokenSubject},
    errors::TokenError,
};
use crate::config::JwtConfig;

/// Fixed session lifetime.
pub const TOKEN_TTL: Duration = Duration::hours(24);

/// HS256 signing and verification keys, built once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::from_secret(&cfg.secret)
    }

    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a token for `email`, valid for [`TOKEN_TTL`] from now.
    pub fn issue(
        &self,
        email: &str,
        user_id: i64,
        display_name: &str,
    ) -> Result<String, TokenError> {
        self.issue_at(email, user_id, display_name, OffsetDateTime::now_utc())
    }

    pub fn issue_for<S: TokenSubject + ?Sized>(&self, subject: &S) -> Result<String, TokenError> {
        self.issue(subject.email(), subject.user_id(), subject.display_name())
    }

    fn issue_at(
        &self,
        email: &str,
        user_id: i64,
        display_name: &str,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: email.to_owned(),
            user_id,
            full_name: display_name.to_owned(),
            iat: now.unix_timestamp(),
            exp: (now + TOKEN_TTL).unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    /// Check signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token).map(|claims| claims.sub)
    }
}
