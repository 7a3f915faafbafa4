use serde::{Deserialize, Serialize};

/// JWT payload shared with downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,       // user email
    pub user_id: i64,      // store-assigned id
    pub full_name: String, // display name
    pub iat: i64,          // issued at (unix timestamp)
    pub exp: i64,          // expires at (unix timestamp)
}

/// Anything that can be named in a session token.
pub trait TokenSubject {
    fn email(&self) -> &str;
    fn user_id(&self) -> i64;
    fn display_name(&self) -> &str;
}
