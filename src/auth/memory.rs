//! In-process user store for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    errors::StoreError,
    repo::UserStore,
    repo_types::{NewUser, User},
};

#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    by_email: HashMap<String, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.by_email.get(email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.by_email.contains_key(email))
    }

    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        // check and insert under one lock
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(&user.email) {
            return Err(StoreError::Conflict);
        }
        inner.last_id += 1;
        let stored = User {
            id: inner.last_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: user.created_at,
        };
        inner.by_email.insert(stored.email.clone(), stored.clone());
        Ok(stored)
    }
}
