//! Session persistence trait.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::Result;
use crate::tokens::SessionToken;

/// Persists session tokens across runs.
///
/// The authenticator saves the token after every successful renewal and
/// never after an authentication failure.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the previously saved session, if any.
    async fn load(&self) -> Result<Option<SessionToken>>;

    /// Save a refreshed session.
    async fn save(&self, token: &SessionToken) -> Result<()>;
}

/// In-memory store, useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<SessionToken>>,
    saves: Mutex<usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: SessionToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
            saves: Mutex::new(0),
        }
    }

    /// How many times `save` was called.
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }

    pub async fn current(&self) -> Option<SessionToken> {
        self.token.lock().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<SessionToken>> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &SessionToken) -> Result<()> {
        *self.token.lock().await = Some(token.clone());
        *self.saves.lock().await += 1;
        Ok(())
    }
}
