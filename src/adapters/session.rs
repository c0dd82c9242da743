use crate::domain::ports::SessionProvider;
use async_trait::async_trait;

/// Bearer token handed over by whoever logged the user in. It cannot be
/// renewed from here.
#[derive(Clone)]
pub struct StaticTokenSession {
    token: String,
}

impl StaticTokenSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenSession")
            .field("token", &"***")
            .finish()
    }
}

#[async_trait]
impl SessionProvider for StaticTokenSession {
    async fn authorization(&self) -> Option<String> {
        Some(format!("Bearer {}", self.token))
    }

    async fn on_unauthorized(&self) -> bool {
        tracing::warn!("Access token rejected by the server");
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSession;

#[async_trait]
impl SessionProvider for AnonymousSession {
    async fn authorization(&self) -> Option<String> {
        None
    }

    async fn on_unauthorized(&self) -> bool {
        false
    }
}
