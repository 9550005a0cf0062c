//! View invalidation after committed writes
//!
//! Lifecycle operations announce which views became stale once their write
//! has succeeded. Announcing is fire-and-forget: an invalidation failure is
//! logged and never turns a successful write into an error.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

/// A stale view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "project_id", rename_all = "snake_case")]
pub enum ViewScope {
    /// `/projects`
    ProjectList,

    /// `/projects/{id}`
    Project(Uuid),
}

impl ViewScope {
    pub fn path(&self) -> String {
        match self {
            ViewScope::ProjectList => "/projects".to_string(),
            ViewScope::Project(id) => format!("/projects/{}", id),
        }
    }
}

impl fmt::Display for ViewScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalidation failed: {0}")]
pub struct InvalidationError(pub String);

#[async_trait]
pub trait ViewInvalidator: Send + Sync {
    async fn invalidate(&self, scope: ViewScope) -> Result<(), InvalidationError>;
}

/// Invalidates each scope in turn, logging failures
pub async fn announce(invalidator: &dyn ViewInvalidator, scopes: &[ViewScope]) {
    for scope in scopes {
        if let Err(err) = invalidator.invalidate(*scope).await {
            warn!(path = %scope, error = %err, "View invalidation failed");
        }
    }
}

/// Fans scopes out to every subscriber of a broadcast channel
#[derive(Clone)]
pub struct BroadcastInvalidator {
    sender: broadcast::Sender<ViewScope>,
}

impl BroadcastInvalidator {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewScope> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastInvalidator {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ViewInvalidator for BroadcastInvalidator {
    async fn invalidate(&self, scope: ViewScope) -> Result<(), InvalidationError> {
        // No subscribers is not a failure; nothing is cached anywhere.
        match self.sender.send(scope) {
            Ok(receivers) => debug!(path = %scope, receivers, "Invalidated view"),
            Err(_) => debug!(path = %scope, "Invalidated view with no subscribers"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_paths() {
        let id = Uuid::nil();
        assert_eq!(ViewScope::ProjectList.path(), "/projects");
        assert_eq!(
            ViewScope::Project(id).to_string(),
            "/projects/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_scope_serialization() {
        let json = serde_json::to_value(ViewScope::Project(Uuid::nil())).unwrap();
        assert_eq!(json["scope"], "project");
        assert_eq!(
            serde_json::to_value(ViewScope::ProjectList).unwrap()["scope"],
            "project_list"
        );
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let invalidator = BroadcastInvalidator::new(8);
        let mut rx = invalidator.subscribe();

        announce(&invalidator, &[ViewScope::ProjectList]).await;
        assert_eq!(rx.recv().await.unwrap(), ViewScope::ProjectList);
    }

    #[tokio::test]
    async fn test_without_subscribers_is_ok() {
        let invalidator = BroadcastInvalidator::default();
        assert!(invalidator.invalidate(ViewScope::ProjectList).await.is_ok());
    }
}
