use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::context::SessionContext;

pub type SharedContext = Arc<Mutex<SessionContext>>;

/// Live session contexts keyed by session id. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SharedContext>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> (Uuid, SharedContext) {
        let id = Uuid::new_v4();
        let ctx = Arc::new(Mutex::new(SessionContext::new(id)));
        self.sessions.write().await.insert(id, Arc::clone(&ctx));
        info!("Session {id} created");
        (id, ctx)
    }

    /// Looks up a session and marks it as recently used.
    pub async fn get(&self, id: Uuid) -> Result<SharedContext, AppError> {
        let ctx = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        ctx.lock().await.touch();
        Ok(ctx)
    }

    /// Ends a session. Its context, and any document it holds, is dropped.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Session {id} ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session idle for longer than `idle`. Sessions whose context
    /// is currently locked are in use and are skipped.
    pub async fn purge_idle(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, ctx| match ctx.try_lock() {
            Ok(ctx) if now.duration_since(ctx.idle_since()) > idle => {
                debug!("Session {id} expired");
                false
            }
            _ => true,
        });
        let purged = before - sessions.len();
        if purged > 0 {
            info!("Expired {purged} idle session(s)");
        }
        purged
    }

    /// Runs [`purge_idle`](Self::purge_idle) periodically in the background.
    pub fn spawn_sweeper(&self, idle: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = (idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                store.purge_idle(idle).await;
            }
        })
    }
}
