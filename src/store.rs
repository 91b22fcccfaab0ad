use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::message::Message;

#[derive(Debug)]
pub struct Session {
    pub thread_id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Session {
    fn new(thread_id: &str) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }
}

/// In-process conversation state, one session per thread id. The outer map
/// lock is held only for lookup and insert; a turn serializes against other
/// turns on the same thread id through the per-session mutex.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create(&self, thread_id: &str) -> Arc<Mutex<Session>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(s) = sessions.get(thread_id) {
                return s.clone();
            }
        }
        let mut sessions = self.sessions.write().await;
        // another caller may have won the race between the two locks
        sessions
            .entry(thread_id.to_string())
            .or_insert_with(|| {
                debug!(thread_id, "new session");
                Arc::new(Mutex::new(Session::new(thread_id)))
            })
            .clone()
    }

    /// Empty the conversation but keep the session entry.
    pub async fn reset(&self, thread_id: &str) {
        let sessions = self.sessions.read().await;
        if let Some(s) = sessions.get(thread_id) {
            s.lock().await.messages.clear();
        }
    }

    /// Snapshot of the current conversation; empty for unknown thread ids.
    pub async fn history(&self, thread_id: &str) -> Vec<Message> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(thread_id).cloned()
        };
        match session {
            Some(s) => s.lock().await.messages.clone(),
            None => Vec::new(),
        }
    }

    pub async fn thread_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }
}
