//! Per-session conversation history

use dashmap::DashMap;

use crate::types::ChatTurn;

/// In-memory session store; sessions live until cleared
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Vec<ChatTurn>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns of a session in order; empty for unknown sessions
    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        self.sessions
            .get(session_id)
            .map(|turns| turns.clone())
            .unwrap_or_default()
    }

    /// Record one question/answer exchange, creating the session if needed
    pub fn record_exchange(&self, session_id: &str, question: &str, answer: &str) {
        let mut turns = self.sessions.entry(session_id.to_string()).or_default();
        turns.push(ChatTurn::human(question));
        turns.push(ChatTurn::ai(answer));
    }

    /// Remove a session; returns whether it existed
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
