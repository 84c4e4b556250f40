//! Conversation session tracking.
//!
//! Sessions keep a bounded window of recent exchanges so follow-up
//! questions can refer back to earlier answers. History is rendered as
//! plain text for the system prompt.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Exchange {
    question: String,
    answer: String,
}

/// Tracks per-session conversation history.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, VecDeque<Exchange>>>,
    max_history: usize,
}

impl SessionManager {
    /// `max_history` is the number of exchanges retained per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// Create a new session and return its id.
    pub fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .unwrap()
            .insert(id.clone(), VecDeque::new());
        debug!(session = %id, "Created session");
        id
    }

    /// Record a completed exchange, evicting the oldest past the limit.
    pub fn add_exchange(&self, session_id: &str, question: &str, answer: &str) {
        let mut sessions = self.sessions.write().unwrap();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push_back(Exchange {
            question: question.to_string(),
            answer: answer.to_string(),
        });
        while history.len() > self.max_history {
            history.pop_front();
        }
    }

    /// Render a session's history for the system prompt. `None` when the
    /// session is unknown or empty.
    pub fn get_history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().unwrap();
        let history = sessions.get(session_id)?;
        if history.is_empty() {
            return None;
        }
        let rendered = history
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.question, e.answer))
            .collect::<Vec<_>>()
            .join("\n");
        Some(rendered)
    }

    /// Drop a session's history.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.write().unwrap().remove(session_id);
        debug!(session = %session_id, "Cleared session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_renders_in_order() {
        let manager = SessionManager::new(5);
        let id = manager.create_session();
        manager.add_exchange(&id, "first?", "one");
        manager.add_exchange(&id, "second?", "two");

        assert_eq!(
            manager.get_history(&id).unwrap(),
            "User: first?\nAssistant: one\nUser: second?\nAssistant: two"
        );
    }

    #[test]
    fn test_history_evicts_oldest() {
        let manager = SessionManager::new(2);
        let id = manager.create_session();
        manager.add_exchange(&id, "a?", "1");
        manager.add_exchange(&id, "b?", "2");
        manager.add_exchange(&id, "c?", "3");

        let history = manager.get_history(&id).unwrap();
        assert!(!history.contains("a?"));
        assert!(history.contains("b?"));
        assert!(history.contains("c?"));
    }

    #[test]
    fn test_unknown_or_empty_session_has_no_history() {
        let manager = SessionManager::new(2);
        assert!(manager.get_history("missing").is_none());

        let id = manager.create_session();
        assert!(manager.get_history(&id).is_none());
    }

    #[test]
    fn test_clear_session() {
        let manager = SessionManager::new(2);
        let id = manager.create_session();
        manager.add_exchange(&id, "q", "a");
        manager.clear_session(&id);
        assert!(manager.get_history(&id).is_none());
    }
}
