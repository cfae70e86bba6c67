//! Append-only conversation log.

use crate::types::{Author, ChatTurn, WELCOME_TURN_ID};

/// Fixed content of the welcome turn
pub const WELCOME_MESSAGE: &str =
    "Hi! I'm the project assistant. Ask me anything about this project.";

/// Ordered sequence of chat turns. Insertion order is conversation order.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    turns: Vec<ChatTurn>,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log seeded with the welcome turn
    pub fn with_welcome() -> Self {
        Self {
            turns: vec![Self::welcome_turn()],
        }
    }

    /// The fixed introductory assistant turn
    pub fn welcome_turn() -> ChatTurn {
        ChatTurn {
            id: WELCOME_TURN_ID.to_string(),
            author: Author::Assistant,
            content: WELCOME_MESSAGE.to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Add a turn to the end
    pub fn append(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// Ordered copy of all turns
    pub fn snapshot(&self) -> Vec<ChatTurn> {
        self.turns.clone()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    /// Every turn except the most recent one
    pub fn history_before_last(&self) -> &[ChatTurn] {
        match self.turns.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }
}
