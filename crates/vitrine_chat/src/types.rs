//! Core types for the project chat assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved id of the synthetic welcome turn
pub const WELCOME_TURN_ID: &str = "welcome";

/// Who wrote a turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

/// A single chat turn. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    /// Unique turn ID (UUID, or [`WELCOME_TURN_ID`])
    pub id: String,
    /// Who wrote it
    pub author: Author,
    /// Text content
    pub content: String,
    /// When the turn was created
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a new user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Author::User, content)
    }

    /// Create a new assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Author::Assistant, content)
    }

    fn new(author: Author, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether this is the synthetic welcome turn
    pub fn is_welcome(&self) -> bool {
        self.id == WELCOME_TURN_ID
    }
}

/// Project record as supplied by the project provider.
///
/// Everything except the title is optional; missing fields render as
/// placeholders in the assistant context.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    /// Project identifier, used by providers that serve several projects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_names: Option<Vec<String>>,
}

impl ProjectRecord {
    /// Create a record with only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_creator(mut self, creator_name: impl Into<String>) -> Self {
        self.creator_name = Some(creator_name.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_names = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Orchestrator state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    /// Ready for input
    Idle,
    /// A send is in flight
    Sending,
    /// Daily allowance exhausted; terminal for the session
    LimitReached,
}

/// Read-only projection of the conversation for rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub messages: Vec<ChatTurn>,
    pub is_sending: bool,
    pub limit_reached: bool,
}
