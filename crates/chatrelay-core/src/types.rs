use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Speaker of a conversation turn.
///
/// The store persists the assistant role as `ai`; the model API calls it
/// `assistant`. Serde uses the model API vocabulary and accepts the other
/// spellings on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "human")]
    User,
    #[serde(alias = "ai", alias = "model", alias = "bot")]
    Assistant,
}

impl Role {
    /// Parse a role from any accepted spelling (case-insensitive).
    ///
    /// Returns `None` for unknown roles so callers can skip malformed turns.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" | "human" => Some(Role::User),
            "assistant" | "ai" | "model" | "bot" => Some(Role::Assistant),
            _ => None,
        }
    }

    /// Spelling written to the conversation store.
    pub fn as_stored(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "ai",
        }
    }

    /// Spelling expected by the model API.
    pub fn as_api(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_api())
    }
}

// =============================================================================
// Turns
// =============================================================================

/// A new turn about to be appended to a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// A turn as read back from the store.
///
/// The role is kept as the raw stored string; a record written by an older
/// client or edited by hand may carry a role this build does not know.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredTurn {
    pub role: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl StoredTurn {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
            created_at: None,
        }
    }

    /// The parsed role, or `None` if the stored role is unrecognized.
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

impl From<&Turn> for StoredTurn {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role.as_stored().to_string(),
            text: turn.text.clone(),
            created_at: Some(turn.created_at),
        }
    }
}
