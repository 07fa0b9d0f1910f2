//! Core domain types for forkline
//!
//! The only input the branch machinery needs is a flat collection of
//! [`Message`] records. Everything else (branches, active sequences,
//! variant sets) is derived from it on demand.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Main line** | Messages with no branch tag, or tagged `"main"` |
//! | **Branch** | A named divergence holding only the messages created after a fork |
//! | **Branch point** | The main-line message a branch diverges from |
//! | **Variant** | One of several assistant responses to the same user prompt |

use serde::{Deserialize, Serialize};

/// Identifier of the implicit main branch.
pub const MAIN_BRANCH_ID: &str = "main";

// ============================================
// Roles
// ============================================

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A person typing prompts
    User,
    /// A model response
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "human" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

// ============================================
// Messages
// ============================================

/// A single chat message from the flat conversation log.
///
/// All optional fields are declared up front; records coming from outside
/// are validated by [`crate::ingest`] before they reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier
    pub id: String,
    /// Author role
    pub role: Role,
    /// Clock value in milliseconds; not required to be unique
    pub timestamp: i64,
    /// Branch this message belongs to (`None` or `"main"` for the main line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    /// Message this branch diverges from (set on fork-originating messages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_point: Option<String>,
    /// Display body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    /// Create a main-line message.
    pub fn new(id: impl Into<String>, role: Role, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            role,
            timestamp,
            branch_id: None,
            branch_point: None,
            content: None,
        }
    }

    pub fn user(id: impl Into<String>, timestamp: i64) -> Self {
        Self::new(id, Role::User, timestamp)
    }

    pub fn assistant(id: impl Into<String>, timestamp: i64) -> Self {
        Self::new(id, Role::Assistant, timestamp)
    }

    /// Tag this message with a branch id.
    pub fn in_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }

    /// Mark this message as diverging from `message_id`.
    pub fn branching_from(mut self, message_id: impl Into<String>) -> Self {
        self.branch_point = Some(message_id.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Branch id with the main-line sentinel filled in.
    pub fn branch_key(&self) -> &str {
        self.branch_id.as_deref().unwrap_or(MAIN_BRANCH_ID)
    }

    /// Whether this message belongs to the main line.
    pub fn is_main_line(&self) -> bool {
        self.branch_key() == MAIN_BRANCH_ID
    }

    /// Whether two messages live in the same branch scope.
    pub fn same_branch(&self, other: &Message) -> bool {
        self.branch_key() == other.branch_key()
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}
