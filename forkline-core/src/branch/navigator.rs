//! Branch navigator: which branch the conversation view is showing.
//!
//! The navigator holds the only piece of session state in the branch
//! machinery. Everything it reads comes from a [`ConversationTree`] built from
//! the same message snapshot.

use super::ids;
use super::tree::{Branch, ConversationTree};
use crate::types::{Message, MAIN_BRANCH_ID};

/// Sort key used to decide which branch is the newest.
///
/// Any `Fn(&str) -> i64` works as a recency function.
pub trait BranchRecency {
    /// Creation time of `branch_id`; larger is newer.
    fn created_at(&self, branch_id: &str) -> i64;
}

impl<F> BranchRecency for F
where
    F: Fn(&str) -> i64,
{
    fn created_at(&self, branch_id: &str) -> i64 {
        self(branch_id)
    }
}

/// Reads the creation time embedded as the third `_`-separated component of
/// the branch id. Ids that don't follow the format count as time 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTimestamp;

impl BranchRecency for EmbeddedTimestamp {
    fn created_at(&self, branch_id: &str) -> i64 {
        ids::created_at(branch_id).unwrap_or(0)
    }
}

/// Resolve the messages a view renders for `branch_id`.
///
/// Main renders its own messages. Any other branch renders the main-line
/// prefix up to and including its branch point, merged by timestamp with its
/// own messages. Unknown branches yield an empty sequence.
pub fn active_sequence<'a>(tree: &'a ConversationTree, branch_id: &str) -> Vec<&'a Message> {
    let Some(branch) = tree.branch(branch_id) else {
        tracing::debug!(branch_id, "Unknown branch, resolving to empty sequence");
        return Vec::new();
    };

    let mut sequence: Vec<&Message> = match &branch.branch_point {
        Some(point) if !branch.is_main() => {
            let main = &tree.main().messages;
            let end = (point.position + 1).min(main.len());
            main[..end].iter().chain(&branch.messages).collect()
        }
        _ => branch.messages.iter().collect(),
    };
    sequence.sort_by_key(|m| m.timestamp);
    sequence
}

/// Tracks the active branch and switches to new branches as they appear.
#[derive(Debug, Clone)]
pub struct BranchNavigator<R = EmbeddedTimestamp> {
    current_branch_id: String,
    last_branch_count: usize,
    auto_switch: bool,
    recency: R,
}

impl Default for BranchNavigator<EmbeddedTimestamp> {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchNavigator<EmbeddedTimestamp> {
    /// Navigator starting on main, reading creation times from branch ids.
    pub fn new() -> Self {
        Self::with_recency(EmbeddedTimestamp)
    }
}

impl<R: BranchRecency> BranchNavigator<R> {
    /// Navigator with a custom notion of branch recency.
    pub fn with_recency(recency: R) -> Self {
        Self {
            current_branch_id: MAIN_BRANCH_ID.to_string(),
            last_branch_count: 0,
            auto_switch: true,
            recency,
        }
    }

    /// Enable or disable automatic switching to new branches.
    pub fn set_auto_switch(&mut self, enabled: bool) {
        self.auto_switch = enabled;
    }

    pub fn current_branch_id(&self) -> &str {
        &self.current_branch_id
    }

    /// Make `branch_id` the active branch. The id is not validated.
    pub fn switch_to(&mut self, branch_id: impl Into<String>) {
        let branch_id = branch_id.into();
        if branch_id != self.current_branch_id {
            tracing::debug!(from = %self.current_branch_id, to = %branch_id, "Switching branch");
        }
        self.current_branch_id = branch_id;
    }

    /// Messages of the active branch.
    pub fn active_sequence<'a>(&self, tree: &'a ConversationTree) -> Vec<&'a Message> {
        active_sequence(tree, &self.current_branch_id)
    }

    /// Run the auto-switch check against a freshly built tree.
    ///
    /// Call once per rebuild. When the branch count grew past one, the newest
    /// non-empty branch becomes active. Returns the id switched to, if any.
    pub fn observe(&mut self, tree: &ConversationTree) -> Option<String> {
        let count = tree.branch_count();
        let grew = count > self.last_branch_count;
        self.last_branch_count = count;

        if !grew || count <= 1 || !self.auto_switch {
            return None;
        }

        let newest = self.newest_branch(tree)?;
        if newest.is_empty() || newest.id == self.current_branch_id {
            return None;
        }

        tracing::info!(branch_id = %newest.id, branches = count, "Auto-switching to new branch");
        self.current_branch_id = newest.id.clone();
        Some(newest.id.clone())
    }

    /// Newest non-main branch; ties go to the later-discovered branch.
    fn newest_branch<'a>(&self, tree: &'a ConversationTree) -> Option<&'a Branch> {
        tree.non_main()
            .max_by_key(|b| self.recency.created_at(&b.id))
    }
}
