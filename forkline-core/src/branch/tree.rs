//! Branch tree builder.
//!
//! Turns the flat message log into a [`ConversationTree`]: one main branch
//! plus one branch per distinct `branch_id`, each remembering where it forked
//! off the main line.

use crate::types::{Message, MAIN_BRANCH_ID};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Where a branch diverges from the main line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPoint {
    /// Main-line message the branch forks from
    pub message_id: String,
    /// Zero-based index of `message_id` in the main branch at build time
    /// (0 when the message could not be found)
    pub position: usize,
}

/// A coherent line of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    /// `"main"` or the branch identifier
    pub id: String,
    /// Display label ("Original", "Retry 2", ...)
    pub name: String,
    /// Messages tagged with this branch, sorted by timestamp
    pub messages: Vec<Message>,
    /// Fork position; `None` for main and for independent branches
    pub branch_point: Option<BranchPoint>,
}

impl Branch {
    pub fn is_main(&self) -> bool {
        self.id == MAIN_BRANCH_ID
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Display labels used when naming branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchLabels {
    /// Label for the main branch
    pub main: String,
    /// Prefix for other branches, followed by the discovery number
    pub retry: String,
}

impl Default for BranchLabels {
    fn default() -> Self {
        Self {
            main: "Original".to_string(),
            retry: "Retry".to_string(),
        }
    }
}

impl BranchLabels {
    fn retry_name(&self, number: usize) -> String {
        format!("{} {}", self.retry, number)
    }
}

/// All branches of one conversation plus an index of fork points.
///
/// Only [`build_tree_with`] constructs trees, so `branches` is never empty and
/// always starts with the main branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTree {
    /// Main branch first, then other branches in discovery order
    pub(crate) branches: Vec<Branch>,
    /// Main-line message id → ids of branches that fork from it
    pub(crate) fork_index: BTreeMap<String, Vec<String>>,
}

impl ConversationTree {
    /// The main branch. Always present.
    pub fn main(&self) -> &Branch {
        &self.branches[0]
    }

    /// Main branch first, then other branches in discovery order.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Main-line message id → ids of branches that fork from it.
    pub fn fork_index(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fork_index
    }

    /// Look up a branch by id.
    pub fn branch(&self, id: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.id == id)
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Branches other than main, in discovery order.
    pub fn non_main(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter().filter(|b| !b.is_main())
    }

    /// Ids of branches that declared `message_id` as their branch point.
    pub fn branches_forking_at(&self, message_id: &str) -> &[String] {
        self.fork_index
            .get(message_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Build a conversation tree with the default branch labels.
pub fn build_tree(messages: &[Message]) -> ConversationTree {
    build_tree_with(messages, &BranchLabels::default())
}

/// Build a conversation tree.
///
/// Pure and total. Messages are stably sorted by timestamp, so ties keep
/// their input order and the same input always yields the same tree.
pub fn build_tree_with(messages: &[Message], labels: &BranchLabels) -> ConversationTree {
    let mut sorted: Vec<&Message> = messages.iter().collect();
    sorted.sort_by_key(|m| m.timestamp);

    let (main_messages, branched): (Vec<&Message>, Vec<&Message>) =
        sorted.into_iter().partition(|m| m.is_main_line());

    // First pass: register each branch on its first occurrence and resolve
    // its fork position against the main line.
    let mut fork_index: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut branches: Vec<Branch> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for msg in &branched {
        let branch_id = msg.branch_key();
        if slots.contains_key(branch_id) {
            continue;
        }

        let branch_point = msg.branch_point.as_ref().map(|point| {
            let position = main_messages
                .iter()
                .position(|m| &m.id == point)
                .unwrap_or_else(|| {
                    tracing::warn!(
                        branch_id,
                        branch_point = %point,
                        "Branch point not found on main line, defaulting to position 0"
                    );
                    0
                });

            fork_index
                .entry(point.clone())
                .or_default()
                .push(branch_id.to_string());

            BranchPoint {
                message_id: point.clone(),
                position,
            }
        });

        slots.insert(branch_id, branches.len());
        branches.push(Branch {
            id: branch_id.to_string(),
            name: labels.retry_name(branches.len() + 1),
            messages: Vec::new(),
            branch_point,
        });
    }

    // Second pass: distribute messages.
    for msg in branched {
        let slot = slots[msg.branch_key()];
        branches[slot].messages.push(msg.clone());
    }

    let main = Branch {
        id: MAIN_BRANCH_ID.to_string(),
        name: labels.main.clone(),
        messages: main_messages.into_iter().cloned().collect(),
        branch_point: None,
    };

    tracing::debug!(
        messages = messages.len(),
        branches = branches.len() + 1,
        fork_points = fork_index.len(),
        "Built conversation tree"
    );

    let mut all = Vec::with_capacity(branches.len() + 1);
    all.push(main);
    all.extend(branches);

    ConversationTree {
        branches: all,
        fork_index,
    }
}
