//! Variant resolver: alternate assistant responses to the same prompt.
//!
//! Variants live in different branches, so discovery works on the flat
//! message log rather than on the tree. The algorithm:
//!
//! 1. Find the prompt the target answers (its *origin*). A retry names its
//!    origin via `branch_point`; otherwise the origin is the newest user
//!    message before the target, in the same branch, that has no assistant
//!    message between itself and the target.
//! 2. Collect the original response to that origin and every retry that
//!    points at it.
//! 3. Order them by timestamp.

use super::ids;
use super::navigator::{BranchNavigator, BranchRecency};
use crate::types::{Message, Role, MAIN_BRANCH_ID};
use serde::Serialize;
use std::collections::HashSet;

/// One alternate response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Assistant message id
    pub message_id: String,
    /// Branch that shows this response (`"main"` when untagged)
    pub branch_id: String,
    pub timestamp: i64,
}

/// Data shapes the resolver could not disambiguate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariantAmbiguity {
    /// Several untagged responses answer the same origin. The earliest is
    /// treated as the original and the rest are left out of the set.
    MultipleOriginals { chosen: String, others: Vec<String> },
}

/// Navigation descriptor for a response that has alternates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSet {
    /// Prompt the variants answer
    pub origin_id: String,
    /// Position of the requested message in `variants`
    pub current_index: usize,
    /// All variants, oldest first
    pub variants: Vec<Variant>,
    /// Set when the log contained more than one candidate original
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambiguity: Option<VariantAmbiguity>,
}

impl VariantSet {
    pub fn total_variants(&self) -> usize {
        self.variants.len()
    }

    pub fn current(&self) -> &Variant {
        &self.variants[self.current_index]
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.current_index.checked_sub(1)
    }

    pub fn next_index(&self) -> Option<usize> {
        let next = self.current_index + 1;
        (next < self.variants.len()).then_some(next)
    }

    /// Branch that shows the variant at `index`.
    pub fn branch_at(&self, index: usize) -> Option<&str> {
        self.variants.get(index).map(|v| v.branch_id.as_str())
    }

    /// Switch `navigator` to the branch of the variant at `index`.
    ///
    /// Returns `false` and leaves the navigator alone when `index` is out of
    /// range.
    pub fn navigate<R: BranchRecency>(
        &self,
        index: usize,
        navigator: &mut BranchNavigator<R>,
    ) -> bool {
        match self.branch_at(index) {
            Some(branch_id) => {
                navigator.switch_to(branch_id);
                true
            }
            None => {
                tracing::debug!(index, total = self.variants.len(), "Variant index out of range");
                false
            }
        }
    }
}

/// Find the alternates of assistant message `target_id`.
///
/// Returns `None` when the target is missing, is not an assistant message,
/// its origin cannot be determined, or it has no alternates.
pub fn find_variants(messages: &[Message], target_id: &str) -> Option<VariantSet> {
    let target = messages.iter().find(|m| m.id == target_id)?;
    if target.role != Role::Assistant {
        return None;
    }

    let origin = resolve_origin(messages, target)?;

    let mut by_time: Vec<&Message> = messages.iter().collect();
    by_time.sort_by_key(|m| m.timestamp);

    let originals: Vec<&Message> = by_time
        .iter()
        .copied()
        .filter(|m| is_original_response(messages, origin, m))
        .collect();

    let ambiguity = if originals.len() > 1 {
        let chosen = originals[0].id.clone();
        let others: Vec<String> = originals[1..].iter().map(|m| m.id.clone()).collect();
        tracing::warn!(
            origin = %origin.id,
            chosen = %chosen,
            others = ?others,
            "Multiple original responses for one prompt"
        );
        Some(VariantAmbiguity::MultipleOriginals { chosen, others })
    } else {
        None
    };

    let retries = by_time
        .iter()
        .copied()
        .filter(|m| m.is_assistant() && m.branch_point.as_deref() == Some(origin.id.as_str()));

    let mut seen = HashSet::new();
    let mut variants: Vec<&Message> = originals
        .first()
        .copied()
        .into_iter()
        .chain(retries)
        .filter(|m| seen.insert(m.id.as_str()))
        .collect();
    variants.sort_by_key(|m| m.timestamp);

    if variants.len() <= 1 {
        return None;
    }

    let Some(current_index) = variants.iter().position(|m| m.id == target.id) else {
        tracing::debug!(
            target = %target.id,
            origin = %origin.id,
            "Target is not among the variants of its origin"
        );
        return None;
    };

    Some(VariantSet {
        origin_id: origin.id.clone(),
        current_index,
        variants: variants
            .into_iter()
            .map(|m| Variant {
                message_id: m.id.clone(),
                branch_id: m.branch_key().to_string(),
                timestamp: m.timestamp,
            })
            .collect(),
        ambiguity,
    })
}

/// The prompt `target` answers.
fn resolve_origin<'a>(messages: &'a [Message], target: &Message) -> Option<&'a Message> {
    if let Some(point) = &target.branch_point {
        return messages.iter().find(|m| &m.id == point);
    }

    let mut candidates: Vec<&Message> = messages
        .iter()
        .filter(|m| m.is_user() && m.timestamp < target.timestamp && m.same_branch(target))
        .collect();
    candidates.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    candidates.into_iter().find(|candidate| {
        !messages.iter().any(|m| {
            m.is_assistant()
                && m.same_branch(target)
                && m.timestamp > candidate.timestamp
                && m.timestamp < target.timestamp
        })
    })
}

/// Whether `candidate` is an untagged response to `origin`.
///
/// The candidate must live on main or in the origin's branch, be newer than
/// the origin, and no user message of its own branch may sit in between.
fn is_original_response(messages: &[Message], origin: &Message, candidate: &Message) -> bool {
    if !candidate.is_assistant()
        || candidate.branch_point.is_some()
        || candidate.timestamp <= origin.timestamp
    {
        return false;
    }

    let in_scope = candidate.branch_key() == MAIN_BRANCH_ID || candidate.same_branch(origin);
    if !in_scope {
        return false;
    }

    !messages.iter().any(|m| {
        m.is_user()
            && m.same_branch(candidate)
            && m.timestamp > origin.timestamp
            && m.timestamp < candidate.timestamp
    })
}

/// What a host needs to record a new retry of an assistant response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPlan {
    /// Prompt being retried
    pub origin_id: String,
    /// Fresh branch id carrying the creation time
    pub branch_id: String,
    /// Template for the retry response; the host fills in `content`
    pub message: Message,
}

/// Plan a retry of assistant message `target_id` created at `now_ms`.
///
/// The new response forks from the target's origin so it joins the same
/// variant set. `message_id` names the response record to create.
pub fn plan_retry(
    messages: &[Message],
    target_id: &str,
    message_id: impl Into<String>,
    branch_prefix: &str,
    now_ms: i64,
) -> Option<RetryPlan> {
    let target = messages.iter().find(|m| m.id == target_id)?;
    if !target.is_assistant() {
        return None;
    }
    let origin = resolve_origin(messages, target)?;
    let branch_id = ids::new_branch_id(branch_prefix, now_ms);

    Some(RetryPlan {
        origin_id: origin.id.clone(),
        message: Message::assistant(message_id, now_ms)
            .in_branch(branch_id.clone())
            .branching_from(origin.id.clone()),
        branch_id,
    })
}
