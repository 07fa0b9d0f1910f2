//! Per-conversation view controller.
//!
//! A [`ConversationView`] owns one message snapshot, the tree built from it,
//! and the navigator that tracks the active branch. Feeding it a new snapshot
//! rebuilds the tree (only when the snapshot actually changed) and runs the
//! auto-switch check, so tree, navigator and variant lookups never disagree
//! about which messages they describe.
//!
//! Open several conversations by creating several views; they share nothing.

use crate::branch::{
    build_tree_with, find_variants, BranchLabels, BranchNavigator, BranchRecency,
    ConversationTree, EmbeddedTimestamp, VariantSet,
};
use crate::config::NavigationConfig;
use crate::types::Message;
use sha2::{Digest, Sha256};

/// What happened when a snapshot was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewUpdate {
    /// The tree was rebuilt (the snapshot differed from the previous one)
    pub rebuilt: bool,
    /// Branch the navigator switched to automatically
    pub auto_switched_to: Option<String>,
}

/// Branch tree and navigation state for one open conversation.
pub struct ConversationView<R = EmbeddedTimestamp> {
    labels: BranchLabels,
    messages: Vec<Message>,
    fingerprint: String,
    tree: ConversationTree,
    navigator: BranchNavigator<R>,
}

impl ConversationView<EmbeddedTimestamp> {
    /// Empty view using the default recency rule.
    pub fn new(config: &NavigationConfig) -> Self {
        Self::with_recency(config, EmbeddedTimestamp)
    }
}

impl<R: BranchRecency> ConversationView<R> {
    /// Empty view with a custom notion of branch recency.
    pub fn with_recency(config: &NavigationConfig, recency: R) -> Self {
        let labels = config.labels();
        let mut navigator = BranchNavigator::with_recency(recency);
        navigator.set_auto_switch(config.auto_switch);

        Self {
            tree: build_tree_with(&[], &labels),
            fingerprint: fingerprint(&[]),
            messages: Vec::new(),
            labels,
            navigator,
        }
    }

    /// Apply a new message snapshot.
    ///
    /// Rebuilds the tree and runs the auto-switch check when the snapshot
    /// differs from the current one; otherwise does nothing.
    pub fn update(&mut self, messages: Vec<Message>) -> ViewUpdate {
        let next = fingerprint(&messages);
        if next == self.fingerprint {
            return ViewUpdate::default();
        }

        self.tree = build_tree_with(&messages, &self.labels);
        self.messages = messages;
        self.fingerprint = next;

        let auto_switched_to = self.navigator.observe(&self.tree);

        tracing::debug!(
            messages = self.messages.len(),
            branches = self.tree.branch_count(),
            current = %self.navigator.current_branch_id(),
            "Conversation view rebuilt"
        );

        ViewUpdate {
            rebuilt: true,
            auto_switched_to,
        }
    }

    pub fn tree(&self) -> &ConversationTree {
        &self.tree
    }

    /// Current snapshot in caller order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// SHA-256 of the current snapshot, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn current_branch_id(&self) -> &str {
        self.navigator.current_branch_id()
    }

    pub fn switch_to(&mut self, branch_id: impl Into<String>) {
        self.navigator.switch_to(branch_id);
    }

    /// Messages the transcript should render.
    pub fn active_messages(&self) -> Vec<&Message> {
        self.navigator.active_sequence(&self.tree)
    }

    /// Alternates of assistant message `message_id`, if it has any.
    pub fn variants_for(&self, message_id: &str) -> Option<VariantSet> {
        find_variants(&self.messages, message_id)
    }

    /// Show the `index`-th alternate of `message_id`.
    ///
    /// Returns `false` when the message has no alternates or `index` is out
    /// of range.
    pub fn select_variant(&mut self, message_id: &str, index: usize) -> bool {
        match find_variants(&self.messages, message_id) {
            Some(set) => set.navigate(index, &mut self.navigator),
            None => false,
        }
    }
}

/// Order-sensitive digest of a snapshot.
fn fingerprint(messages: &[Message]) -> String {
    let mut hasher = Sha256::new();
    for msg in messages {
        // Serializing a plain struct of strings and integers cannot fail.
        if let Ok(bytes) = serde_json::to_vec(msg) {
            hasher.update(&bytes);
        }
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_log() -> Vec<Message> {
        vec![
            Message::user("u0", 0).with_content("hi"),
            Message::assistant("a1", 1).with_content("hello"),
        ]
    }

    fn with_retry() -> Vec<Message> {
        let mut log = scenario_log();
        log.push(
            Message::assistant("a2", 2)
                .in_branch("r1")
                .branching_from("u0")
                .with_content("hey there"),
        );
        log
    }

    fn active_ids(view: &ConversationView) -> Vec<String> {
        view.active_messages().iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn test_new_view_is_empty_main() {
        let view = ConversationView::new(&NavigationConfig::default());
        assert_eq!(view.current_branch_id(), "main");
        assert_eq!(view.tree().branch_count(), 1);
        assert!(view.active_messages().is_empty());
    }

    #[test]
    fn test_update_rebuilds_once_per_snapshot() {
        let mut view = ConversationView::new(&NavigationConfig::default());

        let first = view.update(scenario_log());
        assert!(first.rebuilt);
        assert_eq!(first.auto_switched_to, None);

        let again = view.update(scenario_log());
        assert!(!again.rebuilt);
    }

    #[test]
    fn test_retry_auto_switches_and_navigates() {
        let mut view = ConversationView::new(&NavigationConfig::default());
        view.update(scenario_log());

        let update = view.update(with_retry());
        assert_eq!(update.auto_switched_to.as_deref(), Some("r1"));
        assert_eq!(active_ids(&view), vec!["u0", "a2"]);

        let set = view.variants_for("a2").unwrap();
        assert_eq!(set.total_variants(), 2);
        assert_eq!(set.current_index, 1);

        assert!(view.select_variant("a2", 0));
        assert_eq!(view.current_branch_id(), "main");
        assert_eq!(active_ids(&view), vec!["u0", "a1"]);
        assert!(!view.select_variant("u0", 0));
    }

    #[test]
    fn test_auto_switch_disabled_by_config() {
        let config = NavigationConfig {
            auto_switch: false,
            ..Default::default()
        };
        let mut view = ConversationView::new(&config);
        view.update(scenario_log());
        assert_eq!(view.update(with_retry()).auto_switched_to, None);
        assert_eq!(view.current_branch_id(), "main");
    }

    #[test]
    fn test_views_are_independent() {
        let mut left = ConversationView::new(&NavigationConfig::default());
        let mut right = ConversationView::new(&NavigationConfig::default());
        left.update(with_retry());
        right.update(with_retry());

        left.switch_to("main");
        assert_eq!(left.current_branch_id(), "main");
        assert_eq!(right.current_branch_id(), "r1");
    }

    #[test]
    fn test_fingerprint_tracks_order() {
        let mut reversed = scenario_log();
        reversed.reverse();
        assert_ne!(fingerprint(&scenario_log()), fingerprint(&reversed));
        assert_eq!(fingerprint(&scenario_log()).len(), 64);
    }
}
