//! Integration tests for forkline-core
//!
//! These tests load fixture logs from `tests/fixtures/` and drive the full
//! pipeline: ingest → tree → navigator → variants.

use forkline_core::config::NavigationConfig;
use forkline_core::ingest::{load_log, ParseOptions};
use forkline_core::{
    active_sequence, build_tree, find_variants, BranchNavigator, ConversationView, Message,
    MAIN_BRANCH_ID,
};
use std::path::PathBuf;

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Load a fixture, asserting it parses without warnings
fn load_fixture(name: &str) -> Vec<Message> {
    let log = load_log(&fixture_path(name), ParseOptions::default()).expect("fixture should load");
    assert!(log.warnings.is_empty(), "unexpected warnings: {:?}", log.warnings);
    log.messages
}

fn ids(messages: &[&Message]) -> Vec<String> {
    messages.iter().map(|m| m.id.clone()).collect()
}

// ============================================
// End-to-end scenarios
// ============================================

#[test]
fn test_single_response_has_one_branch_and_no_variants() {
    let messages = load_fixture("single-response.jsonl");
    let tree = build_tree(&messages);

    assert_eq!(tree.branch_count(), 1);
    assert_eq!(tree.main().messages.len(), 2);
    assert!(find_variants(&messages, "a1").is_none());
}

#[test]
fn test_retry_creates_branch_and_switches() {
    let mut view = ConversationView::new(&NavigationConfig::default());
    view.update(load_fixture("single-response.jsonl"));
    assert_eq!(view.current_branch_id(), MAIN_BRANCH_ID);

    let update = view.update(load_fixture("retry.jsonl"));
    assert!(update.rebuilt);
    assert_eq!(update.auto_switched_to.as_deref(), Some("r1"));

    let tree = view.tree();
    assert_eq!(tree.branch_count(), 2);
    assert_eq!(tree.main().messages.len(), 2);

    let r1 = tree.branch("r1").expect("r1 branch");
    assert_eq!(r1.messages.len(), 1);
    let point = r1.branch_point.as_ref().expect("branch point");
    assert_eq!(point.message_id, "u0");
    assert_eq!(point.position, 0);

    assert_eq!(ids(&active_sequence(tree, "r1")), vec!["u0", "a2"]);

    let original = view.variants_for("a1").expect("variants for a1");
    let retry = view.variants_for("a2").expect("variants for a2");
    assert_eq!(original.total_variants(), 2);
    assert_eq!(retry.total_variants(), 2);
    assert_eq!(original.current_index, 0);
    assert_eq!(retry.current_index, 1);
}

#[test]
fn test_unknown_branch_resolves_to_nothing() {
    let messages = load_fixture("retry.jsonl");
    let tree = build_tree(&messages);
    let mut navigator = BranchNavigator::new();

    navigator.switch_to("nonexistent");
    assert!(navigator.active_sequence(&tree).is_empty());
}

#[test]
fn test_newest_branch_wins_regardless_of_log_order() {
    let messages = load_fixture("two-retries.jsonl");
    let tree = build_tree(&messages);

    // branch_c3d9_500 appears last in the file but was created first.
    assert_eq!(tree.branches()[1].id, "branch_c3d9_500");
    assert_eq!(tree.branches()[1].name, "Retry 1");
    assert_eq!(
        tree.branches_forking_at("u2"),
        ["branch_c3d9_500".to_string(), "branch_b7e1_900".to_string()]
    );

    let mut navigator = BranchNavigator::new();
    assert_eq!(
        navigator.observe(&tree).as_deref(),
        Some("branch_b7e1_900")
    );
    assert_eq!(
        ids(&navigator.active_sequence(&tree)),
        vec!["u0", "a1", "u2", "a5", "u6", "a7"]
    );
}

// ============================================
// Properties
// ============================================

#[test]
fn test_build_is_deterministic() {
    let messages = load_fixture("two-retries.jsonl");
    let first = serde_json::to_string(&build_tree(&messages)).unwrap();
    for _ in 0..5 {
        assert_eq!(serde_json::to_string(&build_tree(&messages)).unwrap(), first);
    }
}

#[test]
fn test_prefix_inheritance_law() {
    for fixture in ["retry.jsonl", "two-retries.jsonl", "array-mixed.json"] {
        let messages = load_fixture(fixture);
        let tree = build_tree(&messages);
        let main = &tree.main().messages;

        for branch in tree.non_main() {
            let Some(point) = &branch.branch_point else {
                continue;
            };
            let sequence = active_sequence(&tree, &branch.id);
            let prefix = point.position + 1;

            assert_eq!(sequence.len(), prefix + branch.messages.len());
            for (inherited, expected) in sequence.iter().zip(&main[..prefix]) {
                assert_eq!(inherited.id, expected.id, "{} / {}", fixture, branch.id);
            }
            let rest: Vec<&str> = sequence[prefix..].iter().map(|m| m.id.as_str()).collect();
            let own: Vec<&str> = branch.messages.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(rest, own, "{} / {}", fixture, branch.id);
        }
    }
}

#[test]
fn test_variant_symmetry() {
    let messages = load_fixture("two-retries.jsonl");

    for msg in messages.iter().filter(|m| m.is_assistant()) {
        let Some(set) = find_variants(&messages, &msg.id) else {
            continue;
        };
        for (index, variant) in set.variants.iter().enumerate() {
            let other = find_variants(&messages, &variant.message_id)
                .unwrap_or_else(|| panic!("{} should see {}", variant.message_id, msg.id));
            assert_eq!(other.total_variants(), set.total_variants());
            assert_eq!(other.variants, set.variants);
            assert_eq!(other.current_index, index);
        }
    }

    let set = find_variants(&messages, "a3").unwrap();
    let order: Vec<&str> = set.variants.iter().map(|v| v.message_id.as_str()).collect();
    assert_eq!(order, vec!["a3", "a4", "a5"]);
    assert!(find_variants(&messages, "a7").is_none());
    assert!(find_variants(&messages, "a1").is_none());
}

#[test]
fn test_auto_switch_threshold() {
    let base = load_fixture("single-response.jsonl");

    // A second branch with messages: switch.
    let mut navigator = BranchNavigator::new();
    navigator.observe(&build_tree(&base));
    assert!(navigator
        .observe(&build_tree(&load_fixture("retry.jsonl")))
        .is_some());
    assert_ne!(navigator.current_branch_id(), MAIN_BRANCH_ID);

    // Rebuilding the same snapshot never re-triggers.
    navigator.switch_to(MAIN_BRANCH_ID);
    assert!(navigator
        .observe(&build_tree(&load_fixture("retry.jsonl")))
        .is_none());
    assert_eq!(navigator.current_branch_id(), MAIN_BRANCH_ID);
}

// ============================================
// Ingest edge cases
// ============================================

#[test]
fn test_array_log_with_dangling_branch_point() {
    let messages = load_fixture("array-mixed.json");
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].timestamp, 1_714_557_600_000);

    let tree = build_tree(&messages);
    assert_eq!(tree.branch_count(), 3);

    let orphan = tree.branch("branch_orphan_1714557720000").unwrap();
    assert_eq!(orphan.branch_point.as_ref().unwrap().position, 0);
    assert_eq!(
        ids(&active_sequence(&tree, &orphan.id)),
        vec!["1", "4"]
    );

    let set = find_variants(&messages, "2").unwrap();
    assert_eq!(set.origin_id, "1");
    assert_eq!(set.total_variants(), 2);
    assert!(find_variants(&messages, "4").is_none());
}

#[test]
fn test_malformed_lines_recovered() {
    let log = load_log(&fixture_path("malformed-lines.jsonl"), ParseOptions::default())
        .expect("parse should succeed despite bad lines");

    let loaded: Vec<&str> = log.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(loaded, vec!["u0", "a1", "a2"]);
    assert_eq!(log.warnings.len(), 3);

    let strict = load_log(
        &fixture_path("malformed-lines.jsonl"),
        ParseOptions { strict: true },
    );
    assert!(strict.is_err());
}
