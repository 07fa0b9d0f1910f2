//! Conversation branch reconstruction and variant navigation
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌───────────────────┐
//! │  Flat log    │ ──► │ build_tree         │ ──► │ BranchNavigator   │
//! │ (&[Message]) │     │ (ConversationTree) │     │ (active sequence) │
//! └──────────────┘     └────────────────────┘     └───────────────────┘
//!        │                                                  ▲
//!        ▼                                                  │
//! ┌──────────────────┐                                      │
//! │ find_variants    │ ──────── VariantSet::navigate ───────┘
//! └──────────────────┘
//! ```
//!
//! The tree and the variant lookup must come from the same message snapshot;
//! [`crate::view::ConversationView`] takes care of that.

pub mod ids;
pub mod navigator;
pub mod tree;
pub mod variants;

pub use navigator::{active_sequence, BranchNavigator, BranchRecency, EmbeddedTimestamp};
pub use tree::{build_tree, build_tree_with, Branch, BranchLabels, BranchPoint, ConversationTree};
pub use variants::{find_variants, plan_retry, RetryPlan, Variant, VariantAmbiguity, VariantSet};
