//! # forkline-core
//!
//! Core library for forkline - branch reconstruction and variant navigation
//! for chat conversations stored as a flat message log.
//!
//! This library provides:
//! - Domain types for messages
//! - The branch tree builder, branch navigator and variant resolver
//! - A per-conversation view controller
//! - Validated loading of JSON / JSON Lines message logs
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way:
//! - **Flat log:** messages tagged with optional `branchId` / `branchPoint`
//! - **Tree:** main branch plus one branch per fork ([`build_tree`])
//! - **Active sequence:** what a transcript renders ([`BranchNavigator`])
//! - **Variants:** alternate responses to one prompt ([`find_variants`])
//!
//! ## Example
//!
//! ```rust
//! use forkline_core::{build_tree, find_variants, BranchNavigator, Message};
//!
//! let log = vec![
//!     Message::user("u0", 0),
//!     Message::assistant("a1", 1),
//!     Message::assistant("a2", 2).in_branch("r1").branching_from("u0"),
//! ];
//!
//! let tree = build_tree(&log);
//! let mut navigator = BranchNavigator::new();
//! navigator.observe(&tree);
//! assert_eq!(navigator.current_branch_id(), "r1");
//!
//! let variants = find_variants(&log, "a2").unwrap();
//! variants.navigate(0, &mut navigator);
//! assert_eq!(navigator.current_branch_id(), "main");
//! ```

// Re-export commonly used items at the crate root
pub use branch::{
    active_sequence, build_tree, build_tree_with, find_variants, plan_retry, Branch,
    BranchLabels, BranchNavigator, BranchPoint, BranchRecency, ConversationTree,
    EmbeddedTimestamp, RetryPlan, Variant, VariantAmbiguity, VariantSet,
};
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
pub use view::{ConversationView, ViewUpdate};

// Public modules
pub mod branch;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod types;
pub mod view;
