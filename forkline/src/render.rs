//! Text and JSON output for the CLI commands.

use crate::OutputFormat;
use anyhow::Result;
use forkline_core::format::{format_timestamp, preview};
use forkline_core::{
    Branch, Config, ConversationTree, ConversationView, Message, VariantAmbiguity,
};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeReport<'a> {
    current_branch_id: &'a str,
    #[serde(flatten)]
    tree: &'a ConversationTree,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActiveReport<'a> {
    branch_id: &'a str,
    messages: Vec<&'a Message>,
}

/// `forkline tree`
pub fn tree(view: &ConversationView, format: OutputFormat) -> Result<()> {
    let tree = view.tree();
    let current = view.current_branch_id();

    if format == OutputFormat::Json {
        let report = TreeReport {
            current_branch_id: current,
            tree,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} branch(es), {} message(s)",
        tree.branch_count(),
        view.messages().len()
    );
    for branch in tree.branches() {
        let marker = if branch.id == current { "*" } else { " " };
        println!(
            "{} {:<28} {:<12} {:>4} msg{}",
            marker,
            branch.id,
            branch.name,
            branch.messages.len(),
            fork_suffix(branch)
        );
    }
    Ok(())
}

fn fork_suffix(branch: &Branch) -> String {
    match &branch.branch_point {
        Some(point) => format!("  forks at {} (#{})", point.message_id, point.position),
        None if branch.is_main() => String::new(),
        None => "  independent".to_string(),
    }
}

/// `forkline active` / `forkline select`
pub fn active(view: &ConversationView, config: &Config, format: OutputFormat) -> Result<()> {
    let branch_id = view.current_branch_id();
    let messages = view.active_messages();

    if format == OutputFormat::Json {
        let report = ActiveReport {
            branch_id,
            messages,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match view.tree().branch(branch_id) {
        Some(branch) => println!("Branch: {} ({})", branch.id, branch.name),
        None => println!("Branch: {} (not found)", branch_id),
    }

    for msg in messages {
        let marker = if view.variants_for(&msg.id).is_some() {
            "⇄"
        } else {
            " "
        };
        println!(
            "{} [{}] {:<9} {:<14} {}",
            marker,
            format_timestamp(msg.timestamp),
            msg.role.as_str(),
            msg.id,
            preview(msg.content.as_deref(), config.display.preview_chars)
        );
    }
    Ok(())
}

/// `forkline variants`
pub fn variants(view: &ConversationView, message_id: &str, format: OutputFormat) -> Result<()> {
    let set = view.variants_for(message_id);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }

    let Some(set) = set else {
        println!("No variants for {}", message_id);
        return Ok(());
    };

    println!(
        "Variant {} of {} for prompt {}",
        set.current_index + 1,
        set.total_variants(),
        set.origin_id
    );
    for (index, variant) in set.variants.iter().enumerate() {
        let marker = if index == set.current_index { ">" } else { " " };
        println!(
            "{} [{}] {:<14} {:<28} {}",
            marker,
            index,
            variant.message_id,
            variant.branch_id,
            format_timestamp(variant.timestamp)
        );
    }

    if let Some(VariantAmbiguity::MultipleOriginals { chosen, others }) = &set.ambiguity {
        println!(
            "Note: several original responses found; using {}, ignoring {}",
            chosen,
            others.join(", ")
        );
    }
    Ok(())
}
