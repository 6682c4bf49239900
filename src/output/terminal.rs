// Terminal rendering for moderation results, the review queue, and stats.

use colored::Colorize;

use crate::council::review::HumanReviewItem;
use crate::moderator::ModerationStats;
use crate::types::{ModerationAction, ModerationResult};

use super::truncate_chars;

/// Print one moderation result as a human-readable block.
pub fn print_result(text: &str, result: &ModerationResult) {
    let action = match result.action {
        ModerationAction::Allow => "ALLOW".green().bold(),
        ModerationAction::Deny => "DENY".red().bold(),
        ModerationAction::Escalate => "ESCALATE".yellow().bold(),
    };
    println!("{} {}", action, truncate_chars(text, 60));
    println!(
        "  severity {:.2}  confidence {:.2}  tier {}",
        result.severity, result.confidence, result.tier_info.tier
    );

    if !result.categories.is_empty() {
        let mut cats: Vec<String> = result
            .categories
            .iter()
            .map(|(c, s)| format!("{c}={s:.2}"))
            .collect();
        cats.sort();
        println!("  categories: {}", cats.join(", "));
    }
    if !result.flagged_spans.is_empty() {
        let terms: Vec<&str> = result
            .flagged_spans
            .iter()
            .map(|s| s.term.as_str())
            .collect();
        println!("  matched: {}", terms.join(", ").dimmed());
    }
    for warning in &result.warnings {
        println!("  {} {}", "warning:".yellow(), warning);
    }
    println!("  {}", result.tier_info.reason.dimmed());
}

/// Print the pending human-review queue.
pub fn print_queue(items: &[HumanReviewItem]) {
    if items.is_empty() {
        println!("Review queue: empty");
        return;
    }
    println!("Review queue ({} pending):", items.len());
    for item in items {
        println!(
            "  [{:>3}] {} {}",
            item.priority,
            item.id.bold(),
            truncate_chars(&item.text, 50)
        );
        println!("        {}", item.reason.dimmed());
    }
}

/// Print aggregate stats.
pub fn print_stats(stats: &ModerationStats) {
    println!("Decisions: {} total", stats.total);
    println!(
        "  allow {}  deny {}  escalate {}",
        stats.allowed.to_string().green(),
        stats.denied.to_string().red(),
        stats.escalated.to_string().yellow()
    );
    println!(
        "  tiers: local {} / api {} / council {} / human {}",
        stats.local_tier, stats.api_tier, stats.council_tier, stats.human_tier
    );
    println!(
        "  fast-path rate {:.0}%  avg local latency {:.2} ms",
        stats.fast_path_rate * 100.0,
        stats.avg_local_latency_ms
    );
    println!("  pending reviews: {}", stats.pending_reviews);
}
