// Human review queue and audit log — the shared, append/read structures.
//
// Both are mutated by every call when the engine serves concurrent
// requests, so they live behind async mutexes. Review items transition
// pending -> decided exactly once and are never deleted; audit entries are
// append-only and ordered by creation time.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use super::CouncilResult;
use crate::types::{CategoryScores, ModerationAction, ProviderResult, TierInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    InReview,
    Decided,
}

/// A case waiting for (or decided by) a human moderator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanReviewItem {
    pub id: String,
    /// Snapshot of the input text at queue time
    pub text: String,
    pub primary_result: ProviderResult,
    pub council_result: Option<CouncilResult>,
    pub reason: String,
    /// 0-100; higher is reviewed first
    pub priority: u8,
    pub status: ReviewStatus,
    pub human_decision: Option<ModerationAction>,
    pub queued_at: String,
}

/// Compute a review item's priority.
///
/// Base is the primary confidence scaled to 0-50, plus 25 when the council
/// disagreed internally, plus 20 for each high-priority category (child
/// safety, threats, self harm) scoring above 0.5. Capped at 100.
pub fn compute_priority(
    primary_confidence: f64,
    council_non_unanimous: bool,
    categories: &CategoryScores,
) -> u8 {
    let mut priority = primary_confidence * 50.0;
    if council_non_unanimous {
        priority += 25.0;
    }
    for (cat, score) in categories {
        if cat.is_high_priority() && *score > 0.5 {
            priority += 20.0;
        }
    }
    priority.min(100.0) as u8
}

/// The pending-review queue. Items are never removed; decided items simply
/// stop appearing in the pending view.
pub struct ReviewQueue {
    items: Mutex<Vec<HumanReviewItem>>,
    next_id: AtomicU64,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Queue a case for human review, returning its id.
    pub async fn push(
        &self,
        text: &str,
        primary_result: ProviderResult,
        council_result: Option<CouncilResult>,
        reason: &str,
    ) -> String {
        let non_unanimous = council_result
            .as_ref()
            .map(|c| !c.unanimous)
            .unwrap_or(false);
        let priority = compute_priority(
            primary_result.confidence,
            non_unanimous,
            &primary_result.categories,
        );
        let id = format!("hr-{}", self.next_id.fetch_add(1, Ordering::SeqCst));

        info!(id = %id, priority, reason, "Queued for human review");

        let mut items = self.items.lock().await;
        items.push(HumanReviewItem {
            id: id.clone(),
            text: text.to_string(),
            primary_result,
            council_result,
            reason: reason.to_string(),
            priority,
            status: ReviewStatus::Pending,
            human_decision: None,
            queued_at: Utc::now().to_rfc3339(),
        });
        id
    }

    /// Pending items sorted by descending priority. Ties keep insertion
    /// order (stable sort).
    pub async fn pending(&self) -> Vec<HumanReviewItem> {
        let items = self.items.lock().await;
        let mut pending: Vec<HumanReviewItem> = items
            .iter()
            .filter(|i| i.status != ReviewStatus::Decided)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.priority.cmp(&a.priority));
        pending
    }

    /// Record a human decision. Returns false (without mutating anything)
    /// for an unknown id or an item that was already decided.
    pub async fn submit_decision(&self, id: &str, decision: ModerationAction) -> bool {
        let mut items = self.items.lock().await;
        match items.iter_mut().find(|i| i.id == id) {
            Some(item) if item.status != ReviewStatus::Decided => {
                item.status = ReviewStatus::Decided;
                item.human_decision = Some(decision);
                info!(id, decision = %decision, "Human decision recorded");
                true
            }
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }
}

impl Default for ReviewQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// One `moderate()` call's full record: input, intermediate tier results,
/// and the final decision. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub seq: u64,
    pub timestamp: String,
    pub input: String,
    pub context_supplied: bool,
    pub local_result: ProviderResult,
    pub api_result: Option<ProviderResult>,
    pub council_result: Option<CouncilResult>,
    pub action: ModerationAction,
    pub tier_info: TierInfo,
}

/// Append-only audit log, ordered by creation time.
pub struct AuditLog {
    entries: Mutex<Vec<AuditLogEntry>>,
    next_seq: AtomicU64,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(1),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn append(
        &self,
        input: &str,
        context_supplied: bool,
        local_result: ProviderResult,
        api_result: Option<ProviderResult>,
        council_result: Option<CouncilResult>,
        action: ModerationAction,
        tier_info: TierInfo,
    ) {
        let mut entries = self.entries.lock().await;
        entries.push(AuditLogEntry {
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now().to_rfc3339(),
            input: input.to_string(),
            context_supplied,
            local_result,
            api_result,
            council_result,
            action,
            tier_info,
        });
    }

    /// The most recent `limit` entries in creation order (all when None).
    pub async fn tail(&self, limit: Option<usize>) -> Vec<AuditLogEntry> {
        let entries = self.entries.lock().await;
        match limit {
            Some(n) => entries.iter().rev().take(n).rev().cloned().collect(),
            None => entries.clone(),
        }
    }

    /// Lossless JSON export for compliance review.
    pub async fn export(&self) -> Result<String> {
        let entries = self.entries.lock().await;
        Ok(serde_json::to_string_pretty(&*entries)?)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
