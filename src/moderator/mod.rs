// The moderator — top-level orchestrator across the tiers.
//
// Each call runs router -> normalizer -> local classifier -> fast-path
// policy, and only pays for the remote tiers when the previous tier couldn't
// settle the case. The pipeline never returns an error for well-formed
// input; the worst case is an escalate decision with a diagnostic reason.

pub mod policy;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classify;
use crate::config::ModerationConfig;
use crate::council::review::{AuditLog, AuditLogEntry, HumanReviewItem, ReviewQueue};
use crate::council::{Council, CouncilDecision, CouncilResult};
use crate::provider::build_provider;
use crate::provider::traits::RemoteProvider;
use crate::script;
use crate::types::{
    merge_scores, ModerationAction, ModerationResult, ProviderResult, Tier, TierInfo,
};

/// Optional conversational context supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Preceding turns of the conversation, oldest first
    pub conversation: Vec<String>,
}

/// Local-only check result: no network, sub-millisecond.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickCheck {
    pub flagged: bool,
    pub severity: f64,
    pub latency_ms: u64,
}

/// Aggregate counters derived from the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationStats {
    pub total: usize,
    pub allowed: usize,
    pub denied: usize,
    pub escalated: usize,
    pub local_tier: usize,
    pub api_tier: usize,
    pub council_tier: usize,
    pub human_tier: usize,
    /// Fraction of calls settled by the local tier alone
    pub fast_path_rate: f64,
    pub avg_local_latency_ms: f64,
    pub pending_reviews: usize,
}

pub struct Moderator {
    config: ModerationConfig,
    primary: Option<Arc<dyn RemoteProvider>>,
    council: Council,
    review_queue: ReviewQueue,
    audit_log: AuditLog,
    /// Per-instance flag so the degraded-mode warning is logged once, not
    /// once per call
    degraded_warned: AtomicBool,
}

impl Moderator {
    /// Build a moderator from configuration, constructing providers via the
    /// kind factory.
    pub fn new(config: ModerationConfig) -> Result<Self> {
        config.validate()?;
        let primary = match &config.primary_provider {
            Some(kind) => Some(build_provider(kind)?),
            None => None,
        };
        let members = config
            .council_members
            .iter()
            .map(build_provider)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_providers(config, primary, members))
    }

    /// Wire a moderator from already-built providers (tests, demos).
    pub fn with_providers(
        config: ModerationConfig,
        primary: Option<Arc<dyn RemoteProvider>>,
        members: Vec<Arc<dyn RemoteProvider>>,
    ) -> Self {
        let council = Council::new(members, config.council.clone());
        Self {
            config,
            primary,
            council,
            review_queue: ReviewQueue::new(),
            audit_log: AuditLog::new(),
            degraded_warned: AtomicBool::new(false),
        }
    }

    /// Moderate one text, optionally with conversational context.
    pub async fn moderate(&self, text: &str, context: Option<RequestContext>) -> ModerationResult {
        let started = Instant::now();
        let has_context = context.is_some();
        let conversation = context.map(|c| c.conversation).unwrap_or_default();

        let language = script::analyze_language(text);
        let local = classify::classify(text, &conversation);
        let local_latency_ms = started.elapsed().as_millis() as u64;

        let fast = policy::evaluate(&self.config, &language, &local, has_context);
        let local_result = local.as_provider_result(local_latency_ms);

        let mut warnings = Vec::new();
        if local.obfuscation {
            warnings.push("obfuscation patterns detected in input".to_string());
        }

        if fast.fast_pathed {
            debug!(action = %fast.action, reason = %fast.reason, "Fast path decision");
            let tier_info = TierInfo {
                tier: Tier::Local,
                reason: fast.reason,
                local_latency_ms,
                api_latency_ms: None,
                council_latency_ms: None,
                skipped_api: true,
                skipped_council: true,
                language: language.script.to_string(),
            };
            let result = ModerationResult {
                action: fast.action,
                severity: local.adjusted_severity,
                confidence: local.confidence,
                categories: local.categories.clone(),
                flagged_spans: local.flagged_spans.clone(),
                tier_info: tier_info.clone(),
                warnings,
            };
            self.audit_log
                .append(
                    text,
                    has_context,
                    local_result,
                    None,
                    None,
                    result.action,
                    tier_info,
                )
                .await;
            return result;
        }

        // ---- Remote (api) tier ----
        let mut reason_parts = vec![fast.reason.clone()];
        let mut api_result: Option<ProviderResult> = None;

        match &self.primary {
            Some(provider) if provider.is_available() => {
                let api_started = Instant::now();
                match provider.analyze(text).await {
                    Ok(mut remote) => {
                        remote.latency_ms = api_started.elapsed().as_millis() as u64;
                        // Local catches obfuscated terms remote classifiers
                        // under-score: merge by per-category max
                        remote.categories = merge_scores(&local.categories, &remote.categories);
                        reason_parts.push(format!("primary provider {} responded", remote.provider));
                        api_result = Some(remote);
                    }
                    Err(e) => {
                        self.warn_degraded(&format!("primary provider call failed: {e}"));
                        reason_parts
                            .push("primary provider failed; falling back to local result".into());
                        warnings.push("remote provider call failed; local result used".into());
                    }
                }
            }
            Some(provider) => {
                self.warn_degraded(&format!(
                    "primary provider {} unavailable",
                    provider.info().name
                ));
                reason_parts.push("primary provider unavailable; using local result".into());
                warnings.push("remote provider unavailable; local result used".into());
            }
            None => {
                reason_parts.push("no primary provider configured; using local result".into());
            }
        }

        let api_latency_ms = api_result.as_ref().map(|r| r.latency_ms);
        let primary = api_result.clone().unwrap_or_else(|| local_result.clone());
        let merged_severity = primary
            .categories
            .values()
            .copied()
            .fold(local.adjusted_severity, f64::max)
            .min(1.0);

        // ---- Council tier ----
        let mut council_result: Option<CouncilResult> = None;
        let mut council_latency_ms = None;

        let (action, tier) = if self.council.should_escalate(&primary) {
            let council_started = Instant::now();
            let result = self.council.convene(text, &primary).await;
            council_latency_ms = Some(council_started.elapsed().as_millis() as u64);
            reason_parts.push(result.decision_reason.clone());

            let outcome = if result.votes.is_empty()
                && api_result.is_none()
                && language.should_skip_fast_path
            {
                // A degenerate council verdict only echoes the local read,
                // and local rules never ran meaningfully for this script
                reason_parts.push(
                    "non-latin text requires remote verification; none available; escalating"
                        .to_string(),
                );
                (ModerationAction::Escalate, Tier::Local)
            } else {
                match result.decision {
                    CouncilDecision::Flagged => (ModerationAction::Deny, Tier::Council),
                    CouncilDecision::Clean => (ModerationAction::Allow, Tier::Council),
                    CouncilDecision::HumanReview => {
                        let id = self
                            .review_queue
                            .push(
                                text,
                                primary.clone(),
                                Some(result.clone()),
                                &result.decision_reason,
                            )
                            .await;
                        reason_parts.push(format!("queued for human review as {id}"));
                        (ModerationAction::Escalate, Tier::Human)
                    }
                }
            };
            council_result = Some(result);
            outcome
        } else if primary.confidence > self.config.council.escalate_max {
            if api_result.is_none() {
                // The fast path already refused to decide and no remote
                // verification was possible: stay on the safe side
                reason_parts.push(
                    "remote verification required but unavailable; escalating".to_string(),
                );
                (ModerationAction::Escalate, Tier::Local)
            } else {
                // Confident remote result: trust it directly
                reason_parts.push(format!(
                    "primary confidence {:.2} above escalation band",
                    primary.confidence
                ));
                if primary.flagged || merged_severity >= self.config.remote_deny_threshold {
                    (ModerationAction::Deny, Tier::Api)
                } else if merged_severity <= self.config.remote_allow_threshold {
                    (ModerationAction::Allow, Tier::Api)
                } else {
                    (ModerationAction::Escalate, Tier::Api)
                }
            }
        } else {
            // Below the escalation band: too uncertain even for a second
            // opinion to help; a human gets the case
            let id = self
                .review_queue
                .push(
                    text,
                    primary.clone(),
                    None,
                    "primary confidence below escalation band",
                )
                .await;
            reason_parts.push(format!(
                "primary confidence {:.2} below escalation band; queued as {id}",
                primary.confidence
            ));
            (ModerationAction::Escalate, Tier::Human)
        };

        let confidence = match &council_result {
            Some(c) if !c.votes.is_empty() => c.majority_confidence,
            _ => primary.confidence,
        };

        let tier_info = TierInfo {
            tier,
            reason: reason_parts.join("; "),
            local_latency_ms,
            api_latency_ms,
            council_latency_ms,
            skipped_api: api_result.is_none(),
            skipped_council: council_result.is_none(),
            language: language.script.to_string(),
        };

        info!(
            action = %action,
            tier = %tier_info.tier,
            severity = merged_severity,
            confidence,
            "Moderation decision"
        );

        let result = ModerationResult {
            action,
            severity: merged_severity.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            categories: primary.categories.clone(),
            flagged_spans: local.flagged_spans.clone(),
            tier_info: tier_info.clone(),
            warnings,
        };

        self.audit_log
            .append(
                text,
                has_context,
                local_result,
                api_result,
                council_result,
                result.action,
                tier_info,
            )
            .await;
        result
    }

    /// Local-only check: no network, suitable for pre-filters.
    pub fn quick_check(&self, text: &str) -> QuickCheck {
        let started = Instant::now();
        let local = classify::classify(text, &[]);
        QuickCheck {
            flagged: local.adjusted_severity >= self.config.block_threshold
                || !local.detected_terms.is_empty(),
            severity: local.adjusted_severity,
            latency_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Pending review items, highest priority first.
    pub async fn get_human_review_queue(&self) -> Vec<HumanReviewItem> {
        self.review_queue.pending().await
    }

    /// Record a human decision; false for unknown or already-decided ids.
    pub async fn submit_human_decision(&self, id: &str, decision: ModerationAction) -> bool {
        self.review_queue.submit_decision(id, decision).await
    }

    pub async fn get_audit_log(&self, limit: Option<usize>) -> Vec<AuditLogEntry> {
        self.audit_log.tail(limit).await
    }

    /// Lossless JSON export of the full audit log.
    pub async fn export_audit_log(&self) -> Result<String> {
        self.audit_log.export().await
    }

    pub async fn get_stats(&self) -> ModerationStats {
        let entries = self.audit_log.tail(None).await;
        let total = entries.len();
        let mut stats = ModerationStats {
            total,
            allowed: 0,
            denied: 0,
            escalated: 0,
            local_tier: 0,
            api_tier: 0,
            council_tier: 0,
            human_tier: 0,
            fast_path_rate: 0.0,
            avg_local_latency_ms: 0.0,
            pending_reviews: self.review_queue.pending().await.len(),
        };
        let mut local_latency_sum = 0u64;
        let mut fast_pathed = 0usize;
        for entry in &entries {
            match entry.action {
                ModerationAction::Allow => stats.allowed += 1,
                ModerationAction::Deny => stats.denied += 1,
                ModerationAction::Escalate => stats.escalated += 1,
            }
            match entry.tier_info.tier {
                Tier::Local => stats.local_tier += 1,
                Tier::Api => stats.api_tier += 1,
                Tier::Council => stats.council_tier += 1,
                Tier::Human => stats.human_tier += 1,
            }
            // A local-tier escalation (remote tier unreachable) is not a
            // settled fast-path decision
            if entry.tier_info.tier == Tier::Local && entry.action != ModerationAction::Escalate {
                fast_pathed += 1;
            }
            local_latency_sum += entry.tier_info.local_latency_ms;
        }
        if total > 0 {
            stats.fast_path_rate = fast_pathed as f64 / total as f64;
            stats.avg_local_latency_ms = local_latency_sum as f64 / total as f64;
        }
        stats
    }

    fn warn_degraded(&self, message: &str) {
        if !self.degraded_warned.swap(true, Ordering::SeqCst) {
            warn!("{message}; subsequent fallbacks logged at debug level");
        } else {
            debug!("{message}");
        }
    }
}
