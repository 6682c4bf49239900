// The council — a second opinion for genuinely uncertain primary results.
//
// Members are queried concurrently, each raced against a per-member timeout;
// a slow or failing member simply contributes no vote. Aggregation is a
// hybrid: unanimity can auto-decide, a confident majority can auto-decide,
// and everything else lands in the human review queue.

pub mod review;

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::provider::traits::RemoteProvider;
use crate::types::ProviderResult;

/// Council thresholds and toggles. Plain data, supplied by the config layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Primary-confidence band worth a second opinion (inclusive)
    pub escalate_min: f64,
    pub escalate_max: f64,
    /// Per-member timeout in milliseconds
    pub member_timeout_ms: u64,
    pub unanimous_auto_decide: bool,
    /// Majority-side average confidence needed to auto-decide
    pub majority_confidence_threshold: f64,
    pub send_low_confidence_to_human: bool,
    pub send_splits_to_human: bool,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            escalate_min: 0.30,
            escalate_max: 0.70,
            member_timeout_ms: 30_000,
            unanimous_auto_decide: true,
            majority_confidence_threshold: 0.60,
            send_low_confidence_to_human: true,
            send_splits_to_human: true,
        }
    }
}

/// One member's vote: the uniform result plus optional reasoning text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilVote {
    pub result: ProviderResult,
    pub reasoning: Option<String>,
}

/// What the council concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouncilDecision {
    Flagged,
    Clean,
    HumanReview,
}

impl std::fmt::Display for CouncilDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CouncilDecision::Flagged => "flagged",
            CouncilDecision::Clean => "clean",
            CouncilDecision::HumanReview => "human_review",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilResult {
    pub votes: Vec<CouncilVote>,
    pub unanimous: bool,
    pub majority_flagged: bool,
    /// Average confidence of the majority-side votes
    pub majority_confidence: f64,
    /// Average confidence across all votes
    pub average_confidence: f64,
    pub decision: CouncilDecision,
    pub decision_reason: String,
}

pub struct Council {
    members: Vec<Arc<dyn RemoteProvider>>,
    config: CouncilConfig,
}

impl Council {
    pub fn new(members: Vec<Arc<dyn RemoteProvider>>, config: CouncilConfig) -> Self {
        Self { members, config }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Is the primary result uncertain enough to be worth a second opinion?
    pub fn should_escalate(&self, primary: &ProviderResult) -> bool {
        primary.confidence >= self.config.escalate_min
            && primary.confidence <= self.config.escalate_max
    }

    /// A council result that just copies the primary decision, used when no
    /// member could vote. A case is never dropped silently.
    fn degenerate(&self, primary: &ProviderResult, reason: &str) -> CouncilResult {
        CouncilResult {
            votes: Vec::new(),
            unanimous: false,
            majority_flagged: primary.flagged,
            majority_confidence: primary.confidence,
            average_confidence: primary.confidence,
            decision: if primary.flagged {
                CouncilDecision::Flagged
            } else {
                CouncilDecision::Clean
            },
            decision_reason: reason.to_string(),
        }
    }

    /// Query all members concurrently and aggregate their votes.
    pub async fn convene(&self, text: &str, primary: &ProviderResult) -> CouncilResult {
        let available: Vec<&Arc<dyn RemoteProvider>> = self
            .members
            .iter()
            .filter(|m| m.is_available())
            .collect();

        if available.is_empty() {
            return self.degenerate(
                primary,
                "no council members configured or available; using primary decision",
            );
        }

        let per_member = Duration::from_millis(self.config.member_timeout_ms);
        // Each member races its own timeout; a timed-out future is dropped
        // rather than awaited further. The remote side may keep working —
        // the engine just stops waiting (accepted limitation).
        let calls = available.iter().map(|member| {
            let name = member.info().name;
            async move {
                match timeout(per_member, member.analyze(text)).await {
                    Ok(Ok(result)) => Some(CouncilVote {
                        result,
                        reasoning: None,
                    }),
                    Ok(Err(e)) => {
                        warn!(member = %name, error = %e, "Council member failed, dropping vote");
                        None
                    }
                    Err(_) => {
                        warn!(member = %name, timeout_ms = self.config.member_timeout_ms, "Council member timed out, dropping vote");
                        None
                    }
                }
            }
        });

        let votes: Vec<CouncilVote> = join_all(calls).await.into_iter().flatten().collect();

        if votes.is_empty() {
            return self.degenerate(
                primary,
                "all council members failed or timed out; using primary decision",
            );
        }

        self.aggregate(votes)
    }

    /// Hybrid vote aggregation, checked in order: unanimity, confident
    /// majority, split.
    fn aggregate(&self, votes: Vec<CouncilVote>) -> CouncilResult {
        let total = votes.len();
        let flagged_count = votes.iter().filter(|v| v.result.flagged).count();
        let clean_count = total - flagged_count;

        let average_confidence =
            votes.iter().map(|v| v.result.confidence).sum::<f64>() / total as f64;

        let majority_flagged = flagged_count >= clean_count;
        let majority_side: Vec<&CouncilVote> = votes
            .iter()
            .filter(|v| v.result.flagged == majority_flagged)
            .collect();
        let majority_confidence = majority_side
            .iter()
            .map(|v| v.result.confidence)
            .sum::<f64>()
            / majority_side.len() as f64;

        let unanimous = flagged_count == 0 || clean_count == 0;

        debug!(
            total,
            flagged_count, unanimous, majority_confidence, "Aggregating council votes"
        );

        let (decision, decision_reason) = if unanimous && self.config.unanimous_auto_decide {
            let d = if majority_flagged {
                CouncilDecision::Flagged
            } else {
                CouncilDecision::Clean
            };
            (d, format!("unanimous {}-0 vote", total))
        } else if flagged_count != clean_count {
            if majority_confidence >= self.config.majority_confidence_threshold {
                let d = if majority_flagged {
                    CouncilDecision::Flagged
                } else {
                    CouncilDecision::Clean
                };
                (
                    d,
                    format!(
                        "{}-{} majority with average confidence {:.2}",
                        flagged_count.max(clean_count),
                        flagged_count.min(clean_count),
                        majority_confidence
                    ),
                )
            } else if self.config.send_low_confidence_to_human {
                (
                    CouncilDecision::HumanReview,
                    format!(
                        "majority confidence {:.2} below threshold {:.2}",
                        majority_confidence, self.config.majority_confidence_threshold
                    ),
                )
            } else {
                let d = if majority_flagged {
                    CouncilDecision::Flagged
                } else {
                    CouncilDecision::Clean
                };
                (d, "low-confidence majority (human routing disabled)".to_string())
            }
        } else if self.config.send_splits_to_human {
            (
                CouncilDecision::HumanReview,
                format!("exact {}-{} split", flagged_count, clean_count),
            )
        } else {
            // Safer outcome on a split when human routing is disabled
            (
                CouncilDecision::Flagged,
                format!("exact {}-{} split, defaulting to flagged", flagged_count, clean_count),
            )
        };

        CouncilResult {
            votes,
            unanimous,
            majority_flagged,
            majority_confidence,
            average_confidence,
            decision,
            decision_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CategoryScores;

    fn vote(flagged: bool, confidence: f64) -> CouncilVote {
        CouncilVote {
            result: ProviderResult {
                provider: "m".into(),
                flagged,
                confidence,
                categories: CategoryScores::new(),
                latency_ms: 1,
            },
            reasoning: None,
        }
    }

    fn council() -> Council {
        Council::new(Vec::new(), CouncilConfig::default())
    }

    #[test]
    fn escalation_band_is_inclusive() {
        let c = council();
        let mk = |conf| ProviderResult {
            provider: "p".into(),
            flagged: false,
            confidence: conf,
            categories: CategoryScores::new(),
            latency_ms: 1,
        };
        assert!(c.should_escalate(&mk(0.30)));
        assert!(c.should_escalate(&mk(0.70)));
        assert!(c.should_escalate(&mk(0.5)));
        assert!(!c.should_escalate(&mk(0.29)));
        assert!(!c.should_escalate(&mk(0.71)));
    }

    #[test]
    fn unanimous_flagged_auto_decides() {
        let r = council().aggregate(vec![vote(true, 0.8), vote(true, 0.9)]);
        assert!(r.unanimous);
        assert_eq!(r.decision, CouncilDecision::Flagged);
    }

    #[test]
    fn unanimous_clean_auto_decides() {
        let r = council().aggregate(vec![vote(false, 0.8), vote(false, 0.7)]);
        assert_eq!(r.decision, CouncilDecision::Clean);
    }

    #[test]
    fn split_goes_to_human() {
        let r = council().aggregate(vec![vote(true, 0.8), vote(false, 0.8)]);
        assert!(!r.unanimous);
        assert_eq!(r.decision, CouncilDecision::HumanReview);
    }

    #[test]
    fn split_defaults_to_flagged_when_human_routing_disabled() {
        let config = CouncilConfig {
            send_splits_to_human: false,
            ..Default::default()
        };
        let c = Council::new(Vec::new(), config);
        let r = c.aggregate(vec![vote(true, 0.8), vote(false, 0.8)]);
        assert_eq!(r.decision, CouncilDecision::Flagged);
    }

    #[test]
    fn confident_majority_auto_decides() {
        let r = council().aggregate(vec![vote(true, 0.8), vote(true, 0.8), vote(false, 0.9)]);
        assert_eq!(r.decision, CouncilDecision::Flagged);
        assert!((r.majority_confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn weak_majority_goes_to_human() {
        let r = council().aggregate(vec![vote(true, 0.4), vote(true, 0.5), vote(false, 0.9)]);
        assert_eq!(r.decision, CouncilDecision::HumanReview);
    }

    #[test]
    fn weak_majority_decides_when_human_routing_disabled() {
        let config = CouncilConfig {
            send_low_confidence_to_human: false,
            ..Default::default()
        };
        let c = Council::new(Vec::new(), config);
        let r = c.aggregate(vec![vote(true, 0.4), vote(true, 0.5), vote(false, 0.9)]);
        assert_eq!(r.decision, CouncilDecision::Flagged);
    }

    #[test]
    fn unanimity_disabled_falls_through_to_majority() {
        let config = CouncilConfig {
            unanimous_auto_decide: false,
            ..Default::default()
        };
        let c = Council::new(Vec::new(), config);
        let r = c.aggregate(vec![vote(true, 0.9), vote(true, 0.9)]);
        // 2-0 is still a strict majority with high confidence
        assert_eq!(r.decision, CouncilDecision::Flagged);
    }
}
