// Core data model — the types that flow through the moderation pipeline.
//
// These are separate from the pipeline logic so callers (CLI, tests,
// downstream services) can use them without depending on the orchestrator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The closed set of content categories the engine scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationCategory {
    HateSpeech,
    Harassment,
    SexualHarassment,
    Violence,
    Threats,
    SelfHarm,
    DrugsIllegal,
    Profanity,
    ChildSafety,
    PersonalInfo,
    SpamScam,
}

impl ModerationCategory {
    pub const ALL: [ModerationCategory; 11] = [
        ModerationCategory::HateSpeech,
        ModerationCategory::Harassment,
        ModerationCategory::SexualHarassment,
        ModerationCategory::Violence,
        ModerationCategory::Threats,
        ModerationCategory::SelfHarm,
        ModerationCategory::DrugsIllegal,
        ModerationCategory::Profanity,
        ModerationCategory::ChildSafety,
        ModerationCategory::PersonalInfo,
        ModerationCategory::SpamScam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationCategory::HateSpeech => "hate_speech",
            ModerationCategory::Harassment => "harassment",
            ModerationCategory::SexualHarassment => "sexual_harassment",
            ModerationCategory::Violence => "violence",
            ModerationCategory::Threats => "threats",
            ModerationCategory::SelfHarm => "self_harm",
            ModerationCategory::DrugsIllegal => "drugs_illegal",
            ModerationCategory::Profanity => "profanity",
            ModerationCategory::ChildSafety => "child_safety",
            ModerationCategory::PersonalInfo => "personal_info",
            ModerationCategory::SpamScam => "spam_scam",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// Categories that always require remote verification regardless of
    /// local confidence (the cost of a miss is too high).
    pub fn is_high_priority(&self) -> bool {
        matches!(
            self,
            ModerationCategory::ChildSafety
                | ModerationCategory::Threats
                | ModerationCategory::SelfHarm
        )
    }
}

impl std::fmt::Display for ModerationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-category confidence scores in [0, 1].
/// A missing key means the category was not scored, not that it scored zero.
pub type CategoryScores = HashMap<ModerationCategory, f64>;

/// Merge two score maps by per-category max.
///
/// Used when combining local and remote results: the local classifier catches
/// obfuscated terms that remote classifiers under-score, so neither side is
/// allowed to pull a category's score down.
pub fn merge_scores(a: &CategoryScores, b: &CategoryScores) -> CategoryScores {
    let mut merged = a.clone();
    for (cat, score) in b {
        let entry = merged.entry(*cat).or_insert(0.0);
        if *score > *entry {
            *entry = *score;
        }
    }
    merged
}

/// The externally visible outcome of a `moderate()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Allow,
    Deny,
    Escalate,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Allow => "allow",
            ModerationAction::Deny => "deny",
            ModerationAction::Escalate => "escalate",
        }
    }
}

impl std::fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The uniform result shape every classifier (local or remote) returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Name of the provider that produced this result
    pub provider: String,
    pub flagged: bool,
    /// Confidence in the flagged/clean call, 0.0 to 1.0
    pub confidence: f64,
    pub categories: CategoryScores,
    pub latency_ms: u64,
}

/// Which pipeline stage produced the final decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Local,
    Api,
    Council,
    Human,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Local => "local",
            Tier::Api => "api",
            Tier::Council => "council",
            Tier::Human => "human",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Full provenance of a decision: which tiers ran, which were skipped, why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierInfo {
    pub tier: Tier,
    /// Human-readable explanation of how the decision was reached
    pub reason: String,
    pub local_latency_ms: u64,
    pub api_latency_ms: Option<u64>,
    pub council_latency_ms: Option<u64>,
    pub skipped_api: bool,
    pub skipped_council: bool,
    /// Dominant script label from the router (e.g. "latin", "cjk", "mixed")
    pub language: String,
}

/// A byte range of the normalized text where a rule matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedSpan {
    pub term: String,
    pub start: usize,
    pub end: usize,
    pub category: ModerationCategory,
}

/// The immutable outcome of one `moderate()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    pub action: ModerationAction,
    /// Adjusted severity, 0.0 to 1.0
    pub severity: f64,
    /// Confidence in the action, 0.0 to 1.0
    pub confidence: f64,
    pub categories: CategoryScores,
    pub flagged_spans: Vec<FlaggedSpan>,
    pub tier_info: TierInfo,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trip_all_variants() {
        for cat in ModerationCategory::ALL {
            assert_eq!(ModerationCategory::from_str(cat.as_str()), Some(cat));
        }
    }

    #[test]
    fn category_from_str_unknown() {
        assert_eq!(ModerationCategory::from_str("gibberish"), None);
    }

    #[test]
    fn high_priority_categories() {
        assert!(ModerationCategory::ChildSafety.is_high_priority());
        assert!(ModerationCategory::Threats.is_high_priority());
        assert!(ModerationCategory::SelfHarm.is_high_priority());
        assert!(!ModerationCategory::Profanity.is_high_priority());
    }

    #[test]
    fn merge_takes_per_category_max() {
        let mut a = CategoryScores::new();
        a.insert(ModerationCategory::Profanity, 0.8);
        a.insert(ModerationCategory::Harassment, 0.3);
        let mut b = CategoryScores::new();
        b.insert(ModerationCategory::Harassment, 0.6);
        b.insert(ModerationCategory::Violence, 0.4);

        let merged = merge_scores(&a, &b);
        assert_eq!(merged[&ModerationCategory::Profanity], 0.8);
        assert_eq!(merged[&ModerationCategory::Harassment], 0.6);
        assert_eq!(merged[&ModerationCategory::Violence], 0.4);
    }

    #[test]
    fn merge_missing_key_stays_missing() {
        let a = CategoryScores::new();
        let b = CategoryScores::new();
        let merged = merge_scores(&a, &b);
        assert!(!merged.contains_key(&ModerationCategory::SpamScam));
    }
}
