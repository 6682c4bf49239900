// Static rule tables for the local classifier.
//
// Plain data, separate from the scoring algorithm, so the tables can be
// audited and tested in isolation. Patterns run against *normalized* text
// (lowercase, de-obfuscated), so they only need to cover canonical spellings.
//
// Confidence encodes how sure we are the match means what it looks like:
// severe slurs are near-unambiguous (0.80-0.95), standard profanity is
// common enough in benign speech to sit lower (0.75-0.85).

use crate::types::ModerationCategory;

/// One entry in a rule table.
pub struct Rule {
    /// Regex matched against the normalized text
    pub pattern: &'static str,
    pub categories: &'static [ModerationCategory],
    /// Raw severity contribution in [0, 1]
    pub severity: f64,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

use ModerationCategory::*;

pub const SEVERE_SLURS: &[Rule] = &[
    Rule {
        pattern: r"\bnigg(er|a)s?\b",
        categories: &[HateSpeech, Harassment],
        severity: 0.95,
        confidence: 0.95,
    },
    Rule {
        pattern: r"\bfaggots?\b",
        categories: &[HateSpeech, Harassment],
        severity: 0.9,
        confidence: 0.9,
    },
    Rule {
        pattern: r"\bkikes?\b",
        categories: &[HateSpeech],
        severity: 0.9,
        confidence: 0.85,
    },
    Rule {
        pattern: r"\btrann(y|ies)\b",
        categories: &[HateSpeech, Harassment],
        severity: 0.85,
        confidence: 0.85,
    },
    Rule {
        pattern: r"\bretards?\b",
        categories: &[HateSpeech, Harassment],
        severity: 0.7,
        confidence: 0.8,
    },
    // Reclaimable: high base severity, context routinely suppresses it
    Rule {
        pattern: r"\bqueers?\b",
        categories: &[HateSpeech],
        severity: 0.6,
        confidence: 0.8,
    },
];

pub const PROFANITY: &[Rule] = &[
    Rule {
        pattern: r"\bfuck(er|ing|ed)?\b",
        categories: &[Profanity],
        severity: 0.55,
        confidence: 0.85,
    },
    Rule {
        pattern: r"\bshit(ty|head)?\b",
        categories: &[Profanity],
        severity: 0.45,
        confidence: 0.8,
    },
    Rule {
        pattern: r"\bbitch(es)?\b",
        categories: &[Profanity, Harassment],
        severity: 0.55,
        confidence: 0.8,
    },
    Rule {
        pattern: r"\basshole?s?\b",
        categories: &[Profanity, Harassment],
        severity: 0.5,
        confidence: 0.8,
    },
    Rule {
        pattern: r"\bcunts?\b",
        categories: &[Profanity, Harassment],
        severity: 0.7,
        confidence: 0.8,
    },
    Rule {
        pattern: r"\b(stupid|pathetic|worthless) (idiot|moron|loser)s?\b",
        categories: &[Harassment],
        severity: 0.6,
        confidence: 0.8,
    },
    Rule {
        pattern: r"\b(idiot|moron|loser|dumbass)s?\b",
        categories: &[Harassment],
        severity: 0.45,
        confidence: 0.75,
    },
];

pub const THREATS: &[Rule] = &[
    Rule {
        pattern: r"\bi('ll| will| am going to| wil)? ?(gonna )?(kill|murder|hurt|beat) (you|him|her|them)\b",
        categories: &[Threats, Violence],
        severity: 0.95,
        confidence: 0.9,
    },
    Rule {
        pattern: r"\byou('re| are)? (gonna|going to) (die|regret|pay)\b",
        categories: &[Threats],
        severity: 0.85,
        confidence: 0.85,
    },
    Rule {
        pattern: r"\bi know where you live\b",
        categories: &[Threats, PersonalInfo],
        severity: 0.85,
        confidence: 0.85,
    },
    Rule {
        pattern: r"\bwatch your back\b",
        categories: &[Threats],
        severity: 0.7,
        confidence: 0.75,
    },
];

pub const SELF_HARM: &[Rule] = &[
    Rule {
        pattern: r"\bkill yourself\b",
        categories: &[SelfHarm, Threats, Harassment],
        severity: 0.95,
        confidence: 0.9,
    },
    Rule {
        pattern: r"\bkys\b",
        categories: &[SelfHarm, Threats, Harassment],
        severity: 0.9,
        confidence: 0.85,
    },
    Rule {
        pattern: r"\bi want to (die|kill myself|end it)\b",
        categories: &[SelfHarm],
        severity: 0.9,
        confidence: 0.9,
    },
    Rule {
        pattern: r"\b(cutting|hurting) myself\b",
        categories: &[SelfHarm],
        severity: 0.85,
        confidence: 0.85,
    },
];

/// Short greetings and simple affirmations: a match here (with nothing from
/// the tables above) is a high-confidence clean signal.
pub const CLEAN_INDICATORS: &[Rule] = &[
    Rule {
        pattern: r"^(hi|hello|hey|good (morning|afternoon|evening))\b[!,.?\s\w]*$",
        categories: &[],
        severity: 0.0,
        confidence: 0.9,
    },
    Rule {
        pattern: r"^(thanks|thank you|ok|okay|yes|no|sure|great|sounds good)[!,.?\s]*$",
        categories: &[],
        severity: 0.0,
        confidence: 0.9,
    },
    Rule {
        pattern: r"^how are you\b[!,.?\s\w]*$",
        categories: &[],
        severity: 0.0,
        confidence: 0.9,
    },
];
