// Context evaluation — intent, target, and sentiment signals.
//
// The same word can be an attack, a quotation, or an act of reclamation.
// Six independent pattern families feed a multiplicative harm-reduction
// factor that the local classifier applies to its raw severity. Factors are
// derived fresh per call and never persisted.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Why the speaker appears to be using the language they're using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Attack,
    Discuss,
    Quote,
    Reclaim,
    Educational,
    Unknown,
}

/// Who or what the language is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Person,
    Group,
    SelfTarget,
    Abstract,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// The full set of contextual signals for one piece of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextFactors {
    pub intent: Intent,
    pub target: Target,
    pub is_reclamation: bool,
    pub is_educational: bool,
    pub is_quoted: bool,
    pub is_self_referential: bool,
    pub sentiment: Sentiment,
}

// ---- Pattern families, compiled once ----

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

fn quoted_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            re(r#""[^"]+""#),
            re(r"“[^”]+”"),
            re(r"\b(he|she|they|someone) (said|wrote|called|told)\b"),
            re(r"\b(quoting|a quote from|according to)\b"),
        ]
    })
}

fn educational_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            re(r"\b(research|a study|studies show|historically|academic)\b"),
            re(r"\b(definition of|etymology|linguistics|in a historical context)\b"),
            re(r"\b(educational|for education|teaching about|a lecture on)\b"),
            re(r"\b(an article (on|about)|documented|scholars)\b"),
        ]
    })
}

fn reclamation_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            re(r"\bas an? \w+ (person|man|woman|guy|girl)\b"),
            re(r"\b(i|we) (reclaim|are reclaiming|reclaimed)\b"),
            re(r"\b(our word|our own word|taking (back|it back))\b"),
            re(r"\b(proud|proudly) (to be|call myself)\b"),
        ]
    })
}

fn self_reference_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            re(r"\b(i am|i'm|im) (a|an|such a|the)\b"),
            re(r"\b(myself|my own)\b"),
            re(r"\bcall myself\b"),
        ]
    })
}

fn attack_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        vec![
            re(r"\b(you are|you're|ur|youre) (a|an|such|so|all)?\b"),
            re(r"\byou\b.{0,30}\b(stupid|idiot|pathetic|worthless|disgusting)\b"),
            re(r"\ball \w+ (are|should)\b"),
            re(r"\bevery \w+ (is|deserves)\b"),
            re(r"\bgo (die|back to)\b"),
        ]
    })
}

const POSITIVE_WORDS: &[&str] = &[
    "love", "great", "wonderful", "happy", "thanks", "thank", "appreciate", "awesome", "good",
    "beautiful", "proud", "celebrate", "support", "friend", "kind",
];

const NEGATIVE_WORDS: &[&str] = &[
    "hate", "awful", "terrible", "disgusting", "stupid", "idiot", "worthless", "pathetic",
    "kill", "die", "ugly", "trash", "garbage", "worst", "horrible",
];

fn any_match(res: &[Regex], text: &str) -> bool {
    res.iter().any(|r| r.is_match(text))
}

fn count_words(lexicon: &[&str], text: &str) -> usize {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| lexicon.contains(w))
        .count()
}

/// Classify intent. Priority: reclaim > educational > quote > attack > discuss.
pub fn classify_intent(text: &str) -> Intent {
    if text.trim().is_empty() {
        return Intent::Unknown;
    }
    if any_match(reclamation_res(), text) {
        Intent::Reclaim
    } else if any_match(educational_res(), text) {
        Intent::Educational
    } else if any_match(quoted_res(), text) {
        Intent::Quote
    } else if any_match(attack_res(), text) {
        Intent::Attack
    } else {
        Intent::Discuss
    }
}

/// Identify the target. Priority: self > person > group > abstract > none.
pub fn identify_target(text: &str) -> Target {
    static GROUP: OnceLock<Vec<Regex>> = OnceLock::new();
    let group = GROUP.get_or_init(|| {
        vec![
            re(r"\b(all|every) \w+\b"),
            re(r"\b(they|them|those people|these people)\b"),
        ]
    });
    static ABSTRACT: OnceLock<Vec<Regex>> = OnceLock::new();
    let abstract_res =
        ABSTRACT.get_or_init(|| vec![re(r"\b(the word|the term|the slur|that word)\b")]);

    static PERSON: OnceLock<Regex> = OnceLock::new();
    let person = PERSON.get_or_init(|| re(r"\b(you|your|you're|youre|ur)\b"));

    if any_match(self_reference_res(), text) {
        Target::SelfTarget
    } else if person.is_match(text) {
        Target::Person
    } else if any_match(group, text) {
        Target::Group
    } else if any_match(abstract_res, text) {
        Target::Abstract
    } else {
        Target::None
    }
}

/// Bag-of-words sentiment. Negative wins only with a margin of 2 over
/// positive (and symmetrically), otherwise neutral.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let pos = count_words(POSITIVE_WORDS, text);
    let neg = count_words(NEGATIVE_WORDS, text);
    if neg > pos + 1 {
        Sentiment::Negative
    } else if pos > neg + 1 {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

/// Evaluate all contextual signals for `text`, optionally widened with
/// surrounding conversation turns.
pub fn evaluate(text: &str, conversation: &[String]) -> ContextFactors {
    let combined = if conversation.is_empty() {
        text.to_string()
    } else {
        format!("{} {}", conversation.join(" "), text)
    };
    let combined = combined.to_lowercase();

    ContextFactors {
        intent: classify_intent(&combined),
        target: identify_target(&combined),
        is_reclamation: any_match(reclamation_res(), &combined),
        is_educational: any_match(educational_res(), &combined),
        is_quoted: any_match(quoted_res(), &combined),
        is_self_referential: any_match(self_reference_res(), &combined),
        sentiment: analyze_sentiment(&combined),
    }
}

/// Compute the multiplicative harm-reduction factor from context signals.
///
/// Starts at 1.0 and applies, in order: boolean flags, then the intent
/// factor, then the target factor, then the sentiment factor. Values below
/// 1.0 suppress the raw severity ("I reclaim that word"); values above 1.0
/// amplify it ("you are a [slur]"). Clamped to [0.1, 2.0].
pub fn calculate_harm_reduction(factors: &ContextFactors) -> f64 {
    let mut reduction: f64 = 1.0;

    if factors.is_reclamation {
        reduction *= 0.2;
    }
    if factors.is_educational {
        reduction *= 0.3;
    }
    if factors.is_quoted {
        reduction *= 0.5;
    }
    if factors.is_self_referential && factors.target == Target::SelfTarget {
        reduction *= 0.6;
    }

    reduction *= match factors.intent {
        Intent::Reclaim => 0.2,
        Intent::Educational => 0.3,
        Intent::Quote => 0.5,
        Intent::Discuss => 0.7,
        // An attack makes the same words worse, not better
        Intent::Attack => 1.2,
        Intent::Unknown => 1.0,
    };

    reduction *= match factors.target {
        Target::Person => 1.3,
        Target::Group => 1.2,
        _ => 1.0,
    };

    reduction *= match factors.sentiment {
        Sentiment::Negative => 1.2,
        Sentiment::Positive => 0.8,
        Sentiment::Neutral => 1.0,
    };

    reduction.clamp(0.1, 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reclamation_beats_everything() {
        let text = "as a gay person, i reclaim queer";
        assert_eq!(classify_intent(text), Intent::Reclaim);
    }

    #[test]
    fn attack_intent() {
        assert_eq!(classify_intent("you are such an idiot"), Intent::Attack);
        assert_eq!(classify_intent("all women are inferior"), Intent::Attack);
    }

    #[test]
    fn discuss_is_default() {
        assert_eq!(classify_intent("nice weather today"), Intent::Discuss);
    }

    #[test]
    fn quote_intent() {
        assert_eq!(
            classify_intent("he said \"get out of here\" to me"),
            Intent::Quote
        );
    }

    #[test]
    fn target_priority_self_over_person() {
        // Contains "you" but the self-reference wins
        assert_eq!(identify_target("i'm an idiot, you know"), Target::SelfTarget);
    }

    #[test]
    fn target_person() {
        assert_eq!(identify_target("you are pathetic"), Target::Person);
    }

    #[test]
    fn target_group() {
        assert_eq!(identify_target("all lawyers are crooks"), Target::Group);
    }

    #[test]
    fn target_abstract() {
        assert_eq!(
            identify_target("the word has a complicated history"),
            Target::Abstract
        );
    }

    #[test]
    fn sentiment_needs_margin_of_two() {
        // one negative word, zero positive: neutral
        assert_eq!(analyze_sentiment("that movie was awful"), Sentiment::Neutral);
        // two negative, zero positive: negative
        assert_eq!(
            analyze_sentiment("awful and horrible in every way"),
            Sentiment::Negative
        );
        assert_eq!(
            analyze_sentiment("i love this, thank you, wonderful work"),
            Sentiment::Positive
        );
    }

    #[test]
    fn harm_reduction_reclamation_floor() {
        let factors = ContextFactors {
            intent: Intent::Reclaim,
            target: Target::SelfTarget,
            is_reclamation: true,
            is_educational: true,
            is_quoted: true,
            is_self_referential: true,
            sentiment: Sentiment::Positive,
        };
        // Every reducing factor at once still can't go below 0.1
        assert_eq!(calculate_harm_reduction(&factors), 0.1);
    }

    #[test]
    fn harm_reduction_attack_amplifies() {
        let factors = ContextFactors {
            intent: Intent::Attack,
            target: Target::Person,
            is_reclamation: false,
            is_educational: false,
            is_quoted: false,
            is_self_referential: false,
            sentiment: Sentiment::Negative,
        };
        // 1.2 * 1.3 * 1.2 = 1.872
        let r = calculate_harm_reduction(&factors);
        assert!((r - 1.872).abs() < 1e-9, "Expected 1.872, got {r}");
    }

    #[test]
    fn harm_reduction_never_exceeds_two() {
        for intent in [Intent::Attack, Intent::Discuss, Intent::Unknown] {
            for target in [Target::Person, Target::Group, Target::None] {
                for sentiment in [Sentiment::Negative, Sentiment::Positive, Sentiment::Neutral] {
                    let factors = ContextFactors {
                        intent,
                        target,
                        is_reclamation: false,
                        is_educational: false,
                        is_quoted: false,
                        is_self_referential: false,
                        sentiment,
                    };
                    let r = calculate_harm_reduction(&factors);
                    assert!((0.1..=2.0).contains(&r), "out of bounds: {r}");
                }
            }
        }
    }

    #[test]
    fn neutral_text_has_discuss_factor() {
        let factors = evaluate("talking about the weather", &[]);
        assert_eq!(factors.intent, Intent::Discuss);
        let r = calculate_harm_reduction(&factors);
        assert!((r - 0.7).abs() < 1e-9);
    }
}
