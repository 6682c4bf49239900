// Local pattern classifier — the sub-millisecond tier.
//
// Runs the static rule tables against normalized text and produces category
// scores, a confidence estimate, and diagnostic metadata. Context's
// harm-reduction factor is applied here so the moderator's fast-path policy
// sees the adjusted severity.

pub mod rules;

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::context::{self, ContextFactors};
use crate::normalize;
use crate::types::{CategoryScores, FlaggedSpan, ModerationCategory, ProviderResult};

struct CompiledRule {
    re: Regex,
    categories: &'static [ModerationCategory],
    severity: f64,
    confidence: f64,
}

fn compile(table: &'static [rules::Rule]) -> Vec<CompiledRule> {
    table
        .iter()
        .map(|r| CompiledRule {
            re: Regex::new(r.pattern).expect("static rule pattern"),
            categories: r.categories,
            severity: r.severity,
            confidence: r.confidence,
        })
        .collect()
}

// Tables that contribute detections, in evaluation order. Profanity runs
// last so its confidence-overwrite exception sees the severity the severe
// tables have already established.
fn detection_tables() -> &'static [(&'static str, Vec<CompiledRule>); 4] {
    static TABLES: OnceLock<[(&'static str, Vec<CompiledRule>); 4]> = OnceLock::new();
    TABLES.get_or_init(|| {
        [
            ("slur", compile(rules::SEVERE_SLURS)),
            ("threat", compile(rules::THREATS)),
            ("self_harm", compile(rules::SELF_HARM)),
            ("profanity", compile(rules::PROFANITY)),
        ]
    })
}

fn clean_table() -> &'static Vec<CompiledRule> {
    static TABLE: OnceLock<Vec<CompiledRule>> = OnceLock::new();
    TABLE.get_or_init(|| compile(rules::CLEAN_INDICATORS))
}

/// Base confidence when nothing matches: genuinely uncertain, below the
/// default fast-path floor, so unknown text escalates to the remote tier.
const BASE_CONFIDENCE: f64 = 0.6;

/// Everything the local tier knows about one piece of text.
#[derive(Debug, Clone)]
pub struct LocalClassification {
    /// Per-category severity after harm reduction
    pub categories: CategoryScores,
    pub raw_severity: f64,
    pub adjusted_severity: f64,
    pub confidence: f64,
    pub detected_terms: Vec<String>,
    pub flagged_spans: Vec<FlaggedSpan>,
    pub obfuscation: bool,
    pub harm_reduction: f64,
    pub factors: ContextFactors,
    /// The normalized text the rules actually ran against
    pub normalized: String,
}

impl LocalClassification {
    /// Present the local tier in the uniform provider shape.
    pub fn as_provider_result(&self, latency_ms: u64) -> ProviderResult {
        ProviderResult {
            provider: "local".to_string(),
            flagged: self.adjusted_severity >= 0.5,
            confidence: self.confidence,
            categories: self.categories.clone(),
            latency_ms,
        }
    }
}

/// Classify `text`, optionally widened with surrounding conversation turns.
///
/// Normalization, context evaluation, and rule matching all happen here;
/// the result carries both raw and adjusted severity for diagnostics.
pub fn classify(text: &str, conversation: &[String]) -> LocalClassification {
    let normalized = normalize::normalize(text);
    let obfuscation = normalize::has_obfuscation(text);
    let factors = context::evaluate(&normalized, conversation);

    let mut raw_categories: CategoryScores = CategoryScores::new();
    let mut raw_severity = 0.0_f64;
    let mut confidence = BASE_CONFIDENCE;
    let mut any_confidence_set = false;
    let mut detected_terms = Vec::new();
    let mut flagged_spans = Vec::new();

    for (table_name, table) in detection_tables() {
        let is_profanity_table = *table_name == "profanity";
        for rule in table {
            for m in rule.re.find_iter(&normalized) {
                for cat in rule.categories {
                    let entry = raw_categories.entry(*cat).or_insert(0.0);
                    if rule.severity > *entry {
                        *entry = rule.severity;
                    }
                }
                if let Some(primary) = rule.categories.first() {
                    flagged_spans.push(FlaggedSpan {
                        term: m.as_str().to_string(),
                        start: m.start(),
                        end: m.end(),
                        category: *primary,
                    });
                }
                if !detected_terms.contains(&m.as_str().to_string()) {
                    detected_terms.push(m.as_str().to_string());
                }

                // Running-max confidence. The profanity exception: a
                // profanity-table confidence only overwrites the running max
                // if it is higher AND the running severity is still below
                // 0.7, so a coincidental profanity match can't dilute a
                // slur-driven high-confidence signal.
                let overwrite = if is_profanity_table {
                    rule.confidence > confidence && raw_severity < 0.7
                } else {
                    rule.confidence > confidence || !any_confidence_set
                };
                if overwrite {
                    confidence = confidence.max(rule.confidence);
                    any_confidence_set = true;
                }

                if rule.severity > raw_severity {
                    raw_severity = rule.severity;
                }
            }
        }
    }

    // Clean-text heuristic: only meaningful when nothing was detected
    if detected_terms.is_empty() {
        for rule in clean_table() {
            if rule.re.is_match(&normalized) {
                confidence = confidence.max(rule.confidence);
                break;
            }
        }
    }

    let harm_reduction = context::calculate_harm_reduction(&factors);
    let adjusted_severity = (raw_severity * harm_reduction).min(1.0);

    // Context changed the picture a lot: trust the local read less
    if harm_reduction < 0.5 && raw_severity > 0.5 {
        confidence *= 0.7;
    }

    let categories: CategoryScores = raw_categories
        .iter()
        .map(|(cat, sev)| (*cat, (sev * harm_reduction).min(1.0)))
        .collect();

    LocalClassification {
        categories,
        raw_severity,
        adjusted_severity,
        confidence,
        detected_terms,
        flagged_spans,
        obfuscation,
        harm_reduction,
        factors,
        normalized,
    }
}
