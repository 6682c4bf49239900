// Fast-path policy — can the local tier decide alone?
//
// Checked in order, first match wins. Anything the local tier can't settle
// becomes an escalation to the remote tiers; the policy itself never talks
// to the network.

use crate::classify::LocalClassification;
use crate::config::ModerationConfig;
use crate::script::LanguageInfo;
use crate::types::ModerationAction;

/// The policy's verdict plus the rule that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FastPathDecision {
    pub action: ModerationAction,
    pub reason: String,
    /// True when the local tier settled the case (allow or deny)
    pub fast_pathed: bool,
}

fn decision(action: ModerationAction, reason: &str) -> FastPathDecision {
    FastPathDecision {
        action,
        reason: reason.to_string(),
        fast_pathed: action != ModerationAction::Escalate,
    }
}

/// A short token without context can be a cross-lingual homophone or an
/// in-group usage; these must never be auto-denied on local evidence alone.
fn is_short_ambiguous(text: &str, config: &ModerationConfig) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() <= 5 {
        return true;
    }
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() == 1 && trimmed.chars().count() <= 10 {
        return true;
    }
    let lower = trimmed.to_lowercase();
    config.homophone_traps.iter().any(|trap| lower == *trap)
}

/// Evaluate the fast-path rules for one local classification.
pub fn evaluate(
    config: &ModerationConfig,
    language: &LanguageInfo,
    local: &LocalClassification,
    has_context: bool,
) -> FastPathDecision {
    let naive = evaluate_naive(config, language, local);

    // Short ambiguous tokens without context must never be auto-denied
    if naive.action == ModerationAction::Deny
        && !has_context
        && is_short_ambiguous(&local.normalized, config)
    {
        return decision(
            ModerationAction::Escalate,
            "short ambiguous input without context; deny requires remote verification",
        );
    }
    naive
}

fn evaluate_naive(
    config: &ModerationConfig,
    language: &LanguageInfo,
    local: &LocalClassification,
) -> FastPathDecision {
    // 1. Local rules assume Latin orthography
    if language.should_skip_fast_path {
        return decision(
            ModerationAction::Escalate,
            &format!("{} script cannot use local pattern rules", language.script),
        );
    }

    // 2. Always-verify categories are too costly to miss
    for cat in &config.always_verify {
        if let Some(score) = local.categories.get(cat) {
            if *score > config.always_verify_score {
                return decision(
                    ModerationAction::Escalate,
                    &format!("always-verify category {cat} scored {score:.2} locally"),
                );
            }
        }
    }

    // 3. Not confident enough to decide alone
    if local.confidence < config.confidence_floor {
        return decision(
            ModerationAction::Escalate,
            &format!(
                "local confidence {:.2} below floor {:.2}",
                local.confidence, config.confidence_floor
            ),
        );
    }

    // 4. Confident, clearly over the block line
    if local.adjusted_severity >= config.block_threshold {
        return decision(
            ModerationAction::Deny,
            &format!(
                "adjusted severity {:.2} at or above block threshold {:.2}",
                local.adjusted_severity, config.block_threshold
            ),
        );
    }

    // 5. Confident, clearly clean
    if local.adjusted_severity <= config.allow_threshold && local.detected_terms.is_empty() {
        return decision(
            ModerationAction::Allow,
            &format!(
                "adjusted severity {:.2} at or below allow threshold with no detected terms",
                local.adjusted_severity
            ),
        );
    }

    // 6. The grey zone
    decision(
        ModerationAction::Escalate,
        "severity in the uncertain band; remote verification required",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify;
    use crate::script;

    fn run(text: &str, has_context: bool) -> FastPathDecision {
        let config = ModerationConfig::default();
        let language = script::analyze_language(text);
        let local = classify::classify(text, &[]);
        evaluate(&config, &language, &local, has_context)
    }

    #[test]
    fn clean_greeting_fast_path_allows() {
        let d = run("hello, how are you?", false);
        assert_eq!(d.action, ModerationAction::Allow);
        assert!(d.fast_pathed);
    }

    #[test]
    fn direct_attack_fast_path_denies() {
        let d = run("fuck you, you stupid idiot", false);
        assert_eq!(d.action, ModerationAction::Deny);
    }

    #[test]
    fn non_latin_escalates() {
        let d = run("こんにちは", false);
        assert_eq!(d.action, ModerationAction::Escalate);
        assert!(!d.fast_pathed);
    }

    #[test]
    fn always_verify_beats_severity() {
        // Matches self_harm and threats; would otherwise be a plain deny
        let d = run("kill yourself", false);
        assert_eq!(d.action, ModerationAction::Escalate);
        assert!(d.reason.contains("always-verify"));
    }

    #[test]
    fn uncertain_text_escalates() {
        let d = run("the quarterly report numbers look regional", false);
        assert_eq!(d.action, ModerationAction::Escalate);
        assert!(d.reason.contains("confidence"));
    }

    fn run_with_block(text: &str, block_threshold: f64, has_context: bool) -> FastPathDecision {
        let config = ModerationConfig {
            block_threshold,
            ..Default::default()
        };
        let language = script::analyze_language(text);
        let local = classify::classify(text, &[]);
        evaluate(&config, &language, &local, has_context)
    }

    #[test]
    fn short_slur_without_context_escalates_instead_of_denying() {
        // Single word over a tight block line: the naive result is deny,
        // but a bare token without context must escalate instead
        let d = run_with_block("faggot", 0.6, false);
        assert_eq!(d.action, ModerationAction::Escalate);
        assert!(d.reason.contains("without context"));
    }

    #[test]
    fn context_permits_short_token_denial() {
        let d = run_with_block("faggot", 0.6, true);
        assert_eq!(d.action, ModerationAction::Deny);
    }

    #[test]
    fn homophone_trap_never_auto_denied() {
        let config = ModerationConfig::default();
        assert!(is_short_ambiguous("slut", &config));
        assert!(is_short_ambiguous("bitte", &config));
        assert!(!is_short_ambiguous("a longer ordinary sentence", &config));
    }
}
