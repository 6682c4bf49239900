// Script routing — decide whether local pattern rules apply.
//
// The local rule tables assume Latin orthography. Text in any other script
// (or heavily mixed text) bypasses the fast path and goes straight to the
// remote tiers, where the classifiers are multilingual.

use serde::{Deserialize, Serialize};

/// Dominant Unicode script of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    Latin,
    /// CJK ideographs plus hiragana, katakana, and hangul
    Cjk,
    Cyrillic,
    Arabic,
    Hebrew,
    Thai,
    Devanagari,
    Greek,
    /// No single script dominates (>80% primary with a >20% secondary)
    Mixed,
    /// No letters counted at all
    Unknown,
}

impl Script {
    pub fn as_str(&self) -> &'static str {
        match self {
            Script::Latin => "latin",
            Script::Cjk => "cjk",
            Script::Cyrillic => "cyrillic",
            Script::Arabic => "arabic",
            Script::Hebrew => "hebrew",
            Script::Thai => "thai",
            Script::Devanagari => "devanagari",
            Script::Greek => "greek",
            Script::Mixed => "mixed",
            Script::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Router output: the detected script plus the routing decision derived from it.
#[derive(Debug, Clone)]
pub struct LanguageInfo {
    pub script: Script,
    /// True when the local pattern rules cannot be trusted for this text
    pub should_skip_fast_path: bool,
}

// Buckets indexed in a fixed order so ties resolve deterministically.
const BUCKETS: [Script; 8] = [
    Script::Latin,
    Script::Cjk,
    Script::Cyrillic,
    Script::Arabic,
    Script::Hebrew,
    Script::Thai,
    Script::Devanagari,
    Script::Greek,
];

fn bucket_of(c: char) -> Option<usize> {
    let cp = c as u32;
    match cp {
        // Basic Latin letters, Latin-1 supplement, Latin Extended-A/B
        0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F => Some(0),
        // CJK unified ideographs, extensions A, compatibility
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF => Some(1),
        // Hiragana, katakana
        0x3040..=0x309F | 0x30A0..=0x30FF => Some(1),
        // Hangul syllables and jamo
        0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F => Some(1),
        0x0400..=0x04FF | 0x0500..=0x052F => Some(2),
        0x0600..=0x06FF | 0x0750..=0x077F => Some(3),
        0x0590..=0x05FF => Some(4),
        0x0E00..=0x0E7F => Some(5),
        0x0900..=0x097F => Some(6),
        0x0370..=0x03FF | 0x1F00..=0x1FFF => Some(7),
        _ => None,
    }
}

/// Detect the dominant script of `text`.
///
/// Whitespace, digits, and basic punctuation are excluded from counting.
/// If the top bucket holds more than 80% of counted letters it wins outright;
/// otherwise a secondary bucket above 20% makes the text `Mixed`.
pub fn detect_script(text: &str) -> Script {
    let mut counts = [0usize; 8];
    for c in text.chars() {
        if let Some(i) = bucket_of(c) {
            counts[i] += 1;
        }
    }

    let total: usize = counts.iter().sum();
    if total == 0 {
        return Script::Unknown;
    }

    let (top_idx, &top) = counts
        .iter()
        .enumerate()
        .max_by_key(|(_, &n)| n)
        .unwrap_or((0, &0));
    let second = counts
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != top_idx)
        .map(|(_, &n)| n)
        .max()
        .unwrap_or(0);

    let top_frac = top as f64 / total as f64;
    if top_frac > 0.80 {
        BUCKETS[top_idx]
    } else if second as f64 / total as f64 > 0.20 {
        Script::Mixed
    } else {
        BUCKETS[top_idx]
    }
}

/// Detect the script and derive the fast-path routing decision.
pub fn analyze_language(text: &str) -> LanguageInfo {
    let script = detect_script(text);
    LanguageInfo {
        script,
        should_skip_fast_path: !matches!(script, Script::Latin | Script::Unknown),
    }
}
