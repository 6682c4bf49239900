// Text normalization — reverses common obfuscation before pattern matching.
//
// The pipeline is deterministic and order-sensitive: invisible characters are
// stripped first (so they can't break homoglyph runs), then homoglyphs and
// leetspeak are mapped to ASCII, then spaced-out letters are collapsed, then
// repeated-character padding is squashed, and finally the text is lowercased.
// Running the pipeline twice produces the same output as running it once.

pub mod tables;

use std::sync::OnceLock;

use regex_lite::Regex;

/// Letters separated one-by-one by spaces or filler punctuation,
/// e.g. "f u c k" or "k-i-l-l".
fn spaced_letters_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:[a-zA-Z][ \t.\-_*]+){2,}[a-zA-Z]\b").expect("static regex")
    })
}

fn homoglyph(c: char) -> Option<char> {
    if let Some(&(_, to)) = tables::HOMOGLYPHS.iter().find(|(from, _)| *from == c) {
        return Some(to);
    }
    if let Some(&(_, to)) = tables::SMALL_CAPS.iter().find(|(from, _)| *from == c) {
        return Some(to);
    }
    tables::block_homoglyph(c)
}

fn leet(c: char) -> Option<char> {
    tables::LEET
        .iter()
        .find(|(from, _)| *from == c)
        .map(|&(_, to)| to)
}

fn is_leet_symbol(c: char) -> bool {
    matches!(c, '@' | '$' | '!' | '+' | '€')
}

fn is_invisible(c: char) -> bool {
    tables::INVISIBLE.contains(&c)
}

fn is_wordish(c: char) -> bool {
    c.is_ascii_alphabetic() || leet(c).is_some()
}

/// Map leetspeak characters inside one word run.
///
/// A run with no real letter ("1234", "!!!") is left untouched. Leet digits
/// map anywhere inside the run; leet symbols map only while a real letter
/// still follows them, so trailing punctuation survives ("hi!", "wow!!!").
///
/// Returns the mapped run and whether any character was substituted.
fn map_run(run: &[char]) -> (String, bool) {
    let has_letter = run.iter().any(|c| c.is_ascii_alphabetic());
    if !has_letter {
        return (run.iter().collect(), false);
    }
    let last_letter = run
        .iter()
        .rposition(|c| c.is_ascii_alphabetic())
        .unwrap_or(0);
    let mut out = String::with_capacity(run.len());
    let mut changed = false;
    for (i, &c) in run.iter().enumerate() {
        if c.is_ascii_alphabetic() {
            out.push(c);
            continue;
        }
        let trailing_symbol = is_leet_symbol(c) && i > last_letter;
        match leet(c) {
            Some(mapped) if !trailing_symbol => {
                out.push(mapped);
                changed = true;
            }
            _ => out.push(c),
        }
    }
    (out, changed)
}

/// Apply `f` to each maximal run of letters and leet characters in `text`.
fn for_each_run<F: FnMut(&[char], &mut String)>(text: &str, mut f: F) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if is_wordish(chars[i]) {
            let start = i;
            while i < chars.len() && is_wordish(chars[i]) {
                i += 1;
            }
            f(&chars[start..i], &mut out);
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Collapse runs of 3+ identical characters down to 2 ("heyyyy" -> "heyy").
/// Case-insensitive so that lowercasing afterwards can't re-expose a run.
fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut run = 0usize;
    for c in text.chars() {
        if prev.is_some_and(|p| p.eq_ignore_ascii_case(&c)) {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run <= 2 {
            out.push(c);
        }
    }
    out
}

/// Collapse spaced-out single letters ("f u c k" -> "fuck") by removing the
/// separator characters inside each matched sequence.
fn collapse_spaced_letters(text: &str) -> String {
    spaced_letters_re()
        .replace_all(text, |caps: &regex_lite::Captures| {
            caps[0]
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .collect::<String>()
        })
        .into_owned()
}

/// Run the full normalization pipeline.
pub fn normalize(text: &str) -> String {
    // 1. Strip zero-width / invisible codepoints
    let stripped: String = text.chars().filter(|c| !is_invisible(*c)).collect();

    // 2. Homoglyphs to ASCII
    let deglyphed: String = stripped.chars().map(|c| homoglyph(c).unwrap_or(c)).collect();

    // 3. Leetspeak inside words
    let deleeted = for_each_run(&deglyphed, |run, out| {
        let (mapped, _) = map_run(run);
        out.push_str(&mapped);
    });

    // 4. Spaced-out letters
    let unspaced = collapse_spaced_letters(&deleeted);

    // 5. Repeated-character padding
    let collapsed = collapse_repeats(&unspaced);

    // 6. Lowercase
    collapsed.to_lowercase()
}

/// Report whether the text shows signs of deliberate obfuscation.
///
/// This is independent of whether normalization visibly changes the text: a
/// zero-width character is obfuscation even though stripping it is invisible.
pub fn has_obfuscation(text: &str) -> bool {
    if text.chars().any(is_invisible) {
        return true;
    }
    if text.chars().any(|c| homoglyph(c).is_some()) {
        return true;
    }
    let mut leet_in_word = false;
    for_each_run(text, |run, _out| {
        let (_, changed) = map_run(run);
        if changed {
            leet_in_word = true;
        }
    });
    if leet_in_word {
        return true;
    }
    spaced_letters_re().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_zero_width() {
        assert_eq!(normalize("he\u{200B}llo"), "hello");
        assert_eq!(normalize("\u{FEFF}hi"), "hi");
    }

    #[test]
    fn maps_cyrillic_homoglyphs() {
        // Cyrillic а and о standing in for Latin letters
        assert_eq!(normalize("cаt"), "cat");
        assert_eq!(normalize("dоg"), "dog");
    }

    #[test]
    fn maps_fullwidth() {
        assert_eq!(normalize("ＨＥＬＬＯ"), "hello");
    }

    #[test]
    fn maps_leet_inside_words() {
        assert_eq!(normalize("n1gg3r"), "nigger");
        assert_eq!(normalize("sh17"), "shit");
        assert_eq!(normalize("b!tch"), "bitch");
        assert_eq!(normalize("@ss"), "ass");
    }

    #[test]
    fn trailing_punctuation_survives() {
        assert_eq!(normalize("hi!"), "hi!");
        assert_eq!(normalize("stop it!"), "stop it!");
        assert_eq!(normalize("wow!!!"), "wow!!");
    }

    #[test]
    fn standalone_digits_survive() {
        assert_eq!(normalize("i have 2 cats"), "i have 2 cats");
        assert_eq!(normalize("call 911"), "call 911");
    }

    #[test]
    fn collapses_spaced_letters() {
        assert_eq!(normalize("f u c k"), "fuck");
        assert_eq!(normalize("k-i-l-l"), "kill");
        assert_eq!(normalize("s.t.u.p.i.d"), "stupid");
    }

    #[test]
    fn two_spaced_letters_not_collapsed() {
        // "a b" is only two letters — below the 3-letter minimum
        assert_eq!(normalize("a b"), "a b");
    }

    #[test]
    fn collapses_repeats() {
        assert_eq!(normalize("heyyyyy"), "heyy");
        assert_eq!(normalize("nooooo way"), "noo way");
    }

    #[test]
    fn lowercases() {
        assert_eq!(normalize("HELLO World"), "hello world");
    }

    #[test]
    fn idempotent() {
        for input in [
            "n1gg3r",
            "f u c k you",
            "he\u{200B}llo",
            "HEYYYY",
            "heYyyy",
            "normal text stays normal",
            "ＦＵＣＫ",
            "са1m dоwn",
            "hi!",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn obfuscation_positive_cases() {
        assert!(has_obfuscation("n1gg3r"));
        assert!(has_obfuscation("f u c k"));
        assert!(has_obfuscation("he\u{200B}llo"));
        assert!(has_obfuscation("cаt")); // Cyrillic а
    }

    #[test]
    fn obfuscation_negative_cases() {
        assert!(!has_obfuscation("hello"));
        assert!(!has_obfuscation("hello!"));
        assert!(!has_obfuscation("i have 2 cats"));
        assert!(!has_obfuscation("meet at 10"));
    }
}
