// Static character tables for the normalizer.
//
// Kept as plain data, separate from the pipeline, so the mappings can be
// audited and tested in isolation. Each entry maps one obfuscation character
// to the ASCII letter it visually imitates.

/// Single-codepoint homoglyphs: Cyrillic, Greek, and a few stragglers that
/// don't fall into a contiguous block handled by `block_homoglyph`.
pub const HOMOGLYPHS: &[(char, char)] = &[
    // Cyrillic lookalikes
    ('а', 'a'),
    ('е', 'e'),
    ('о', 'o'),
    ('р', 'p'),
    ('с', 'c'),
    ('х', 'x'),
    ('у', 'y'),
    ('і', 'i'),
    ('ѕ', 's'),
    ('ј', 'j'),
    ('һ', 'h'),
    ('ԁ', 'd'),
    ('ԛ', 'q'),
    ('ѡ', 'w'),
    ('А', 'a'),
    ('В', 'b'),
    ('Е', 'e'),
    ('К', 'k'),
    ('М', 'm'),
    ('Н', 'h'),
    ('О', 'o'),
    ('Р', 'p'),
    ('С', 'c'),
    ('Т', 't'),
    ('Х', 'x'),
    // Greek lookalikes
    ('α', 'a'),
    ('β', 'b'),
    ('ε', 'e'),
    ('ι', 'i'),
    ('κ', 'k'),
    ('ν', 'v'),
    ('ο', 'o'),
    ('ρ', 'p'),
    ('τ', 't'),
    ('υ', 'u'),
    ('χ', 'x'),
    ('Α', 'a'),
    ('Β', 'b'),
    ('Ε', 'e'),
    ('Η', 'h'),
    ('Ι', 'i'),
    ('Κ', 'k'),
    ('Μ', 'm'),
    ('Ν', 'n'),
    ('Ο', 'o'),
    ('Ρ', 'p'),
    ('Τ', 't'),
    ('Χ', 'x'),
];

/// Small-caps Unicode block letters used in stylized usernames and evasion.
pub const SMALL_CAPS: &[(char, char)] = &[
    ('ᴀ', 'a'),
    ('ʙ', 'b'),
    ('ᴄ', 'c'),
    ('ᴅ', 'd'),
    ('ᴇ', 'e'),
    ('ꜰ', 'f'),
    ('ɢ', 'g'),
    ('ʜ', 'h'),
    ('ɪ', 'i'),
    ('ᴊ', 'j'),
    ('ᴋ', 'k'),
    ('ʟ', 'l'),
    ('ᴍ', 'm'),
    ('ɴ', 'n'),
    ('ᴏ', 'o'),
    ('ᴘ', 'p'),
    ('ʀ', 'r'),
    ('ꜱ', 's'),
    ('ᴛ', 't'),
    ('ᴜ', 'u'),
    ('ᴠ', 'v'),
    ('ᴡ', 'w'),
    ('ʏ', 'y'),
    ('ᴢ', 'z'),
];

/// Leetspeak digit/symbol substitutions. Applied only inside words — a digit
/// standing alone ("4 u" as in "for you") is left untouched.
pub const LEET: &[(char, char)] = &[
    ('0', 'o'),
    ('1', 'i'),
    ('3', 'e'),
    ('4', 'a'),
    ('5', 's'),
    ('7', 't'),
    ('8', 'b'),
    ('9', 'g'),
    ('@', 'a'),
    ('$', 's'),
    ('!', 'i'),
    ('+', 't'),
    ('€', 'e'),
];

/// Zero-width and invisible codepoints stripped before any matching.
pub const INVISIBLE: &[char] = &[
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{200E}', // left-to-right mark
    '\u{200F}', // right-to-left mark
    '\u{202A}',
    '\u{202B}',
    '\u{202C}',
    '\u{202D}',
    '\u{202E}',
    '\u{2060}', // word joiner
    '\u{2061}',
    '\u{2062}',
    '\u{2063}',
    '\u{2064}',
    '\u{FEFF}', // BOM
    '\u{00AD}', // soft hyphen
    '\u{034F}', // combining grapheme joiner
    '\u{115F}', // hangul choseong filler
    '\u{1160}', // hangul jungseong filler
    '\u{3164}', // hangul filler
    '\u{FFA0}', // halfwidth hangul filler
];

/// Map a character from one of the contiguous stylized blocks (fullwidth,
/// circled, mathematical alphanumerics) to its ASCII letter. Returns None for
/// characters outside those blocks.
pub fn block_homoglyph(c: char) -> Option<char> {
    let cp = c as u32;
    let mapped = match cp {
        // Fullwidth A-Z / a-z
        0xFF21..=0xFF3A => cp - 0xFF21 + 'a' as u32,
        0xFF41..=0xFF5A => cp - 0xFF41 + 'a' as u32,
        // Circled A-Z / a-z
        0x24B6..=0x24CF => cp - 0x24B6 + 'a' as u32,
        0x24D0..=0x24E9 => cp - 0x24D0 + 'a' as u32,
        // Mathematical alphanumerics: 26-letter runs of upper then lower,
        // repeating across the styled alphabets (bold, italic, script, ...)
        0x1D400..=0x1D6A3 => {
            let offset = (cp - 0x1D400) % 52;
            let letter = if offset < 26 { offset } else { offset - 26 };
            letter + 'a' as u32
        }
        _ => return None,
    };
    char::from_u32(mapped)
}
