//! Unicode check: tag characters, zero-width characters, and
//! Cyrillic-Latin homoglyphs.
//!
//! Tag characters (U+E0001..U+E007F) can smuggle invisible instructions
//! and are always an error. Zero-width characters and homoglyphs are
//! warnings; homoglyphs are only reported on lines without CJK content
//! so legitimate non-ASCII prose is not flagged.

use super::{Finding, Severity};

/// Zero-width characters worth flagging.
const ZERO_WIDTH: &[char] = &[
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // zero width no-break space
];

/// Cyrillic characters visually identical to Latin letters.
const HOMOGLYPHS: &[(char, char)] = &[
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
    ('А', 'A'),
    ('В', 'B'),
    ('Е', 'E'),
    ('К', 'K'),
    ('М', 'M'),
    ('Н', 'H'),
    ('О', 'O'),
    ('Р', 'P'),
    ('С', 'C'),
    ('Т', 'T'),
    ('Х', 'X'),
    ('У', 'Y'),
];

pub fn check_unicode(file: &str, content: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;

        if line
            .chars()
            .any(|c| (0xE0001..=0xE007F).contains(&(c as u32)))
        {
            findings.push(unicode_finding(
                Severity::Error,
                "line contains Unicode tag characters (invisible instruction channel)".to_string(),
                file,
                line_no,
                "unicode/tag-characters",
            ));
        }

        let zero_width: Vec<String> = line
            .chars()
            .filter(|c| ZERO_WIDTH.contains(c))
            .map(|c| format!("U+{:04X}", c as u32))
            .collect();
        if !zero_width.is_empty() {
            findings.push(unicode_finding(
                Severity::Warning,
                format!("line contains zero-width characters: {}", zero_width.join(", ")),
                file,
                line_no,
                "unicode/zero-width",
            ));
        }

        if !has_cjk(line) {
            let confusable: Vec<String> = line
                .chars()
                .filter_map(|c| {
                    HOMOGLYPHS
                        .iter()
                        .find(|(cyrillic, _)| *cyrillic == c)
                        .map(|(cyrillic, latin)| {
                            format!("U+{:04X} (looks like '{latin}')", *cyrillic as u32)
                        })
                })
                .collect();
            if !confusable.is_empty() {
                findings.push(unicode_finding(
                    Severity::Warning,
                    format!("line contains Cyrillic homoglyphs: {}", confusable.join(", ")),
                    file,
                    line_no,
                    "unicode/homoglyph",
                ));
            }
        }
    }

    findings
}

fn has_cjk(line: &str) -> bool {
    line.chars().any(|c| {
        let cp = c as u32;
        (0x3000..=0x9FFF).contains(&cp)        // CJK blocks incl. Kana
            || (0xF900..=0xFAFF).contains(&cp) // compatibility ideographs
            || (0xFF65..=0xFF9F).contains(&cp) // halfwidth Kana
            || (0x20000..=0x2FFFF).contains(&cp) // CJK extensions
    })
}

fn unicode_finding(
    severity: Severity,
    message: String,
    file: &str,
    line: usize,
    pattern: &str,
) -> Finding {
    Finding {
        severity,
        check: "unicode".to_string(),
        message,
        file: Some(file.to_string()),
        line: Some(line),
        pattern: Some(pattern.to_string()),
    }
}
