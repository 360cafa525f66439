//! RTL script classification.

/// Code-point ranges whose presence flips a region to RTL layout:
/// Hebrew, Arabic, Arabic Supplement, Arabic Extended-A, and the Arabic
/// Presentation Forms blocks.
const RTL_RANGES: &[(char, char)] = &[
    ('\u{0590}', '\u{05FF}'),
    ('\u{0600}', '\u{06FF}'),
    ('\u{0750}', '\u{077F}'),
    ('\u{08A0}', '\u{08FF}'),
    ('\u{FB50}', '\u{FDFF}'),
    ('\u{FE70}', '\u{FEFF}'),
];

/// Whether `text` contains at least one RTL-range code point.
///
/// Pure and total: no normalization, no locale logic, classification on
/// raw code points only. Empty and whitespace-only input is LTR.
pub fn contains_rtl(text: &str) -> bool {
    text.chars()
        .any(|c| RTL_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&c)))
}
