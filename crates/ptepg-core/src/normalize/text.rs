//! Text field cleanup.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::raw::TitleStyle;

/// Separator used by providers that fold the subtitle into the title.
const TITLE_SEPARATOR: &str = " - ";

/// Regex for extracting a four-digit year.
#[allow(clippy::expect_used)]
static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(1[89]\d{2}|2\d{3})\b").expect("failed to compile year regex"));

/// Whether `c` matches the XML 1.0 `Char` production.
#[must_use]
pub const fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Drops characters XML 1.0 cannot carry, trims and NFC-normalizes a text
/// field. Blank text becomes `None`.
#[must_use]
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let allowed: String = raw?.chars().filter(|&c| is_xml_char(c)).collect();
    let trimmed = allowed.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.nfc().collect())
}

/// Splits a raw title into `(title, subtitle)` according to the provider's style.
///
/// An explicit subtitle always wins. Returns `None` when the title is blank.
#[must_use]
pub fn split_title(
    raw_title: Option<&str>,
    raw_subtitle: Option<&str>,
    style: TitleStyle,
) -> Option<(String, Option<String>)> {
    let title = clean_text(raw_title)?;
    let subtitle = clean_text(raw_subtitle);
    if subtitle.is_some() || style == TitleStyle::Separate {
        return Some((title, subtitle));
    }

    match title.split_once(TITLE_SEPARATOR) {
        Some((head, tail)) => match (clean_text(Some(head)), clean_text(Some(tail))) {
            (Some(head), Some(tail)) => Some((head, Some(tail))),
            _ => Some((title, None)),
        },
        None => Some((title, None)),
    }
}

/// Extracts a release year from free text such as `"2019"` or `"Ano: 2019"`.
#[must_use]
pub fn release_year(raw: Option<&str>) -> Option<String> {
    let caps = YEAR_RE.captures(raw?)?;
    Some(caps.get(1)?.as_str().to_owned())
}
