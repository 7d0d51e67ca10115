use lazy_static::lazy_static;
use regex::Regex;

use crate::models::FieldMap;

lazy_static! {
    // "label separator value" on one line: label is 2+ letters/digits/spaces,
    // separator is ':' or '-', value is the remainder
    static ref LABELED_LINE: Regex =
        Regex::new(r"^([A-Za-z0-9][A-Za-z0-9 ]{0,40}?)\s*[:\-]\s*(\S.*)$").unwrap();
    // A bare label ending in a separator, value expected on the next line
    static ref PENDING_LABEL: Regex =
        Regex::new(r"^([A-Za-z0-9][A-Za-z0-9 ]{0,40}?)\s*[:\-]\s*$").unwrap();
}

// Word-level fixes for recognizer misreadings of the labels that matter to
// the extractors downstream
const LABEL_WORD_FIXES: &[(&str, &str)] = &[
    ("tlcket", "ticket"),
    ("t1cket", "ticket"),
    ("tickel", "ticket"),
    ("tieket", "ticket"),
    ("blll", "bill"),
    ("b1ll", "bill"),
    ("bi11", "bill"),
    ("involce", "invoice"),
    ("inv0ice", "invoice"),
    ("recelpt", "receipt"),
    ("rece1pt", "receipt"),
    ("farc", "fare"),
    ("fane", "fare"),
    ("am0unt", "amount"),
    ("amounl", "amount"),
    ("t0tal", "total"),
    ("dale", "date"),
    ("da1e", "date"),
    ("frorn", "from"),
    ("fr0m", "from"),
    ("s0urce", "source"),
    ("destinatlon", "destination"),
    ("destinati0n", "destination"),
];

/// FieldMapBuilder scans normalized text for labeled lines and produces the
/// FieldMap consumed by every field extractor. Lines matching neither rule
/// are left for the orphan-value heuristics.
pub struct FieldMapBuilder;

impl FieldMapBuilder {
    pub fn build(normalized: &str) -> FieldMap {
        let mut map = FieldMap::new();
        let mut pending: Option<String> = None;

        for line in normalized.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(captures) = LABELED_LINE.captures(line) {
                pending = None;
                let label = Self::canonical_label(&captures[1]);
                if label.len() >= 2 {
                    map.insert(label, captures[2].trim().to_string());
                }
                continue;
            }

            if let Some(captures) = PENDING_LABEL.captures(line) {
                pending = Some(Self::canonical_label(&captures[1]));
                continue;
            }

            // A line with no label of its own completes a pending label
            if let Some(label) = pending.take() {
                if label.len() >= 2 {
                    map.insert(label, line.to_string());
                }
            }
        }

        map
    }

    /// Lowercase, strip anything outside letters/digits/spaces, collapse
    /// whitespace, then repair known misread label words.
    pub fn canonical_label(raw: &str) -> String {
        let lowered = raw.to_lowercase();
        let cleaned: String = lowered
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
            .collect();

        cleaned
            .split_whitespace()
            .map(Self::fix_label_word)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn fix_label_word(word: &str) -> &str {
        for (misread, fixed) in LABEL_WORD_FIXES {
            if word == *misread {
                return fixed;
            }
        }
        word
    }
}
