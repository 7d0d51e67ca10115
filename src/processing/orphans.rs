use lazy_static::lazy_static;
use regex::Regex;

use crate::models::FieldMap;

lazy_static! {
    static ref DATE_CANDIDATE: Regex =
        Regex::new(r"\b(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\b").unwrap();
    static ref CURRENCY_AMOUNT: Regex =
        Regex::new(r"(?i)(?:INR|Rs\.?|\u{20B9})\s*([0-9]+(?:\.[0-9]{1,2})?)").unwrap();
    static ref BARE_DECIMAL: Regex = Regex::new(r"\b([0-9]+\.[0-9]{1,2})\b").unwrap();
}

// Uppercase lines made of these words are ticket headings, not places
const LABEL_KEYWORDS: &[&str] = &[
    "from", "to", "source", "destination", "fare", "amount", "total", "date",
    "ticket", "bill", "invoice", "receipt", "no", "number", "metro", "rail",
];

/// Values recognized by shape and position in lines that carry no label of
/// their own. They are attributed to fields by synthesizing label entries in
/// the FieldMap, and double as direct fallbacks for the extractors.
#[derive(Debug, Default)]
pub struct OrphanCandidates {
    /// Bare all-caps lines, in line order; the first two are taken as
    /// origin and destination.
    pub locations: Vec<String>,
    /// First bare D/M/Y token found anywhere in the text.
    pub date: Option<String>,
    /// First currency-marked or bare decimal amount.
    pub amount: Option<String>,
}

impl OrphanCandidates {
    /// Attribute located values to fields the FieldMap has no entry for, by
    /// inserting them under a synthesized label.
    pub fn fill_missing(&self, map: &mut FieldMap) {
        let mut idx = 0;
        let mut next_location = |map: &FieldMap| -> Option<String> {
            while let Some(candidate) = self.locations.get(idx) {
                idx += 1;
                if !Self::already_mapped(map, candidate) {
                    return Some(candidate.clone());
                }
            }
            None
        };

        if !map.contains_key("from") && !map.contains_key("source") {
            if let Some(location) = next_location(map) {
                map.insert("from".to_string(), location);
            }
        }
        if !map.contains_key("to") && !map.contains_key("destination") {
            if let Some(location) = next_location(map) {
                map.insert("to".to_string(), location);
            }
        }

        if !map.contains_key("date") && !map.contains_key("dated") {
            if let Some(date) = &self.date {
                map.insert("date".to_string(), date.clone());
            }
        }

        if !map.contains_key("fare") && !map.contains_key("amount") && !map.contains_key("total") {
            if let Some(amount) = &self.amount {
                map.insert("fare".to_string(), amount.clone());
            }
        }
    }

    fn already_mapped(map: &FieldMap, candidate: &str) -> bool {
        ["from", "source", "to", "destination"]
            .iter()
            .filter_map(|label| map.get(*label))
            .any(|value| value.eq_ignore_ascii_case(candidate))
    }
}

/// OrphanValueLocator scans the normalized text for recognizable values that
/// appear without an adjacent label: bare all-caps location lines, bare
/// dates, and bare amounts.
pub struct OrphanValueLocator;

impl OrphanValueLocator {
    pub fn locate(normalized: &str) -> OrphanCandidates {
        let mut candidates = OrphanCandidates::default();

        for line in normalized.lines().map(str::trim) {
            if Self::is_location_candidate(line) {
                candidates.locations.push(line.to_string());
            }
        }

        candidates.date = DATE_CANDIDATE
            .captures(normalized)
            .map(|captures| captures[1].to_string());

        candidates.amount = CURRENCY_AMOUNT
            .captures(normalized)
            .or_else(|| BARE_DECIMAL.captures(normalized))
            .map(|captures| captures[1].to_string());

        candidates
    }

    /// An all-uppercase line of 3+ characters with no digits and no label
    /// keyword reads as a location name.
    fn is_location_candidate(line: &str) -> bool {
        if line.len() < 3 || line.contains(':') {
            return false;
        }
        if !line.chars().any(|c| c.is_ascii_uppercase()) {
            return false;
        }
        if line.chars().any(|c| c.is_lowercase() || c.is_ascii_digit()) {
            return false;
        }
        !line
            .split_whitespace()
            .all(|word| LABEL_KEYWORDS.contains(&word.to_lowercase().as_str()))
    }
}
