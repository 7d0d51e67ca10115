use chrono::{NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::FieldMap;
use crate::processing::numeric::NumericNormalizer;

// FieldMap labels tried per field, most specific first
const TICKET_LABELS: &[&str] = &[
    "ticket no",
    "ticket number",
    "bill no",
    "bill number",
    "invoice no",
    "receipt no",
];
const AMOUNT_LABELS: &[&str] = &["fare", "amount", "total"];
const DATE_LABELS: &[&str] = &["date", "dated"];
const ORIGIN_LABELS: &[&str] = &["from", "source"];
const DESTINATION_LABELS: &[&str] = &["to", "destination"];

lazy_static! {
    // Ticket keyword tolerant of i/1/l misreads, followed by the identifier
    static ref TICKET_DIRECT: Regex = Regex::new(
        r"(?i)(?:t[i1l]cket|b[i1l]ll|invo[i1l]ce|rece[i1l]pt)\s*(?:no|number|num)?\.?\s*[:#\-]?\s*([A-Za-z0-9]{6,})"
    )
    .unwrap();
    // Last-resort identifier: first long alphanumeric run anywhere
    static ref ALNUM_RUN: Regex = Regex::new(r"[A-Za-z0-9]{8,}").unwrap();
    // Currency marker followed by a possibly-confused number
    static ref CURRENCY_AMOUNT: Regex = Regex::new(
        r"(?i)(?:INR|Rs\.?|\u{20B9})\s*([0-9OoSsB]+(?:\.[0-9OoSsB]{1,2})?)"
    )
    .unwrap();
    // D/M/Y with 2- or 4-digit year
    static ref DATE_TOKEN: Regex = Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").unwrap();
    // Label-tolerant route searches: the label may be misread, the value is
    // a capitalized run of words
    static ref FROM_ANYWHERE: Regex = Regex::new(
        r"\b(?i:fr[o0]m)\b\s*[:\-]?\s*([A-Z][A-Za-z.]*(?: [A-Z][A-Za-z.]*)*)"
    )
    .unwrap();
    static ref TO_ANYWHERE: Regex = Regex::new(
        r"\b(?i:t[o0])\b\s*[:\-]?\s*([A-Z][A-Za-z.]*(?: [A-Z][A-Za-z.]*)*)"
    )
    .unwrap();
    // Number (with 0/5/8 confusables), optional mass unit, CO2 marker with
    // digit/letter confusion tolerated in every token
    static ref EMISSIONS: Regex = Regex::new(
        r"(?i)\b([0-9OoSsB]+(?:[ .][0-9OoSsB]+)?)\s*(?:g|gm|gms|gram|grams|q)?\s*C[O0o][2Zz]\b"
    )
    .unwrap();
}

// Emissions values above this are magnitude errors, not real savings
const EMISSIONS_CEILING: f64 = 2.0;

/// Per-field extraction over the FieldMap and the normalized text. Every
/// extractor runs the same ladder: labeled lookup, then a direct pattern
/// match, then None — extraction failure is an absent field, never an error.
pub struct FieldExtractor;

impl FieldExtractor {
    /// Ticket/bill identifier. FieldMap hits shorter than 6 characters after
    /// cleaning are rejected and fall through to the pattern stages.
    pub fn ticket_number(map: &FieldMap, text: &str) -> Option<String> {
        for label in TICKET_LABELS {
            if let Some(value) = map.get(*label) {
                let cleaned: String = value
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                if cleaned.len() >= 6 {
                    return Some(cleaned.to_uppercase());
                }
            }
        }

        if let Some(captures) = TICKET_DIRECT.captures(text) {
            return Some(captures[1].to_uppercase());
        }

        ALNUM_RUN.find(text).map(|m| m.as_str().to_uppercase())
    }

    /// Monetary amount with magnitude corrections applied. Returns None when
    /// no labeled or currency-marked number exists; the caller decides the
    /// zero default.
    pub fn amount(map: &FieldMap, text: &str) -> Option<f64> {
        for label in AMOUNT_LABELS {
            if let Some(value) = map.get(*label) {
                if let Some(parsed) = NumericNormalizer::parse_confusable_number(value) {
                    return Some(NumericNormalizer::correct_amount(parsed));
                }
            }
        }

        let captures = CURRENCY_AMOUNT.captures(text)?;
        let parsed = NumericNormalizer::parse_confusable_number(&captures[1])?;
        Some(NumericNormalizer::correct_amount(parsed))
    }

    /// Transaction date from a labeled value or any D/M/Y token in the text.
    /// Invalid constructed dates return None so the caller can fall back to
    /// the current date.
    pub fn date(map: &FieldMap, text: &str) -> Option<NaiveDateTime> {
        for label in DATE_LABELS {
            if let Some(value) = map.get(*label) {
                if let Some(date) = Self::parse_date_token(value) {
                    return Some(date);
                }
            }
        }
        Self::parse_date_token(text)
    }

    pub fn origin(map: &FieldMap, text: &str) -> Option<String> {
        Self::location(map, text, ORIGIN_LABELS, &FROM_ANYWHERE)
    }

    pub fn destination(map: &FieldMap, text: &str) -> Option<String> {
        Self::location(map, text, DESTINATION_LABELS, &TO_ANYWHERE)
    }

    /// Emissions-saved quantity, formatted "<value> g CO2". Confusable
    /// characters are mapped back to digits; a missing decimal point is
    /// inferred from the first internal whitespace run; implausibly large
    /// values are scaled down until they fit the ceiling.
    pub fn emissions_saved(text: &str) -> Option<String> {
        let captures = EMISSIONS.captures(text)?;
        let substituted = NumericNormalizer::digits_from_confusables(&captures[1]);

        let numeric = if substituted.contains('.') {
            substituted
        } else {
            substituted.replacen(' ', ".", 1)
        };

        let mut value: f64 = numeric.trim().parse().ok()?;
        while value > EMISSIONS_CEILING {
            value /= 10.0;
        }

        Some(format!("{:.2} g CO2", value))
    }

    fn location(
        map: &FieldMap,
        text: &str,
        labels: &[&str],
        fallback: &Regex,
    ) -> Option<String> {
        for label in labels {
            if let Some(value) = map.get(*label) {
                if let Some(cleaned) = Self::clean_location(value) {
                    return Some(cleaned);
                }
            }
        }
        fallback
            .captures(text)
            .and_then(|captures| Self::clean_location(&captures[1]))
    }

    /// Strip newlines, trailing commas and anything outside the location
    /// character allow-list.
    fn clean_location(raw: &str) -> Option<String> {
        let first_line = raw.lines().next().unwrap_or("");
        let filtered: String = first_line
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '(' | ')' | '.' | '-'))
            .collect();
        let cleaned = filtered.trim().trim_end_matches(',').trim().to_string();
        if cleaned.len() >= 2 {
            Some(cleaned)
        } else {
            None
        }
    }

    fn parse_date_token(text: &str) -> Option<NaiveDateTime> {
        let captures = DATE_TOKEN.captures(text)?;
        let day = captures[1].parse().ok()?;
        let month = captures[2].parse().ok()?;
        let year = captures[3].parse().ok()?;
        NumericNormalizer::build_date(day, month, year).map(|d| d.and_time(NaiveTime::MIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn map_of(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_ticket_from_field_map_is_cleaned() {
        let map = map_of(&[("ticket no", "ab-12/34x")]);
        assert_eq!(
            FieldExtractor::ticket_number(&map, ""),
            Some("AB1234X".to_string())
        );
    }

    #[test]
    fn test_short_map_ticket_falls_through_to_pattern() {
        let map = map_of(&[("ticket no", "A12")]);
        let text = "T1cket Number: QR998877";
        assert_eq!(
            FieldExtractor::ticket_number(&map, text),
            Some("QR998877".to_string())
        );
    }

    #[test]
    fn test_ticket_last_resort_takes_first_long_run() {
        let map = FieldMap::new();
        assert_eq!(
            FieldExtractor::ticket_number(&map, "xx 20231215889 yy"),
            Some("20231215889".to_string())
        );
    }

    #[test]
    fn test_no_ticket_anywhere_is_none() {
        let map = FieldMap::new();
        assert_eq!(FieldExtractor::ticket_number(&map, "short txt"), None);
    }

    #[test]
    fn test_amount_from_label_with_confusables() {
        let map = map_of(&[("fare", "4S.5O")]);
        assert_eq!(FieldExtractor::amount(&map, ""), Some(45.5));
    }

    #[test]
    fn test_amount_correction_applies_to_labeled_value() {
        let map = map_of(&[("fare", "214.0")]);
        assert_eq!(FieldExtractor::amount(&map, ""), Some(14.0));
    }

    #[test]
    fn test_amount_currency_marker_fallback() {
        let map = FieldMap::new();
        assert_eq!(FieldExtractor::amount(&map, "paid Rs 30.00 cash"), Some(30.0));
    }

    #[test]
    fn test_amount_absent_is_none() {
        assert_eq!(FieldExtractor::amount(&FieldMap::new(), "nothing here"), None);
    }

    #[test]
    fn test_date_label_with_two_digit_year() {
        let map = map_of(&[("date", "5/6/23")]);
        let date = FieldExtractor::date(&map, "").unwrap();
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2023, 6, 5).unwrap());
    }

    #[test]
    fn test_date_direct_token_in_text() {
        let date = FieldExtractor::date(&FieldMap::new(), "issued 12-05-2023 ok").unwrap();
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2023, 5, 12).unwrap());
    }

    #[test]
    fn test_invalid_date_is_none() {
        assert_eq!(FieldExtractor::date(&FieldMap::new(), "on 31/02/23"), None);
    }

    #[test]
    fn test_origin_from_label_is_cleaned() {
        let map = map_of(&[("from", "NEWTOWN,,")]);
        assert_eq!(FieldExtractor::origin(&map, ""), Some("NEWTOWN".to_string()));
    }

    #[test]
    fn test_destination_label_tolerant_search() {
        let text = "travel t0 Central Park today";
        assert_eq!(
            FieldExtractor::destination(&FieldMap::new(), text),
            Some("Central Park".to_string())
        );
    }

    #[test]
    fn test_emissions_whitespace_decimal_inference() {
        let record = FieldExtractor::emissions_saved("saved 0 59 g C02 on this trip");
        assert_eq!(record.as_deref(), Some("0.59 g CO2"));
    }

    #[test]
    fn test_emissions_small_value_is_kept() {
        let record = FieldExtractor::emissions_saved("1.02g CO2");
        assert_eq!(record.as_deref(), Some("1.02 g CO2"));
    }

    #[test]
    fn test_emissions_magnitude_correction() {
        let record = FieldExtractor::emissions_saved("59 g CO2");
        assert_eq!(record.as_deref(), Some("0.59 g CO2"));
    }

    #[test]
    fn test_emissions_absent_without_marker() {
        assert_eq!(FieldExtractor::emissions_saved("0.59 g"), None);
    }
}
