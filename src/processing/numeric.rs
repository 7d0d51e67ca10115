use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

lazy_static! {
    static ref CURRENCY_MARKER: Regex = Regex::new(r"(?i)INR|Rs\.?|\u{20B9}").unwrap();
}

/// A single magnitude-correction rule for parsed amounts. The default rules
/// are tuned to the fare range of regional metro tickets; swap the list to
/// retune for another document family.
pub struct AmountRule {
    pub name: &'static str,
    pub applies: fn(f64) -> bool,
    pub apply: fn(f64) -> f64,
}

fn in_band_above_two_hundred(value: f64) -> bool {
    value > 200.0 && value < 300.0
}

fn subtract_two_hundred(value: f64) -> f64 {
    value - 200.0
}

fn at_least_one_hundred(value: f64) -> bool {
    value >= 100.0
}

fn divide_by_ten(value: f64) -> f64 {
    value / 10.0
}

/// A misread currency glyph merged into the leading digits shows up as a
/// spurious "2" prefix, landing the value just above 200.
pub const CURRENCY_GLYPH_MERGE: AmountRule = AmountRule {
    name: "currency-glyph-merge",
    applies: in_band_above_two_hundred,
    apply: subtract_two_hundred,
};

/// A dropped decimal point inflates the value tenfold.
pub const MISSING_DECIMAL_POINT: AmountRule = AmountRule {
    name: "missing-decimal-point",
    applies: at_least_one_hundred,
    apply: divide_by_ten,
};

pub fn default_amount_rules() -> &'static [AmountRule] {
    &[CURRENCY_GLYPH_MERGE, MISSING_DECIMAL_POINT]
}

/// NumericNormalizer converts OCR-damaged numeric and date tokens into
/// usable values.
pub struct NumericNormalizer;

impl NumericNormalizer {
    /// Apply the default magnitude corrections in order, then round to the
    /// 2-decimal precision every amount carries.
    pub fn correct_amount(raw: f64) -> f64 {
        Self::correct_amount_with(raw, default_amount_rules())
    }

    pub fn correct_amount_with(raw: f64, rules: &[AmountRule]) -> f64 {
        let mut value = raw;
        for rule in rules {
            if (rule.applies)(value) {
                let adjusted = (rule.apply)(value);
                debug!("amount rule {} adjusted {} -> {}", rule.name, value, adjusted);
                value = adjusted;
            }
        }
        Self::round2(value)
    }

    pub fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }

    /// Map the letter shapes recognizers substitute for digits back to the
    /// digits, leaving everything else untouched.
    pub fn digits_from_confusables(token: &str) -> String {
        token
            .chars()
            .map(|c| match c {
                'O' | 'o' => '0',
                'S' | 's' => '5',
                'B' => '8',
                'I' | 'l' => '1',
                other => other,
            })
            .collect()
    }

    /// Parse a numeric token that may carry confusable letters and currency
    /// punctuation. Currency markers are removed before substitution so
    /// their letters are not mistaken for digits. Returns None when nothing
    /// digit-like remains.
    pub fn parse_confusable_number(token: &str) -> Option<f64> {
        // A token with no real digit at all is not a number, however many
        // confusable letters it holds
        if !token.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        let stripped = CURRENCY_MARKER.replace_all(token, "");
        let substituted = Self::digits_from_confusables(&stripped);
        let cleaned: String = substituted
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        cleaned.parse::<f64>().ok()
    }

    /// Build a calendar date from day/month/year parts, expanding 2-digit
    /// years into the 2000s. Invalid combinations return None so the caller
    /// can substitute its own fallback.
    pub fn build_date(day: u32, month: u32, year: i32) -> Option<NaiveDate> {
        let full_year = if year < 100 { 2000 + year } else { year };
        NaiveDate::from_ymd_opt(full_year, month, day)
    }

    /// Route-block date triples use a different pivot: 2-digit years of 70
    /// and above read as 1900s, below as 2000s.
    pub fn build_route_date(day: u32, month: u32, year: i32) -> Option<NaiveDate> {
        let full_year = if year < 100 {
            if year >= 70 {
                1900 + year
            } else {
                2000 + year
            }
        } else {
            year
        };
        NaiveDate::from_ymd_opt(full_year, month, day)
    }

    /// Interpret a digit run as a Unix epoch timestamp, accepting it only
    /// when it lands in the 2000-2100 year range.
    pub fn date_from_epoch(secs: i64) -> Option<NaiveDateTime> {
        let parsed = chrono::DateTime::from_timestamp(secs, 0)?.naive_utc();
        if (2000..=2100).contains(&parsed.date().year()) {
            Some(parsed)
        } else {
            None
        }
    }

    /// The "now" fallback used when a date was expected but unrecoverable.
    pub fn now_fallback() -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_glyph_merge_band() {
        assert_eq!(NumericNormalizer::correct_amount(214.0), 14.0);
    }

    #[test]
    fn test_missing_decimal_point_division() {
        assert_eq!(NumericNormalizer::correct_amount(150.0), 15.0);
    }

    #[test]
    fn test_plausible_amount_is_unchanged() {
        assert_eq!(NumericNormalizer::correct_amount(45.0), 45.0);
    }

    #[test]
    fn test_rules_apply_in_order() {
        // 299 falls in the glyph band, and the remainder stays below 100
        assert_eq!(NumericNormalizer::correct_amount(299.0), 99.0);
        // 350 skips the glyph band but is still tenfold inflated
        assert_eq!(NumericNormalizer::correct_amount(350.0), 35.0);
    }

    #[test]
    fn test_empty_rule_list_only_rounds() {
        assert_eq!(NumericNormalizer::correct_amount_with(214.567, &[]), 214.57);
    }

    #[test]
    fn test_confusable_digits_are_substituted() {
        assert_eq!(NumericNormalizer::digits_from_confusables("4S.5O"), "45.50");
        assert_eq!(NumericNormalizer::digits_from_confusables("B0"), "80");
    }

    #[test]
    fn test_parse_confusable_number() {
        assert_eq!(NumericNormalizer::parse_confusable_number("Rs 4S.50"), Some(45.5));
        assert_eq!(NumericNormalizer::parse_confusable_number("no digits"), None);
    }

    #[test]
    fn test_two_digit_years_assume_2000s() {
        let date = NumericNormalizer::build_date(5, 6, 23).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 6, 5).unwrap());
    }

    #[test]
    fn test_route_year_pivot() {
        let recent = NumericNormalizer::build_route_date(5, 6, 23).unwrap();
        assert_eq!(recent, NaiveDate::from_ymd_opt(2023, 6, 5).unwrap());
        let old = NumericNormalizer::build_route_date(5, 6, 75).unwrap();
        assert_eq!(old, NaiveDate::from_ymd_opt(1975, 6, 5).unwrap());
    }

    #[test]
    fn test_invalid_date_is_none() {
        assert_eq!(NumericNormalizer::build_date(32, 13, 2023), None);
    }

    #[test]
    fn test_epoch_outside_window_is_rejected() {
        // 1999-01-01 is before the accepted window
        assert_eq!(NumericNormalizer::date_from_epoch(915_148_800), None);
        let accepted = NumericNormalizer::date_from_epoch(1_705_312_200).unwrap();
        assert_eq!(accepted.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }
}
