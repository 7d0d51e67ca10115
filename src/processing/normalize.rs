use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Runs of 2+ spaces/tabs collapse to a single space
    static ref HORIZONTAL_WHITESPACE: Regex = Regex::new(r"[ \t]{2,}").unwrap();
    // Leading whitespace on continuation lines
    static ref LINE_INDENT: Regex = Regex::new(r"(?m)^[ \t]+").unwrap();
}

/// TextNormalizer canonicalizes whitespace, punctuation and line breaks in
/// raw recognized text before any field extraction runs. The rules never
/// alter the logical order of lines, and normalizing already-normalized text
/// returns it unchanged.
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn normalize(text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        // Platform line-break variants first, so later per-line rules see '\n'
        let mut normalized = text.replace("\r\n", "\n").replace('\r', "\n");

        // Vertical bars are column artifacts from table-style ticket layouts
        normalized = normalized.replace('|', " ");

        // Recognizers frequently misread ':' as ';'
        normalized = normalized.replace(';', ":");

        // En/em dashes down to a plain hyphen
        normalized = normalized.replace('\u{2013}', "-").replace('\u{2014}', "-");

        normalized = HORIZONTAL_WHITESPACE.replace_all(&normalized, " ").into_owned();
        normalized = LINE_INDENT.replace_all(&normalized, "").into_owned();

        normalized.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_breaks_are_unified() {
        let normalized = TextNormalizer::normalize("a\r\nb\rc\nd");
        assert_eq!(normalized, "a\nb\nc\nd");
    }

    #[test]
    fn test_column_bars_become_spaces() {
        let normalized = TextNormalizer::normalize("Fare | 45.50");
        assert_eq!(normalized, "Fare 45.50");
    }

    #[test]
    fn test_semicolons_become_colons() {
        assert_eq!(TextNormalizer::normalize("Fare; 45.50"), "Fare: 45.50");
    }

    #[test]
    fn test_dashes_become_hyphens() {
        assert_eq!(
            TextNormalizer::normalize("Ticket \u{2013} A123 \u{2014} B"),
            "Ticket - A123 - B"
        );
    }

    #[test]
    fn test_continuation_indent_is_stripped() {
        let normalized = TextNormalizer::normalize("From:\n    NEWTOWN");
        assert_eq!(normalized, "From:\nNEWTOWN");
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert_eq!(TextNormalizer::normalize(""), "");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let samples = [
            "Ticket No; A12 | 345\r\n   Fare \u{2013} 45.50\n\nFROM:  CENTRAL",
            "plain single line",
            "a\tb\t\tc",
        ];
        for sample in samples {
            let once = TextNormalizer::normalize(sample);
            let twice = TextNormalizer::normalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_line_order_is_preserved() {
        let normalized = TextNormalizer::normalize("first\nsecond\nthird");
        let lines: Vec<&str> = normalized.lines().collect();
        assert_eq!(lines, vec!["first", "second", "third"]);
    }
}
