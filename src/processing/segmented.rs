use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::models::{BillRecord, StationDirectory};
use crate::processing::numeric::NumericNormalizer;

lazy_static! {
    static ref BRACE_BLOCK: Regex = Regex::new(r"\{([^{}]*)\}").unwrap();
    static ref ANGLE_TOKEN: Regex = Regex::new(r"<([^<>]*)>").unwrap();
    // YYYYMMDD + literal 'T' + HHMMSS
    static ref COMPACT_TIMESTAMP: Regex =
        Regex::new(r"^(\d{4})(\d{2})(\d{2})T(\d{2})(\d{2})(\d{2})$").unwrap();
    static ref HEX_FLOAT: Regex =
        Regex::new(r"^0[xX]([0-9a-fA-F]+)(?:\.([0-9a-fA-F]+))?[pP]([+-]?\d+)$").unwrap();
    static ref TICKET_SEGMENT: Regex = Regex::new(r"^[A-Za-z0-9]{10,}$").unwrap();
    static ref DECIMAL_SEGMENT: Regex = Regex::new(r"^\d+\.\d{1,2}$").unwrap();
    static ref EPOCH_SEGMENT: Regex = Regex::new(r"^\d{10,}$").unwrap();
    static ref DIGIT_RUN_SEGMENT: Regex = Regex::new(r"^\d{6,}$").unwrap();
}

/// Positional layout of the pipe-delimited data block. The format is not
/// self-describing; this struct pins the segment positions observed on metro
/// tickets so far.
#[derive(Debug)]
pub struct DataBlock {
    segments: Vec<String>,
}

impl DataBlock {
    const MIN_SEGMENTS: usize = 4;
    const SEQUENCE_INDEX: usize = 4;
    const ORIGIN_CODE_INDEX: usize = 7;
    const DESTINATION_CODE_INDEX: usize = 8;

    /// Accepts the inner text of a brace block when it splits into enough
    /// pipe-delimited segments to carry the schema.
    pub fn parse(inner: &str) -> Option<DataBlock> {
        if !inner.contains('|') {
            return None;
        }
        let segments: Vec<String> = inner.split('|').map(|s| s.trim().to_string()).collect();
        if segments.len() < Self::MIN_SEGMENTS {
            return None;
        }
        Some(DataBlock { segments })
    }

    /// Segment 4: either a compact timestamp or the ticket number.
    pub fn sequence_token(&self) -> Option<&str> {
        self.segments.get(Self::SEQUENCE_INDEX).map(String::as_str)
    }

    pub fn origin_code(&self) -> Option<&str> {
        self.segments
            .get(Self::ORIGIN_CODE_INDEX)
            .map(String::as_str)
            .filter(|code| !code.is_empty())
    }

    pub fn destination_code(&self) -> Option<&str> {
        self.segments
            .get(Self::DESTINATION_CODE_INDEX)
            .map(String::as_str)
            .filter(|code| !code.is_empty())
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// The `<...>` route block: tokens are positional — origin, destination and
/// an optional day|month|2-digit-year triple.
#[derive(Debug, Default)]
pub struct RouteBlock {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
}

impl RouteBlock {
    pub fn parse(inner: &str) -> Option<RouteBlock> {
        let tokens: Vec<&str> = ANGLE_TOKEN
            .captures_iter(inner)
            .map(|captures| captures.get(1).map(|m| m.as_str().trim()).unwrap_or(""))
            .collect();
        if tokens.is_empty() {
            return None;
        }

        let mut block = RouteBlock::default();
        block.origin = tokens.first().filter(|t| !t.is_empty()).map(|t| t.to_string());
        block.destination = tokens.get(1).filter(|t| !t.is_empty()).map(|t| t.to_string());
        block.date = tokens.get(2).and_then(|t| Self::parse_date_triple(t));
        Some(block)
    }

    fn parse_date_triple(token: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = token.split('|').collect();
        if parts.len() != 3 {
            return None;
        }
        let day = parts[0].trim().parse().ok()?;
        let month = parts[1].trim().parse().ok()?;
        let year = parts[2].trim().parse().ok()?;
        NumericNormalizer::build_route_date(day, month, year)
    }
}

/// Decoder for the custom segmented payload grammar: brace-delimited data
/// blocks with pipe-delimited positional segments, plus an optional
/// angle-bracket route block.
pub struct SegmentedDecoder;

impl SegmentedDecoder {
    /// Returns None when the payload does not match the grammar at all, so
    /// the caller can move on to the next decoding strategy.
    pub fn decode(payload: &str, stations: &StationDirectory) -> Option<BillRecord> {
        // No pipe delimiter means this is not a segmented payload
        if !payload.contains('|') {
            return None;
        }

        let mut data_block = None;
        let mut route_block = None;
        for captures in BRACE_BLOCK.captures_iter(payload) {
            let inner = captures.get(1).map(|m| m.as_str()).unwrap_or("");
            if data_block.is_none() {
                if let Some(block) = DataBlock::parse(inner) {
                    data_block = Some(block);
                    continue;
                }
            }
            if route_block.is_none() {
                if let Some(block) = RouteBlock::parse(inner) {
                    route_block = Some(block);
                }
            }
        }

        let mut record = BillRecord::default();
        if let Some(data) = &data_block {
            Self::apply_data_block(data, stations, &mut record);
        }
        if let Some(route) = &route_block {
            Self::apply_route_block(route, &data_block, stations, &mut record);
        }

        if record.has_any_value() {
            Some(record)
        } else {
            None
        }
    }

    fn apply_data_block(
        data: &DataBlock,
        stations: &StationDirectory,
        record: &mut BillRecord,
    ) {
        // Segment 4 is a compact timestamp when it parses as one, otherwise
        // it carries the ticket number
        if let Some(token) = data.sequence_token() {
            if let Some(timestamp) = Self::parse_compact_timestamp(token) {
                record.date = Some(timestamp);
            } else {
                let cleaned: String = token
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                if cleaned.len() >= 6 {
                    record.ticket_number = Some(cleaned.to_uppercase());
                }
            }
        }

        for segment in data.segments() {
            // The timestamp segment would otherwise satisfy the ticket shape
            if Self::parse_compact_timestamp(segment).is_some() {
                continue;
            }

            if record.ticket_number.is_none()
                && TICKET_SEGMENT.is_match(segment)
                && segment.chars().any(|c| c.is_ascii_alphabetic())
            {
                record.ticket_number = Some(segment.to_uppercase());
            }

            if record.amount.is_none() {
                if let Some(amount) = Self::parse_hex_float(segment) {
                    record.amount = Some(NumericNormalizer::round2(amount));
                } else if DECIMAL_SEGMENT.is_match(segment) {
                    record.amount = segment.parse().ok().map(NumericNormalizer::round2);
                }
            }

            if record.date.is_none() && EPOCH_SEGMENT.is_match(segment) {
                if let Ok(secs) = segment.parse::<i64>() {
                    record.date = NumericNormalizer::date_from_epoch(secs);
                }
            }
        }

        // Last resort: any long digit run can stand in for the ticket number
        if record.ticket_number.is_none() {
            for segment in data.segments() {
                if DIGIT_RUN_SEGMENT.is_match(segment) {
                    record.ticket_number = Some(segment.clone());
                    break;
                }
            }
        }

        record.origin = data
            .origin_code()
            .map(|code| Self::decode_station(code, stations));
        record.destination = data
            .destination_code()
            .map(|code| Self::decode_station(code, stations));
    }

    fn apply_route_block(
        route: &RouteBlock,
        data_block: &Option<DataBlock>,
        stations: &StationDirectory,
        record: &mut BillRecord,
    ) {
        // Route-block text wins over station codes; the decoded code is kept
        // as a parenthetical when it adds information
        if let Some(origin) = &route.origin {
            let code = data_block.as_ref().and_then(|d| d.origin_code());
            record.origin = Some(Self::combine_route_name(origin, code, stations));
        }
        if let Some(destination) = &route.destination {
            let code = data_block.as_ref().and_then(|d| d.destination_code());
            record.destination = Some(Self::combine_route_name(destination, code, stations));
        }
        if record.date.is_none() {
            record.date = route.date.map(|d| d.and_time(NaiveTime::MIN));
        }
    }

    fn combine_route_name(
        route_name: &str,
        code: Option<&str>,
        stations: &StationDirectory,
    ) -> String {
        match code.and_then(|c| stations.decode(c)) {
            Some(decoded) if !decoded.eq_ignore_ascii_case(route_name) => {
                format!("{} ({})", route_name, decoded)
            }
            _ => route_name.to_string(),
        }
    }

    fn decode_station(code: &str, stations: &StationDirectory) -> String {
        match stations.decode(code) {
            Some(name) => name.to_string(),
            None => {
                debug!("unknown station code {:?}, passing through", code);
                code.to_uppercase()
            }
        }
    }

    fn parse_compact_timestamp(token: &str) -> Option<NaiveDateTime> {
        let captures = COMPACT_TIMESTAMP.captures(token)?;
        let year = captures[1].parse().ok()?;
        let month = captures[2].parse().ok()?;
        let day = captures[3].parse().ok()?;
        let hour = captures[4].parse().ok()?;
        let minute = captures[5].parse().ok()?;
        let second = captures[6].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    }

    /// Explicit hexadecimal float reconstruction: integer and fractional
    /// hex digits build the mantissa, the p-exponent scales by powers of 2.
    fn parse_hex_float(token: &str) -> Option<f64> {
        let captures = HEX_FLOAT.captures(token)?;

        let mut value = i64::from_str_radix(&captures[1], 16).ok()? as f64;
        if let Some(fraction) = captures.get(2) {
            let mut scale = 1.0 / 16.0;
            for digit in fraction.as_str().chars() {
                value += digit.to_digit(16)? as f64 * scale;
                scale /= 16.0;
            }
        }

        let exponent: i32 = captures[3].parse().ok()?;
        Some(value * 2f64.powi(exponent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stations() -> StationDirectory {
        StationDirectory::with_entries([("STN1", "Newtown"), ("STN2", "Central")])
    }

    #[test]
    fn test_reference_payload_decodes() {
        let record =
            SegmentedDecoder::decode("{A|B|C|D|20240115T113000|F|G|STN1|STN2}", &stations())
                .unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(11, 30, 0)
            .unwrap();
        assert_eq!(record.date, Some(expected));
        assert_eq!(record.origin.as_deref(), Some("Newtown"));
        assert_eq!(record.destination.as_deref(), Some("Central"));
    }

    #[test]
    fn test_payload_without_pipe_is_rejected() {
        assert!(SegmentedDecoder::decode("{no pipes here}", &stations()).is_none());
    }

    #[test]
    fn test_sequence_token_falls_back_to_ticket_number() {
        let record =
            SegmentedDecoder::decode("{A|B|C|D|TKT900123|F|G|STN1|STN2}", &stations()).unwrap();
        assert_eq!(record.ticket_number.as_deref(), Some("TKT900123"));
    }

    #[test]
    fn test_hex_float_amount() {
        let record =
            SegmentedDecoder::decode("{A|B|0x1.8p+3|D|20240115T113000|F|G|STN1|STN2}", &stations())
                .unwrap();
        assert_eq!(record.amount, Some(12.0));
    }

    #[test]
    fn test_plain_decimal_amount() {
        let record =
            SegmentedDecoder::decode("{A|B|45.50|D|20240115T113000|F|G|STN1|STN2}", &stations())
                .unwrap();
        assert_eq!(record.amount, Some(45.5));
    }

    #[test]
    fn test_epoch_segment_supplies_date() {
        let record =
            SegmentedDecoder::decode("{A|B|C|D|TKT900123|1705312200|G|STN1|STN2}", &stations())
                .unwrap();
        let date = record.date.unwrap().date();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_unknown_station_codes_pass_through_uppercased() {
        let record =
            SegmentedDecoder::decode("{A|B|C|D|20240115T113000|F|G|xq1|xq2}", &stations())
                .unwrap();
        assert_eq!(record.origin.as_deref(), Some("XQ1"));
        assert_eq!(record.destination.as_deref(), Some("XQ2"));
    }

    #[test]
    fn test_route_block_wins_and_keeps_code_decoding() {
        let payload = "{A|B|C|D|20240115T113000|F|G|STN1|STN2}{<Harbour Front><Central><05|06|23>}";
        let record = SegmentedDecoder::decode(payload, &stations()).unwrap();
        // Decoded code differs from the route text, so it is appended
        assert_eq!(record.origin.as_deref(), Some("Harbour Front (Newtown)"));
        // Decoded code duplicates the route text, so nothing is appended
        assert_eq!(record.destination.as_deref(), Some("Central"));
    }

    #[test]
    fn test_route_date_triple_builds_date() {
        let payload = "{1|2|3|4}{<Harbour Front><Central><05|06|23>}";
        let record = SegmentedDecoder::decode(payload, &stations()).unwrap();
        assert_eq!(
            record.date.map(|d| d.date()),
            Some(NaiveDate::from_ymd_opt(2023, 6, 5).unwrap())
        );
    }

    #[test]
    fn test_route_year_pivot_1900s() {
        let payload = "{1|2|3|4}{<A B><C D><05|06|75>}";
        let record = SegmentedDecoder::decode(payload, &stations()).unwrap();
        assert_eq!(
            record.date.map(|d| d.date()),
            Some(NaiveDate::from_ymd_opt(1975, 6, 5).unwrap())
        );
    }

    #[test]
    fn test_long_alnum_segment_is_ticket_fallback() {
        let record =
            SegmentedDecoder::decode("{A|B|C|D|X|AB12CD34EF99|G|STN1|STN2}", &stations()).unwrap();
        assert_eq!(record.ticket_number.as_deref(), Some("AB12CD34EF99"));
    }

    #[test]
    fn test_digit_run_is_last_resort_ticket() {
        let record =
            SegmentedDecoder::decode("{A|B|C|D|X|654321|G|STN1|STN2}", &stations()).unwrap();
        assert_eq!(record.ticket_number.as_deref(), Some("654321"));
    }
}
