use std::collections::HashMap;

use chrono::{NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_json::Value;

use crate::models::{BillRecord, StationDirectory};
use crate::processing::numeric::NumericNormalizer;
use crate::processing::segmented::SegmentedDecoder;

// Key synonyms shared by the JSON and key-value strategies, canonical form
const TICKET_KEYS: &[&str] = &["billnumber", "billno", "id"];
const AMOUNT_KEYS: &[&str] = &["amount", "fare", "total"];
const DATE_KEYS: &[&str] = &["date"];

lazy_static! {
    static ref KEY_VALUE_PAIR: Regex =
        Regex::new(r"^\s*([A-Za-z][A-Za-z0-9 _]*?)\s*[:=]\s*(.+?)\s*$").unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})").unwrap();
    static ref DMY_DATE: Regex = Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").unwrap();
    static ref EPOCH_DIGITS: Regex = Regex::new(r"^\d{10,}$").unwrap();
    // Last-resort keyword-adjacent patterns over the raw payload
    static ref FREE_FARE: Regex =
        Regex::new(r"(?i)(?:fare|amount|total)\s*[:=\-]?\s*(\d+(?:\.\d{1,2})?)").unwrap();
    static ref FREE_TICKET: Regex = Regex::new(
        r"(?i)(?:ticket|bill|invoice)\s*(?:no|number|num)?\.?\s*[:#=\-]?\s*([A-Za-z0-9]{6,})"
    )
    .unwrap();
    static ref FREE_FROM: Regex =
        Regex::new(r"\b(?i:from)\b\s*[:=\-]?\s*([A-Z][A-Za-z.]*(?: [A-Z][A-Za-z.]*)*)").unwrap();
    static ref FREE_TO: Regex =
        Regex::new(r"\b(?i:to)\b\s*[:=\-]?\s*([A-Z][A-Za-z.]*(?: [A-Z][A-Za-z.]*)*)").unwrap();
}

/// QrPayloadDecoder classifies a raw scanned payload and extracts a
/// candidate record through format-specific logic. Strategies run in order
/// and the first one producing any recognizable value wins; a strategy that
/// fails to parse falls through silently.
pub struct QrPayloadDecoder;

impl QrPayloadDecoder {
    pub fn decode(payload: &str, stations: &StationDirectory) -> BillRecord {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return BillRecord::default();
        }

        if let Some(record) = Self::decode_json(trimmed) {
            debug!("payload decoded as JSON");
            return record;
        }
        if let Some(record) = Self::decode_key_value(trimmed) {
            debug!("payload decoded as key-value text");
            return record;
        }
        if let Some(record) = SegmentedDecoder::decode(trimmed, stations) {
            debug!("payload decoded as segmented format");
            return record;
        }

        debug!("payload fell through to free-text matching");
        Self::decode_free_text(trimmed)
    }

    fn decode_json(payload: &str) -> Option<BillRecord> {
        let value: Value = serde_json::from_str(payload).ok()?;
        let object = value.as_object()?;

        let mut pairs = HashMap::new();
        for (key, val) in object {
            let text = match val {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            pairs.insert(Self::canonical_key(key), text);
        }

        let record = Self::record_from_pairs(&pairs);
        record.has_any_value().then_some(record)
    }

    fn decode_key_value(payload: &str) -> Option<BillRecord> {
        let mut pairs = HashMap::new();
        for piece in payload.split(|c| c == ';' || c == '\n') {
            if let Some(captures) = KEY_VALUE_PAIR.captures(piece) {
                pairs.insert(Self::canonical_key(&captures[1]), captures[2].to_string());
            }
        }
        if pairs.is_empty() {
            return None;
        }

        let record = Self::record_from_pairs(&pairs);
        record.has_any_value().then_some(record)
    }

    fn decode_free_text(payload: &str) -> BillRecord {
        let mut record = BillRecord::default();

        if let Some(captures) = FREE_TICKET.captures(payload) {
            record.ticket_number = Some(captures[1].to_uppercase());
        }
        if let Some(captures) = FREE_FARE.captures(payload) {
            record.amount = captures[1]
                .parse()
                .ok()
                .map(NumericNormalizer::round2);
        }
        record.date = Self::parse_flexible_date(payload);
        record.origin = FREE_FROM
            .captures(payload)
            .map(|captures| captures[1].trim().to_string());
        record.destination = FREE_TO
            .captures(payload)
            .map(|captures| captures[1].trim().to_string());

        record
    }

    /// Both mapping strategies funnel through the same synonym lookup.
    fn record_from_pairs(pairs: &HashMap<String, String>) -> BillRecord {
        let mut record = BillRecord::default();

        for key in TICKET_KEYS {
            if let Some(value) = pairs.get(*key) {
                let cleaned: String = value
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                if cleaned.len() >= 6 {
                    record.ticket_number = Some(cleaned.to_uppercase());
                    break;
                }
            }
        }

        for key in AMOUNT_KEYS {
            if let Some(value) = pairs.get(*key) {
                if let Some(parsed) = NumericNormalizer::parse_confusable_number(value) {
                    record.amount = Some(NumericNormalizer::round2(parsed));
                    break;
                }
            }
        }

        for key in DATE_KEYS {
            if let Some(value) = pairs.get(*key) {
                if let Some(date) = Self::parse_flexible_date(value) {
                    record.date = Some(date);
                    break;
                }
            }
        }

        record
    }

    /// Dates in payloads arrive as epoch seconds, ISO strings or D/M/Y
    /// tokens (day first).
    fn parse_flexible_date(value: &str) -> Option<NaiveDateTime> {
        let trimmed = value.trim();

        if EPOCH_DIGITS.is_match(trimmed) {
            if let Ok(secs) = trimmed.parse::<i64>() {
                if let Some(date) = NumericNormalizer::date_from_epoch(secs) {
                    return Some(date);
                }
            }
        }

        if let Some(captures) = ISO_DATE.captures(trimmed) {
            let year = captures[1].parse().ok()?;
            let month = captures[2].parse().ok()?;
            let day = captures[3].parse().ok()?;
            return chrono::NaiveDate::from_ymd_opt(year, month, day)
                .map(|d| d.and_time(NaiveTime::MIN));
        }

        let captures = DMY_DATE.captures(trimmed)?;
        let day = captures[1].parse().ok()?;
        let month = captures[2].parse().ok()?;
        let year = captures[3].parse().ok()?;
        NumericNormalizer::build_date(day, month, year).map(|d| d.and_time(NaiveTime::MIN))
    }

    fn canonical_key(key: &str) -> String {
        key.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase()
    }
}
