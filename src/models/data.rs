use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// BillRecord is the universal candidate/output type shared by both
/// extraction paths. Every field is optional: absence means the field was
/// not recovered from the input, not that it was empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillRecord {
    /// Alphanumeric ticket/bill identifier, at least 6 characters after cleaning.
    pub ticket_number: Option<String>,
    /// Non-negative monetary value, normalized to 2-decimal precision.
    pub amount: Option<f64>,
    /// Transaction date. Time-of-day is carried when the source provides it.
    pub date: Option<NaiveDateTime>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// Formatted "<value> g CO2" string; the value is a small magnitude (<= ~2).
    pub emissions_saved: Option<String>,
    /// Normalized source text retained for audit and debugging.
    pub raw_text: Option<String>,
}

impl BillRecord {
    /// True when at least one semantic field was recovered. A decoding
    /// strategy whose output fails this predicate is treated as a decode
    /// failure and the next strategy is tried.
    pub fn has_any_value(&self) -> bool {
        self.ticket_number.is_some()
            || self.amount.is_some()
            || self.date.is_some()
            || self.origin.is_some()
            || self.destination.is_some()
            || self.emissions_saved.is_some()
    }
}

/// FieldMap maps canonical lowercase labels (e.g. "ticket no", "fare") to
/// the raw value string found next to them. Built once per normalized text
/// and consumed read-only by the field extractors; duplicate labels resolve
/// last-write-wins.
pub type FieldMap = HashMap<String, String>;
