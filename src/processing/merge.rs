use chrono::Local;
use log::warn;

use crate::models::BillRecord;

// Placeholder used when neither source recovered a route endpoint
const UNKNOWN_LOCATION: &str = "Unknown";
// Marker stored in raw_text when only QR data exists
const NO_TEXT_MARKER: &str = "[no text recognized]";

/// FieldMerger combines the OCR-derived and QR-derived candidate records
/// into the final record under a fixed precedence policy: QR wins for
/// ticket number, amount and date; OCR wins for the route endpoints, which
/// QR payloads rarely carry reliably.
pub struct FieldMerger;

impl FieldMerger {
    pub fn merge(ocr: BillRecord, qr: BillRecord) -> BillRecord {
        let ticket_number = qr
            .ticket_number
            .or(ocr.ticket_number)
            .or_else(Self::placeholder_ticket);

        BillRecord {
            ticket_number,
            amount: qr.amount.or(ocr.amount),
            date: qr.date.or(ocr.date),
            origin: ocr
                .origin
                .or(qr.origin)
                .or_else(|| Some(UNKNOWN_LOCATION.to_string())),
            destination: ocr
                .destination
                .or(qr.destination)
                .or_else(|| Some(UNKNOWN_LOCATION.to_string())),
            emissions_saved: ocr.emissions_saved.or(qr.emissions_saved),
            raw_text: ocr
                .raw_text
                .or_else(|| Some(NO_TEXT_MARKER.to_string())),
        }
    }

    /// Neither source produced an identifier: synthesize one from the
    /// current timestamp so downstream storage still has a key.
    fn placeholder_ticket() -> Option<String> {
        let synthesized = format!("TKT{}", Local::now().timestamp());
        warn!("no ticket number recovered, using placeholder {}", synthesized);
        Some(synthesized)
    }
}
