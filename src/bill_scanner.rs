use crate::models::{BillRecord, StationDirectory};
use crate::processing::{
    FieldExtractor, FieldMapBuilder, FieldMerger, NumericNormalizer, OrphanValueLocator,
    QrPayloadDecoder, TextNormalizer,
};

/// BillScanner is the single entry point of the extraction pipeline: one
/// method per input modality plus the deterministic merge. Each call is a
/// pure function of its string input and the injected station directory, so
/// a scanner can be shared freely between callers.
pub struct BillScanner {
    stations: StationDirectory,
}

impl BillScanner {
    pub fn new() -> Self {
        BillScanner {
            stations: StationDirectory::new(),
        }
    }

    /// Scanner with a caller-supplied station code table.
    pub fn with_stations(stations: StationDirectory) -> Self {
        BillScanner { stations }
    }

    /// Build the OCR-derived candidate record from recognized text.
    pub fn extract_from_text(&self, text: &str) -> BillRecord {
        // Step 1: canonicalize the recognized text
        let normalized = TextNormalizer::normalize(text);
        if normalized.is_empty() {
            return BillRecord::default();
        }

        // Step 2: collect labeled values
        let mut field_map = FieldMapBuilder::build(&normalized);

        // Step 3: attribute unlabeled values to the fields still missing
        let orphans = OrphanValueLocator::locate(&normalized);
        orphans.fill_missing(&mut field_map);

        // Step 4: run the per-field extractors. Amount and date fall back
        // to zero and the current date when the text yields nothing.
        BillRecord {
            ticket_number: FieldExtractor::ticket_number(&field_map, &normalized),
            amount: Some(
                FieldExtractor::amount(&field_map, &normalized).unwrap_or(0.0),
            ),
            date: Some(
                FieldExtractor::date(&field_map, &normalized)
                    .unwrap_or_else(NumericNormalizer::now_fallback),
            ),
            origin: FieldExtractor::origin(&field_map, &normalized),
            destination: FieldExtractor::destination(&field_map, &normalized),
            emissions_saved: FieldExtractor::emissions_saved(&normalized),
            raw_text: Some(normalized),
        }
    }

    /// Build the QR-derived candidate record from a raw payload string.
    pub fn extract_from_payload(&self, payload: &str) -> BillRecord {
        QrPayloadDecoder::decode(payload, &self.stations)
    }

    /// Combine the two candidates into the final record.
    pub fn merge(&self, ocr: BillRecord, qr: BillRecord) -> BillRecord {
        FieldMerger::merge(ocr, qr)
    }

    /// Record returned when the upstream recognizer or scanner failed
    /// outright: all fields empty, with the diagnostic marker that merge
    /// would put in raw_text.
    pub fn degraded_record(&self) -> BillRecord {
        BillRecord {
            raw_text: Some("[no text recognized]".to_string()),
            ..Default::default()
        }
    }
}

impl Default for BillScanner {
    fn default() -> Self {
        BillScanner::new()
    }
}
