pub mod extractors;
pub mod field_map;
pub mod merge;
pub mod normalize;
pub mod numeric;
pub mod orphans;
pub mod qr;
pub mod segmented;

pub use extractors::FieldExtractor;
pub use field_map::FieldMapBuilder;
pub use merge::FieldMerger;
pub use normalize::TextNormalizer;
pub use numeric::NumericNormalizer;
pub use orphans::OrphanValueLocator;
pub use qr::QrPayloadDecoder;
pub use segmented::SegmentedDecoder;
