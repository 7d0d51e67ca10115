pub mod data;
pub mod stations;

pub use data::{BillRecord, FieldMap};
pub use stations::StationDirectory;
