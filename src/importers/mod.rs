// Import module - Trading212 CSV exports and the normalized intermediate format

pub mod processed;
pub mod trading212;

pub use processed::{read_processed, write_processed};
pub use trading212::{import_path, parse_file, resolve_transactions, RawRecord};
