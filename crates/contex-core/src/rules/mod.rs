//! Rule-based field extraction: the pattern catalog, value transforms, the
//! single-rule extractor, and the derivation engine.

pub mod catalog;
pub mod derive;
pub mod extract;
pub mod transforms;

pub use catalog::{ExtractionRule, FieldLists, PatternCatalog};
pub use derive::derive_termination_date;
pub use extract::extract_field;
pub use transforms::{normalize_currency, normalize_date, parse_date_loose, parse_money, Transform};
