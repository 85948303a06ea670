pub mod types;

pub use types::{ExtractedFields, ServiceAccountKey, TemplateRow, NOT_FOUND};
