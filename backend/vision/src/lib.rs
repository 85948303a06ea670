pub mod client;
pub mod extract;
pub mod schema;

pub use client::{OcrClient, OcrError};
pub use extract::extract_fields;
