pub mod extractor;
pub mod geographic;
