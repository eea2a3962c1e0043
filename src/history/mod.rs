pub mod aggregator;
pub mod error;
pub mod ground_truth;
