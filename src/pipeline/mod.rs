pub mod builder;
pub mod config;
pub mod dataset;
pub mod error;
