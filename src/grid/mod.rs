pub mod cell_store;
pub mod error;
pub mod snapshot;
pub mod stats;
