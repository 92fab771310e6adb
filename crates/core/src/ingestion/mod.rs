//! Data ingestion: export the source collection and split it.

mod config;
mod ingestor;

pub use config::IngestionConfig;
pub use ingestor::{split_indices, DataIngestion};
