pub mod csv;
pub mod writer;

pub use crate::csv::CsvBuilder;
pub use crate::writer::{
    staging_dir, target_dir, DatasetWriter, RunDataset, WriteError, DATASET_FILES,
};
