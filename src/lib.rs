//! Cleaning and descriptive reporting for shooting-incident exports.
//!
//! A raw CSV export is loaded into an Arrow [`RecordBatch`](arrow::record_batch::RecordBatch),
//! passed through the stages in [`process`], and summarised by [`report`].

pub mod config;
pub mod error;
pub mod export;
pub mod load;
pub mod process;
pub mod report;
pub mod schema;

pub use config::Config;
pub use error::{ModelError, PipelineError, Result};
