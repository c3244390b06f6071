// src/error.rs

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use std::io;
use thiserror::Error;

/// Failures of loading, cleaning or exporting the incident table.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required source column is absent from the raw table.
    #[error("missing required column `{source_name}` (maps to `{column}`)")]
    MissingColumn { column: String, source_name: String },

    /// A column exists but holds a type the stage cannot read.
    #[error("column `{column}` has unsupported type {found}")]
    ColumnType { column: String, found: String },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the regression step. Kept apart from [`PipelineError`] so a
/// model that cannot be fitted is reported without failing the run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("no complete observations to fit")]
    EmptyTable,

    #[error("predictor `{predictor}` has a single observed level `{level}`")]
    SingleLevel { predictor: String, level: String },

    #[error("outcome `{outcome}` takes a single value")]
    ConstantOutcome { outcome: String },

    #[error("information matrix is singular")]
    Singular,

    #[error("column `{0}` is missing or has an unsupported type")]
    BadColumn(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
