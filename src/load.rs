// src/load.rs

use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::{
    fs,
    io::{Cursor, Read},
    path::Path,
    sync::Arc,
};
use tracing::{debug, info, instrument};

use crate::error::Result;

/// Read a headed CSV export into a single batch.
///
/// Every column is read as nullable Utf8 so that identifiers and codes such
/// as "1022" stay text; empty fields become nulls.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_csv_path<P: AsRef<Path>>(path: P, batch_size: usize) -> Result<RecordBatch> {
    let bytes = fs::read(path.as_ref())?;
    info!(bytes = bytes.len(), "read export");
    load_csv_bytes(bytes, batch_size)
}

pub fn load_csv_reader<R: Read>(mut reader: R, batch_size: usize) -> Result<RecordBatch> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    load_csv_bytes(bytes, batch_size)
}

fn load_csv_bytes(bytes: Vec<u8>, batch_size: usize) -> Result<RecordBatch> {
    // only the header names are needed; types are forced to Utf8 below
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(&bytes), Some(1))?;

    let read_schema = Arc::new(Schema::new(
        inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    debug!(columns = read_schema.fields().len(), "read schema");

    let csv_reader = ReaderBuilder::new(read_schema.clone())
        .with_header(true)
        .with_batch_size(batch_size.max(1))
        .build(Cursor::new(bytes))?;

    let batches = csv_reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    let batch = concat_batches(&read_schema, &batches)?;
    info!(
        rows = batch.num_rows(),
        batches = batches.len(),
        "loaded export"
    );
    Ok(batch)
}
