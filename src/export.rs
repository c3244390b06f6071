// src/export.rs

use arrow::record_batch::RecordBatch;
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    path::Path,
};
use tracing::{info, instrument};

use crate::error::Result;

/// Write the cleaned table to `out_path`, through a temporary file renamed
/// into place once the writer has closed. Returns the file size in bytes.
#[instrument(level = "info", skip(batch, out_path), fields(path = %out_path.as_ref().display()))]
pub fn write_parquet<P: AsRef<Path>>(batch: &RecordBatch, out_path: P) -> Result<u64> {
    let out_path = out_path.as_ref();
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let temp_path = out_path.with_extension("tmp");

    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .set_dictionary_enabled(true)
        .build();

    let file = File::create(&temp_path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    fs::rename(&temp_path, out_path)?;
    let bytes = fs::metadata(out_path)?.len();
    info!(rows = batch.num_rows(), bytes, "wrote parquet");
    Ok(bytes)
}
