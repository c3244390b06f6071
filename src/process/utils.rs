use arrow::{
    array::{ArrayRef, AsArray, StringArray},
    compute::cast,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::error::{PipelineError, Result};

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Look up a column by its canonical name.
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::MissingColumn {
            column: name.to_string(),
            source_name: name.to_string(),
        })
}

/// View any string-like column (Utf8, dictionary of Utf8, numbers) as a
/// plain `StringArray`, keeping nulls.
pub fn as_strings(array: &ArrayRef, name: &str) -> Result<StringArray> {
    let casted = match array.data_type() {
        DataType::Utf8 => array.clone(),
        _ => cast(array, &DataType::Utf8).map_err(|_| PipelineError::ColumnType {
            column: name.to_string(),
            found: array.data_type().to_string(),
        })?,
    };
    casted
        .as_string_opt::<i32>()
        .cloned()
        .ok_or_else(|| PipelineError::ColumnType {
            column: name.to_string(),
            found: casted.data_type().to_string(),
        })
}

/// Return a new batch with column `name` swapped for `array`, updating the
/// field type to match the new array.
pub fn replace_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let idx = schema.index_of(name).map_err(|_| PipelineError::MissingColumn {
        column: name.to_string(),
        source_name: name.to_string(),
    })?;

    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields[idx] = Field::new(name, array.data_type().clone(), true);

    let mut cols: Vec<ArrayRef> = batch.columns().to_vec();
    cols[idx] = array;

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), cols)?)
}
