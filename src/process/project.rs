use arrow::{
    array::ArrayRef,
    compute::cast,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::SourceColumns;
use crate::error::{PipelineError, Result};
use crate::schema::projected_columns;

/// Stage 4.1: keep the ten analysed columns, renamed to their canonical
/// names and held as Utf8, in projection order.
#[instrument(level = "debug", skip_all, fields(rows = raw.num_rows()))]
pub fn project(raw: &RecordBatch, columns: &SourceColumns) -> Result<RecordBatch> {
    let raw_schema = raw.schema();
    let mut fields = Vec::with_capacity(10);
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(10);

    for canonical in projected_columns() {
        let source = columns
            .source_for(canonical)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: canonical.to_string(),
                source_name: String::new(),
            })?;
        let idx = raw_schema
            .index_of(source)
            .map_err(|_| PipelineError::MissingColumn {
                column: canonical.to_string(),
                source_name: source.to_string(),
            })?;
        let arr = raw.column(idx);
        let arr = match arr.data_type() {
            DataType::Utf8 => arr.clone(),
            other => {
                debug!(column = canonical, from = %other, "casting to text");
                cast(arr, &DataType::Utf8).map_err(|_| PipelineError::ColumnType {
                    column: canonical.to_string(),
                    found: other.to_string(),
                })?
            }
        };
        fields.push(Field::new(canonical, DataType::Utf8, true));
        arrays.push(arr);
    }

    let out = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
    debug!(rows = out.num_rows(), "projected");
    Ok(out)
}
