use arrow::{
    array::{Array, ArrayRef, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::process::utils::{as_strings, column, replace_column};
use crate::schema::PERP_COLUMNS;

/// Sentinel category for absent or placeholder values.
pub const UNKNOWN: &str = "Unknown";

/// Stage 4.2: nulls in the three perpetrator columns become "Unknown".
/// All other columns pass through untouched.
#[instrument(level = "debug", skip_all, fields(rows = batch.num_rows()))]
pub fn fill_missing_perpetrator(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut out = batch.clone();
    for name in PERP_COLUMNS {
        let arr = column(&out, name)?;
        if arr.null_count() == 0 {
            continue;
        }
        debug!(column = name, nulls = arr.null_count(), "filling missing");
        let filled: StringArray = as_strings(arr, name)?
            .iter()
            .map(|v| Some(v.unwrap_or(UNKNOWN)))
            .collect();
        out = replace_column(&out, name, Arc::new(filled) as ArrayRef)?;
    }
    Ok(out)
}
