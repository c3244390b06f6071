use arrow::{
    array::{ArrayRef, BooleanArray},
    compute::filter_record_batch,
    datatypes::DataType,
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::process::categorize::to_categorical;
use crate::process::utils::{as_strings, column, replace_column};
use crate::schema::{
    categorical_columns,
    names::{PERP_AGE_GROUP, VIC_AGE_GROUP},
};

/// Data-entry artefacts in the age group columns.
pub const INVALID_VIC_AGE: &[&str] = &["1022"];
pub const INVALID_PERP_AGE: &[&str] = &["1020", "224", "940"];

/// True for rows stage 4.5 keeps. Nulls never match a sentinel.
pub fn keep_mask(batch: &RecordBatch) -> Result<BooleanArray> {
    let vic = as_strings(column(batch, VIC_AGE_GROUP)?, VIC_AGE_GROUP)?;
    let perp = as_strings(column(batch, PERP_AGE_GROUP)?, PERP_AGE_GROUP)?;

    Ok(vic
        .iter()
        .zip(perp.iter())
        .map(|(v, p)| {
            let bad_vic = v.is_some_and(|v| INVALID_VIC_AGE.contains(&v));
            let bad_perp = p.is_some_and(|p| INVALID_PERP_AGE.contains(&p));
            Some(!(bad_vic || bad_perp))
        })
        .collect())
}

/// Stage 4.5: drop rows carrying an invalid age code. Dictionaries of the
/// surviving categorical columns are rebuilt so they list only values that
/// still occur.
#[instrument(level = "debug", skip_all, fields(rows = batch.num_rows()))]
pub fn filter_outliers(batch: &RecordBatch) -> Result<RecordBatch> {
    let mask = keep_mask(batch)?;
    let mut out = filter_record_batch(batch, &mask)?;

    for name in categorical_columns() {
        let Some(arr) = out.column_by_name(name) else {
            continue;
        };
        if !matches!(arr.data_type(), DataType::Dictionary(_, _)) {
            continue;
        }
        let dict = to_categorical(&as_strings(arr, name)?)?;
        out = replace_column(&out, name, Arc::new(dict) as ArrayRef)?;
    }

    debug!(
        kept = out.num_rows(),
        dropped = batch.num_rows() - out.num_rows(),
        "filtered outliers"
    );
    Ok(out)
}
