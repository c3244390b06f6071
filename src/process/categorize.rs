use arrow::{
    array::{Array, ArrayRef, BooleanArray, DictionaryArray, Int32Array, StringArray},
    datatypes::Int32Type,
    record_batch::RecordBatch,
};
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::process::missing::UNKNOWN;
use crate::process::utils::{as_strings, column, replace_column};
use crate::schema::{categorical_columns, names::IS_MURDER, DEMOGRAPHIC_COLUMNS};

/// Placeholder spellings and the value they collapse to. Matching is exact:
/// case-sensitive, no trimming.
const SYNONYMS: &[(&str, &str)] = &[("UNKNOWN", UNKNOWN), ("U", UNKNOWN)];

pub fn canonicalize(value: &str) -> &str {
    SYNONYMS
        .iter()
        .find(|(raw, _)| *raw == value)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(value)
}

/// Dictionary-encode a string column. The dictionary holds exactly the
/// distinct non-null values, sorted.
pub fn to_categorical(values: &StringArray) -> Result<DictionaryArray<Int32Type>> {
    let levels: BTreeSet<&str> = values.iter().flatten().collect();
    let index: HashMap<&str, i32> = levels
        .iter()
        .enumerate()
        .map(|(i, v)| (*v, i as i32))
        .collect();

    let keys: Int32Array = values
        .iter()
        .map(|v| v.and_then(|v| index.get(v).copied()))
        .collect();
    let dict = StringArray::from_iter_values(levels.iter());

    Ok(DictionaryArray::try_new(keys, Arc::new(dict) as ArrayRef)?)
}

/// Read a boolean-like flag. Unrecognised text is `None`.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "y" | "yes" | "1" => Some(true),
        "false" | "f" | "n" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn to_boolean(arr: &ArrayRef) -> Result<BooleanArray> {
    if let Some(b) = arr.as_any().downcast_ref::<BooleanArray>() {
        return Ok(b.clone());
    }
    let text = as_strings(arr, IS_MURDER)?;
    let flags: BooleanArray = text.iter().map(|v| v.and_then(parse_flag)).collect();

    let unrecognised = flags.null_count() - text.null_count();
    if unrecognised > 0 {
        warn!(unrecognised, "murder flag values not recognised as boolean");
    }
    Ok(flags)
}

/// Stage 4.4: collapse placeholder spellings in the demographic columns,
/// dictionary-encode every categorical column and fix the murder flag to
/// Boolean. The identifier stays text.
#[instrument(level = "debug", skip_all, fields(rows = batch.num_rows()))]
pub fn categorize(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut out = batch.clone();

    for name in DEMOGRAPHIC_COLUMNS {
        let text = as_strings(column(&out, name)?, name)?;
        let replaced = text
            .iter()
            .filter(|v| v.is_some_and(|v| canonicalize(v) != v))
            .count();
        if replaced == 0 {
            continue;
        }
        debug!(column = name, replaced, "canonicalised placeholders");
        let canonical: StringArray = text.iter().map(|v| v.map(canonicalize)).collect();
        out = replace_column(&out, name, Arc::new(canonical) as ArrayRef)?;
    }

    for name in categorical_columns() {
        let text = as_strings(column(&out, name)?, name)?;
        let dict = to_categorical(&text)?;
        debug!(column = name, levels = dict.values().len(), "categorical");
        out = replace_column(&out, name, Arc::new(dict) as ArrayRef)?;
    }

    let flags = to_boolean(column(&out, IS_MURDER)?)?;
    replace_column(&out, IS_MURDER, Arc::new(flags) as ArrayRef)
}

/// Sorted levels of a dictionary-encoded column.
pub fn levels(arr: &ArrayRef) -> Option<Vec<String>> {
    let dict = arr.as_any().downcast_ref::<DictionaryArray<Int32Type>>()?;
    let values = dict.values().as_any().downcast_ref::<StringArray>()?;
    Some(values.iter().flatten().map(str::to_string).collect())
}
