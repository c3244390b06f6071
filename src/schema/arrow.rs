// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::sync::Arc;

use super::types::{ColumnKind, ColumnSpec};

/// Arrow type a column holds once the pipeline has finished.
///
/// - OpaqueId                              → Utf8
/// - Date                                  → Date32
/// - Season, NullableCategory, Category    → Dictionary(Int32, Utf8)
/// - Boolean                               → Boolean
pub fn map_to_arrow_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::OpaqueId => DataType::Utf8,
        ColumnKind::Date => DataType::Date32,
        ColumnKind::Season | ColumnKind::NullableCategory | ColumnKind::Category => {
            categorical_type()
        }
        ColumnKind::Boolean => DataType::Boolean,
    }
}

/// Dictionary encoding used for every categorical column.
pub fn categorical_type() -> DataType {
    DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
}

/// Build an ArrowSchema (inside an Arc) from a slice of `ColumnSpec`s.
pub fn build_arrow_schema(cols: &[ColumnSpec]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = cols
        .iter()
        .map(|col| ArrowField::new(col.name, map_to_arrow_type(col.kind), true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}
