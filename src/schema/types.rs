// src/schema/types.rs

use serde::{Deserialize, Serialize};

/// Semantic type of a column in the cleaned incident table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
pub enum ColumnKind {
    /// Identifier kept as text; never parsed as a number.
    OpaqueId,
    /// Calendar date parsed from month/day/year text.
    Date,
    /// Derived season; null when the date did not parse.
    Season,
    /// Category whose nulls are rewritten to the "Unknown" sentinel.
    NullableCategory,
    /// Category that is non-null in the source.
    Category,
    Boolean,
}

impl ColumnKind {
    pub fn is_categorical(self) -> bool {
        matches!(
            self,
            ColumnKind::Season | ColumnKind::NullableCategory | ColumnKind::Category
        )
    }
}

/// A single column of the cleaned table.
#[derive(Debug, Serialize, PartialEq, Clone, Eq, Hash)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}
