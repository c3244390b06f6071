//! Column layout of the incident table, declared up front so every stage
//! works against named, typed columns instead of inferred ones.

pub mod arrow;
pub mod types;

pub use self::arrow::{build_arrow_schema, categorical_type, map_to_arrow_type};
pub use self::types::{ColumnKind, ColumnSpec};

use ::arrow::datatypes::SchemaRef;

/// Canonical column names used from stage 4.1 onwards.
pub mod names {
    pub const INCIDENT_ID: &str = "incident_id";
    pub const OCCUR_DATE: &str = "occur_date";
    pub const OCCUR_SEASON: &str = "occur_season";
    pub const BOROUGH: &str = "borough";
    pub const PERP_AGE_GROUP: &str = "perp_age_group";
    pub const PERP_SEX: &str = "perp_sex";
    pub const PERP_RACE: &str = "perp_race";
    pub const VIC_AGE_GROUP: &str = "vic_age_group";
    pub const VIC_SEX: &str = "vic_sex";
    pub const VIC_RACE: &str = "vic_race";
    pub const IS_MURDER: &str = "is_murder";
}

use names::*;

/// The cleaned table, in output order.
pub const INCIDENT_SCHEMA: [ColumnSpec; 11] = [
    ColumnSpec::new(INCIDENT_ID, ColumnKind::OpaqueId),
    ColumnSpec::new(OCCUR_DATE, ColumnKind::Date),
    ColumnSpec::new(OCCUR_SEASON, ColumnKind::Season),
    ColumnSpec::new(BOROUGH, ColumnKind::Category),
    ColumnSpec::new(PERP_AGE_GROUP, ColumnKind::NullableCategory),
    ColumnSpec::new(PERP_SEX, ColumnKind::NullableCategory),
    ColumnSpec::new(PERP_RACE, ColumnKind::NullableCategory),
    ColumnSpec::new(VIC_AGE_GROUP, ColumnKind::Category),
    ColumnSpec::new(VIC_SEX, ColumnKind::Category),
    ColumnSpec::new(VIC_RACE, ColumnKind::Category),
    ColumnSpec::new(IS_MURDER, ColumnKind::Boolean),
];

pub const PERP_COLUMNS: [&str; 3] = [PERP_AGE_GROUP, PERP_SEX, PERP_RACE];
pub const VIC_COLUMNS: [&str; 3] = [VIC_AGE_GROUP, VIC_SEX, VIC_RACE];
pub const DEMOGRAPHIC_COLUMNS: [&str; 6] = [
    PERP_AGE_GROUP,
    PERP_SEX,
    PERP_RACE,
    VIC_AGE_GROUP,
    VIC_SEX,
    VIC_RACE,
];

/// Columns in the order stage 4.1 emits them (no season yet).
pub fn projected_columns() -> Vec<&'static str> {
    INCIDENT_SCHEMA
        .iter()
        .filter(|c| c.kind != ColumnKind::Season)
        .map(|c| c.name)
        .collect()
}

/// Columns fixed to a dictionary encoding by stage 4.4.
pub fn categorical_columns() -> Vec<&'static str> {
    INCIDENT_SCHEMA
        .iter()
        .filter(|c| c.kind.is_categorical())
        .map(|c| c.name)
        .collect()
}

pub fn cleaned_arrow_schema() -> SchemaRef {
    build_arrow_schema(&INCIDENT_SCHEMA)
}
