//! Raw-export batches for tests.

use arrow::{
    array::{ArrayRef, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::config::SourceColumns;

#[derive(Debug, Clone)]
pub struct RawRow {
    pub id: Option<&'static str>,
    pub date: Option<&'static str>,
    pub boro: Option<&'static str>,
    pub perp_age: Option<&'static str>,
    pub perp_sex: Option<&'static str>,
    pub perp_race: Option<&'static str>,
    pub vic_age: Option<&'static str>,
    pub vic_sex: Option<&'static str>,
    pub vic_race: Option<&'static str>,
    pub murder: Option<&'static str>,
}

/// A fully populated row; tests override the fields they care about.
pub fn row(id: &'static str, date: &'static str) -> RawRow {
    RawRow {
        id: Some(id),
        date: Some(date),
        boro: Some("BROOKLYN"),
        perp_age: Some("18-24"),
        perp_sex: Some("M"),
        perp_race: Some("BLACK"),
        vic_age: Some("25-44"),
        vic_sex: Some("M"),
        vic_race: Some("BLACK"),
        murder: Some("false"),
    }
}

/// Build a batch named like the source export, with an extra column the
/// projector is expected to drop.
pub fn raw_batch(rows: &[RawRow]) -> RecordBatch {
    let src = SourceColumns::default();
    let col = |f: fn(&RawRow) -> Option<&'static str>| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    RecordBatch::try_from_iter(vec![
        ("LOCATION_DESC", col(|_| Some("PVT HOUSE"))),
        (src.incident_id.as_str(), col(|r| r.id)),
        (src.occur_date.as_str(), col(|r| r.date)),
        (src.borough.as_str(), col(|r| r.boro)),
        (src.perp_age_group.as_str(), col(|r| r.perp_age)),
        (src.perp_sex.as_str(), col(|r| r.perp_sex)),
        (src.perp_race.as_str(), col(|r| r.perp_race)),
        (src.vic_age_group.as_str(), col(|r| r.vic_age)),
        (src.vic_sex.as_str(), col(|r| r.vic_sex)),
        (src.vic_race.as_str(), col(|r| r.vic_race)),
        (src.is_murder.as_str(), col(|r| r.murder)),
    ])
    .expect("fixture batch")
}

/// Values of a string-like column, for assertions.
pub fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let arr = super::utils::column(batch, name).expect("column");
    super::utils::as_strings(arr, name)
        .expect("strings")
        .iter()
        .map(|v| v.map(str::to_string))
        .collect()
}
