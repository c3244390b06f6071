use arrow::{
    array::{Array, ArrayRef, Date32Array, StringArray},
    datatypes::{Field, Schema},
    record_batch::RecordBatch,
};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::{fmt, sync::Arc};
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::process::date_parser::{parse_mdy, to_date32};
use crate::process::utils::{as_strings, column};
use crate::schema::names::{INCIDENT_ID, OCCUR_DATE, OCCUR_SEASON};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Dec–Feb winter, Mar–May spring, Jun–Aug summer, Sep–Nov fall.
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Fall),
            _ => None,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        // month() is always 1..=12
        Self::from_month(date.month()).unwrap_or(Season::Winter)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage 4.3: parse `occur_date` into a `Date32` and derive `occur_season`.
///
/// Unparseable dates give a null date and a null season for that row only.
/// Output order is id, date, season, then every other column as before.
#[instrument(level = "debug", skip_all, fields(rows = batch.num_rows()))]
pub fn derive_season(batch: &RecordBatch) -> Result<RecordBatch> {
    let raw_dates = as_strings(column(batch, OCCUR_DATE)?, OCCUR_DATE)?;

    let parsed: Vec<Option<NaiveDate>> = raw_dates.iter().map(|v| v.and_then(parse_mdy)).collect();

    let unparsed = parsed
        .iter()
        .zip(raw_dates.iter())
        .filter(|(p, raw)| p.is_none() && raw.is_some())
        .count();
    if unparsed > 0 {
        let sample = parsed
            .iter()
            .zip(raw_dates.iter())
            .find_map(|(p, raw)| if p.is_none() { raw } else { None });
        warn!(unparsed, sample = ?sample, "unparseable occurrence dates");
    }

    let dates: Date32Array = parsed.iter().map(|d| d.map(to_date32)).collect();
    let seasons: StringArray = parsed
        .iter()
        .map(|d| d.map(|d| Season::of(d).as_str()))
        .collect();

    let schema = batch.schema();
    let mut fields = vec![
        Field::new(INCIDENT_ID, schema.field_with_name(INCIDENT_ID)?.data_type().clone(), true),
        Field::new(OCCUR_DATE, dates.data_type().clone(), true),
        Field::new(OCCUR_SEASON, seasons.data_type().clone(), true),
    ];
    let mut cols: Vec<ArrayRef> = vec![
        column(batch, INCIDENT_ID)?.clone(),
        Arc::new(dates),
        Arc::new(seasons),
    ];
    for (field, arr) in schema.fields().iter().zip(batch.columns()) {
        let name = field.name().as_str();
        if name == INCIDENT_ID || name == OCCUR_DATE || name == OCCUR_SEASON {
            continue;
        }
        fields.push(field.as_ref().clone());
        cols.push(arr.clone());
    }

    let out = RecordBatch::try_new(Arc::new(Schema::new(fields)), cols)?;
    debug!(rows = out.num_rows(), unparsed, "derived season");
    Ok(out)
}

/// Nulls in `occur_date` after stage 4.3, i.e. dates that did not parse.
pub fn unparsed_dates(batch: &RecordBatch) -> usize {
    batch
        .column_by_name(OCCUR_DATE)
        .map(|c| c.null_count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceColumns;
    use crate::process::fixtures::{raw_batch, row, strings};
    use crate::process::project::project;
    use anyhow::Result;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_buckets() {
        assert_eq!(Season::of(ymd(2021, 12, 25)), Season::Winter);
        assert_eq!(Season::of(ymd(2021, 3, 1)), Season::Spring);
        assert_eq!(Season::of(ymd(2021, 7, 4)), Season::Summer);
        assert_eq!(Season::of(ymd(2021, 9, 30)), Season::Fall);

        let expected = [
            "Winter", "Winter", "Spring", "Spring", "Spring", "Summer", "Summer", "Summer",
            "Fall", "Fall", "Fall", "Winter",
        ];
        for (m, want) in (1..=12).zip(expected) {
            assert_eq!(Season::from_month(m).map(Season::as_str), Some(want));
            assert_eq!(Season::of(ymd(2020, m, 15)).as_str(), want);
        }
        assert_eq!(Season::from_month(0), None);
        assert_eq!(Season::from_month(13), None);
    }

    #[test]
    fn reorders_columns_with_season_third() -> Result<()> {
        let batch = project(
            &raw_batch(&[row("1", "07/04/2021")]),
            &SourceColumns::default(),
        )?;
        let out = derive_season(&batch)?;
        let names: Vec<String> = out
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(
            names,
            vec![
                "incident_id",
                "occur_date",
                "occur_season",
                "borough",
                "perp_age_group",
                "perp_sex",
                "perp_race",
                "vic_age_group",
                "vic_sex",
                "vic_race",
                "is_murder"
            ]
        );
        assert_eq!(strings(&out, "occur_season"), vec![Some("Summer".into())]);
        assert_eq!(
            out.schema().field(1).data_type(),
            &arrow::datatypes::DataType::Date32
        );
        Ok(())
    }

    #[test]
    fn bad_date_yields_null_season_without_failing() -> Result<()> {
        let mut missing = row("3", "01/01/2020");
        missing.date = None;
        let batch = project(
            &raw_batch(&[
                row("1", "13/45/2020"),
                row("2", "12/25/2021"),
                missing,
            ]),
            &SourceColumns::default(),
        )?;
        let out = derive_season(&batch)?;
        assert_eq!(out.num_rows(), 3);
        assert_eq!(
            strings(&out, "occur_season"),
            vec![None, Some("Winter".into()), None]
        );
        assert_eq!(unparsed_dates(&out), 2);
        let dates = out
            .column(1)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(dates.value_as_date(1), Some(ymd(2021, 12, 25)));
        Ok(())
    }

    #[test]
    fn two_digit_year_gives_null_date_and_season() -> Result<()> {
        let batch = project(
            &raw_batch(&[row("1", "07/04/21"), row("2", "07/04/2021")]),
            &SourceColumns::default(),
        )?;
        let out = derive_season(&batch)?;
        assert_eq!(
            strings(&out, "occur_season"),
            vec![None, Some("Summer".into())]
        );
        assert!(out.column(1).is_null(0));
        assert_eq!(unparsed_dates(&out), 1);
        Ok(())
    }
}
