// src/process/mod.rs

//! The cleaning pipeline. Each stage takes a batch by reference and
//! returns a new one, so stages can be run and inspected on their own:
//!
//! project → fill_missing_perpetrator → derive_season → categorize → filter_outliers

pub mod categorize;
pub mod date_parser;
pub mod missing;
pub mod outliers;
pub mod project;
pub mod season;
pub mod utils;

#[cfg(test)]
pub(crate) mod fixtures;

use arrow::{datatypes::Schema, record_batch::RecordBatch};
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::schema::cleaned_arrow_schema;

pub use categorize::categorize;
pub use missing::fill_missing_perpetrator;
pub use outliers::filter_outliers;
pub use project::project;
pub use season::{derive_season, Season};

/// Row accounting for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CleaningSummary {
    pub input_rows: usize,
    pub unparsed_dates: usize,
    pub dropped_outliers: usize,
    pub output_rows: usize,
}

/// Run every stage over the raw export.
pub fn clean(raw: &RecordBatch, config: &Config) -> Result<RecordBatch> {
    clean_with_summary(raw, config).map(|(batch, _)| batch)
}

#[instrument(level = "info", skip_all, fields(rows = raw.num_rows()))]
pub fn clean_with_summary(
    raw: &RecordBatch,
    config: &Config,
) -> Result<(RecordBatch, CleaningSummary)> {
    let projected = project(raw, &config.columns)?;
    let filled = fill_missing_perpetrator(&projected)?;
    let seasoned = derive_season(&filled)?;
    let categorized = categorize(&seasoned)?;
    let cleaned = filter_outliers(&categorized)?;
    check_cleaned_schema(&cleaned.schema())?;

    let summary = CleaningSummary {
        input_rows: raw.num_rows(),
        unparsed_dates: season::unparsed_dates(&seasoned),
        dropped_outliers: categorized.num_rows() - cleaned.num_rows(),
        output_rows: cleaned.num_rows(),
    };
    info!(
        input = summary.input_rows,
        output = summary.output_rows,
        unparsed_dates = summary.unparsed_dates,
        dropped = summary.dropped_outliers,
        "cleaned incidents"
    );
    Ok((cleaned, summary))
}

/// The finished table must hold exactly the declared columns, in order,
/// with their declared types.
pub fn check_cleaned_schema(schema: &Schema) -> Result<()> {
    let expected = cleaned_arrow_schema();
    for (i, want) in expected.fields().iter().enumerate() {
        let found = schema.fields().get(i);
        match found {
            Some(f) if f.name() == want.name() && f.data_type() == want.data_type() => {}
            Some(f) => {
                return Err(PipelineError::ColumnType {
                    column: want.name().clone(),
                    found: format!("{} {}", f.name(), f.data_type()),
                })
            }
            None => {
                return Err(PipelineError::MissingColumn {
                    column: want.name().clone(),
                    source_name: want.name().clone(),
                })
            }
        }
    }
    if schema.fields().len() > expected.fields().len() {
        let extra = &schema.fields()[expected.fields().len()];
        return Err(PipelineError::ColumnType {
            column: extra.name().clone(),
            found: format!("unexpected column {}", extra.data_type()),
        });
    }
    Ok(())
}
