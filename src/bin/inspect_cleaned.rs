use anyhow::{Context, Result};
use arrow::{array::Array, datatypes::DataType, record_batch::RecordBatch};
use clap::Parser;
use incident_report::process::utils::as_strings;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{collections::BTreeMap, fs::File, path::PathBuf};

#[derive(Parser)]
#[command(name = "inspect_cleaned")]
#[command(about = "Print the schema and category levels of a cleaned incident Parquet file")]
struct Args {
    /// Parquet file written by `incident_report --parquet`
    file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let file = File::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?
        .build()?;
    let batches = reader.collect::<std::result::Result<Vec<RecordBatch>, _>>()?;

    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    println!("=== {} ===", args.file.display());
    println!("Total rows: {}", rows);
    println!();

    let Some(first) = batches.first() else {
        println!("(no batches)");
        return Ok(());
    };
    let schema = first.schema();

    println!("=== Columns ===");
    for f in schema.fields() {
        println!("- {:<16} | {}", f.name(), f.data_type());
    }
    println!();

    for (idx, field) in schema.fields().iter().enumerate() {
        // level → rows, nulls counted under None
        let mut counts: BTreeMap<Option<String>, usize> = BTreeMap::new();
        let mut categorical = false;
        for batch in &batches {
            let column = batch.column(idx);
            if !matches!(column.data_type(), DataType::Dictionary(_, _)) {
                continue;
            }
            categorical = true;
            for v in as_strings(column, field.name())?.iter() {
                *counts.entry(v.map(str::to_string)).or_default() += 1;
            }
        }
        if !categorical {
            continue;
        }

        println!("=== {} ({} levels) ===", field.name(), counts.len());
        for (level, n) in &counts {
            println!("  {:<24} {}", level.as_deref().unwrap_or("NA"), n);
        }
        println!();
    }

    Ok(())
}
