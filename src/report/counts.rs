use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::process::utils::{as_strings, column};

/// Rows sharing one value of a column. `level` is `None` for nulls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelCount {
    pub level: Option<String>,
    pub count: usize,
}

/// Count rows per value of `name`, in sorted level order with nulls last.
/// Levels with no rows are not listed.
pub fn count_by(batch: &RecordBatch, name: &str) -> Result<Vec<LevelCount>> {
    let values = as_strings(column(batch, name)?, name)?;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut nulls = 0;
    for v in values.iter() {
        match v {
            Some(v) => *counts.entry(v).or_default() += 1,
            None => nulls += 1,
        }
    }

    let mut out: Vec<LevelCount> = counts
        .into_iter()
        .map(|(level, count)| LevelCount {
            level: Some(level.to_string()),
            count,
        })
        .collect();
    if nulls > 0 {
        out.push(LevelCount {
            level: None,
            count: nulls,
        });
    }
    Ok(out)
}

/// Horizontal text bar chart; the largest count gets `width` marks.
pub fn render_bar_chart(title: &str, counts: &[LevelCount], width: usize) -> String {
    let mut s = format!("{}\n", title);
    if counts.is_empty() {
        s.push_str("  (no rows)\n");
        return s;
    }

    let label = |c: &LevelCount| c.level.clone().unwrap_or_else(|| "NA".into());
    let label_width = counts.iter().map(|c| label(c).len()).max().unwrap_or(0);
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0).max(1);

    for c in counts {
        let mut bar = c.count * width / max;
        if c.count > 0 && bar == 0 {
            bar = 1;
        }
        s.push_str(&format!(
            "  {:<lw$} | {} {}\n",
            label(c),
            "#".repeat(bar),
            c.count,
            lw = label_width
        ));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use arrow::array::{ArrayRef, DictionaryArray, StringArray};
    use arrow::datatypes::Int32Type;
    use std::sync::Arc;

    fn level(l: Option<&str>, count: usize) -> LevelCount {
        LevelCount {
            level: l.map(str::to_string),
            count,
        }
    }

    #[test]
    fn counts_in_level_order_with_nulls_last() -> Result<()> {
        let boro: DictionaryArray<Int32Type> = vec![
            Some("QUEENS"),
            None,
            Some("BRONX"),
            Some("QUEENS"),
        ]
        .into_iter()
        .collect();
        let batch = RecordBatch::try_from_iter(vec![("borough", Arc::new(boro) as ArrayRef)])?;
        assert_eq!(
            count_by(&batch, "borough")?,
            vec![
                level(Some("BRONX"), 1),
                level(Some("QUEENS"), 2),
                level(None, 1)
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_table_gives_no_levels() -> Result<()> {
        let empty: Vec<Option<&str>> = vec![];
        let batch = RecordBatch::try_from_iter(vec![(
            "occur_season",
            Arc::new(StringArray::from(empty)) as ArrayRef,
        )])?;
        assert!(count_by(&batch, "occur_season")?.is_empty());
        assert!(count_by(&batch, "borough").is_err());
        Ok(())
    }

    #[test]
    fn bars_scale_to_width() {
        let chart = render_bar_chart(
            "Incidents by season",
            &[level(Some("Fall"), 10), level(Some("Winter"), 5), level(None, 0)],
            10,
        );
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "Incidents by season");
        assert_eq!(lines[1], "  Fall   | ########## 10");
        assert_eq!(lines[2], "  Winter | ##### 5");
        assert_eq!(lines[3], "  NA     |  0");
        assert!(render_bar_chart("x", &[], 10).contains("(no rows)"));
    }
}
