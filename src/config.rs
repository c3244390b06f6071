// src/config.rs

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::debug;

use crate::error::Result;

/// Header names of the source export, one per projected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceColumns {
    pub incident_id: String,
    pub occur_date: String,
    pub borough: String,
    pub perp_age_group: String,
    pub perp_sex: String,
    pub perp_race: String,
    pub vic_age_group: String,
    pub vic_sex: String,
    pub vic_race: String,
    pub is_murder: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            incident_id: "INCIDENT_KEY".into(),
            occur_date: "OCCUR_DATE".into(),
            borough: "BORO".into(),
            perp_age_group: "PERP_AGE_GROUP".into(),
            perp_sex: "PERP_SEX".into(),
            perp_race: "PERP_RACE".into(),
            vic_age_group: "VIC_AGE_GROUP".into(),
            vic_sex: "VIC_SEX".into(),
            vic_race: "VIC_RACE".into(),
            is_murder: "STATISTICAL_MURDER_FLAG".into(),
        }
    }
}

impl SourceColumns {
    /// Source header for a canonical column name, `None` for columns the
    /// export does not carry (the derived season).
    pub fn source_for(&self, canonical: &str) -> Option<&str> {
        use crate::schema::names::*;
        let source = match canonical {
            INCIDENT_ID => &self.incident_id,
            OCCUR_DATE => &self.occur_date,
            BOROUGH => &self.borough,
            PERP_AGE_GROUP => &self.perp_age_group,
            PERP_SEX => &self.perp_sex,
            PERP_RACE => &self.perp_race,
            VIC_AGE_GROUP => &self.vic_age_group,
            VIC_SEX => &self.vic_sex,
            VIC_RACE => &self.vic_race,
            IS_MURDER => &self.is_murder,
            _ => return None,
        };
        Some(source.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub columns: SourceColumns,
    /// Rows per batch when reading the CSV export.
    pub batch_size: usize,
    /// Width in characters of the longest bar in text charts.
    pub chart_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            columns: SourceColumns::default(),
            batch_size: 8192,
            chart_width: 40,
        }
    }
}

impl Config {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let cfg = Self::from_yaml_str(&text)?;
        debug!(path = %path.as_ref().display(), ?cfg, "loaded config");
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let cfg = Config::from_yaml_str("columns:\n  borough: BOROUGH\nbatch_size: 10\n")?;
        assert_eq!(cfg.columns.borough, "BOROUGH");
        assert_eq!(cfg.columns.incident_id, "INCIDENT_KEY");
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.chart_width, 40);
        Ok(())
    }

    #[test]
    fn loads_from_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "chart_width: 12")?;
        let cfg = Config::from_yaml_file(tmp.path())?;
        assert_eq!(cfg.chart_width, 12);
        assert_eq!(cfg.columns, SourceColumns::default());
        Ok(())
    }

    #[test]
    fn every_projected_column_has_a_source() {
        let cols = SourceColumns::default();
        for name in crate::schema::projected_columns() {
            assert!(cols.source_for(name).is_some(), "{name} has no source");
        }
        assert_eq!(cols.source_for("occur_season"), None);
        assert_eq!(cols.source_for("vic_sex"), Some("VIC_SEX"));
    }

    #[test]
    fn bad_yaml_is_config_error() {
        let err = Config::from_yaml_str("batch_size: [1, 2").unwrap_err();
        assert!(matches!(err, crate::error::PipelineError::Config(_)));
    }
}
