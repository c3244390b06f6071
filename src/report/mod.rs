//! Descriptive report over the cleaned incident table: counts by season and
//! by borough, and a logistic model of the murder flag on victim
//! demographics.

pub mod counts;
pub mod logit;

use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::fmt::Write as _;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::Result;
use crate::process::CleaningSummary;
use crate::schema::names::{BOROUGH, IS_MURDER, OCCUR_SEASON};
use crate::schema::VIC_COLUMNS;

pub use counts::{count_by, render_bar_chart, LevelCount};
pub use logit::{fit_logit, Coefficient, LogitFit};

/// The model step either fits or records why it could not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    Fitted(LogitFit),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningSummary>,
    pub rows: usize,
    pub by_season: Vec<LevelCount>,
    pub by_borough: Vec<LevelCount>,
    pub murder_model: ModelOutcome,
    #[serde(skip)]
    chart_width: usize,
}

impl Report {
    #[instrument(level = "info", skip_all, fields(rows = batch.num_rows()))]
    pub fn build(batch: &RecordBatch, config: &Config) -> Result<Self> {
        let by_season = count_by(batch, OCCUR_SEASON)?;
        let by_borough = count_by(batch, BOROUGH)?;

        let murder_model = match fit_logit(batch, IS_MURDER, &VIC_COLUMNS) {
            Ok(fit) => {
                info!(
                    n_obs = fit.n_obs,
                    terms = fit.coefficients.len(),
                    converged = fit.converged,
                    "fitted murder model"
                );
                ModelOutcome::Fitted(fit)
            }
            Err(e) => {
                warn!(error = %e, "murder model not fitted");
                ModelOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok(Self {
            cleaning: None,
            rows: batch.num_rows(),
            by_season,
            by_borough,
            murder_model,
            chart_width: config.chart_width,
        })
    }

    pub fn with_cleaning(mut self, summary: CleaningSummary) -> Self {
        self.cleaning = Some(summary);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_text(&self) -> String {
        let mut s = String::new();
        if let Some(c) = &self.cleaning {
            let _ = writeln!(
                s,
                "Cleaned {} of {} rows ({} unparseable dates, {} outliers dropped)\n",
                c.output_rows, c.input_rows, c.unparsed_dates, c.dropped_outliers
            );
        }
        s.push_str(&render_bar_chart(
            "Incidents by season",
            &self.by_season,
            self.chart_width,
        ));
        s.push('\n');
        s.push_str(&render_bar_chart(
            "Incidents by borough",
            &self.by_borough,
            self.chart_width,
        ));
        s.push('\n');

        match &self.murder_model {
            ModelOutcome::Fitted(fit) => s.push_str(&render_fit(fit)),
            ModelOutcome::Failed { error } => {
                let _ = writeln!(s, "Murder model: not fitted ({})", error);
            }
        }
        s
    }
}

fn stars(p: f64) -> &'static str {
    match p {
        p if p < 0.001 => "***",
        p if p < 0.01 => "**",
        p if p < 0.05 => "*",
        p if p < 0.1 => ".",
        _ => "",
    }
}

fn render_fit(fit: &LogitFit) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Logistic regression of {}", fit.outcome);
    for (pred, level) in &fit.reference_levels {
        let _ = writeln!(s, "  reference {}: {}", pred, level);
    }

    let term_width = fit
        .coefficients
        .iter()
        .map(|c| c.term.len())
        .max()
        .unwrap_or(0);
    let _ = writeln!(
        s,
        "  {:<tw$} {:>10} {:>10} {:>8} {:>10}",
        "",
        "Estimate",
        "Std.Error",
        "z value",
        "Pr(>|z|)",
        tw = term_width
    );
    for c in &fit.coefficients {
        let _ = writeln!(
            s,
            "  {:<tw$} {:>10.5} {:>10.5} {:>8.3} {:>10.3e} {}",
            c.term,
            c.estimate,
            c.std_error,
            c.z_value,
            c.p_value,
            stars(c.p_value),
            tw = term_width
        );
    }
    let _ = writeln!(
        s,
        "  null deviance {:.2}, residual deviance {:.2} on {} obs, AIC {:.2}",
        fit.null_deviance, fit.residual_deviance, fit.n_obs, fit.aic
    );
    if !fit.converged {
        let _ = writeln!(
            s,
            "  warning: did not converge after {} iterations",
            fit.iterations
        );
    }
    s
}
