//! core/derive.rs: new fields computed from loaded ones.
//!
//! The functions here are pure. `apply_step` is the only place that touches a
//! `TableSet`, and it only adds fields or tables under new names.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::table::{SeriesTable, TableSet};
use crate::error::{Error, Result};

/// Field added to sub-sampled tables holding each row's index in the source.
pub const INDEX_FIELD: &str = "index";

/// `y[i] = slope * x[i] + intercept` for every sample.
pub fn linear_fit(x: &[f64], slope: f64, intercept: f64) -> Vec<f64> {
    x.iter().map(|&xi| slope * xi + intercept).collect()
}

/// Euclidean norm across several equal-length fields, sample by sample.
pub fn norm(fields: &[&[f64]]) -> Result<Vec<f64>> {
    let Some(first) = fields.first() else {
        return Err(Error::InvalidDerivation("norm needs at least one field".into()));
    };
    let len = first.len();
    if fields.iter().any(|f| f.len() != len) {
        return Err(Error::InvalidDerivation(
            "norm fields must share one length".into(),
        ));
    }
    Ok((0..len)
        .map(|i| fields.iter().map(|f| f[i] * f[i]).sum::<f64>().sqrt())
        .collect())
}

/// Index partition of a sampling window into kept and removed rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subsample {
    /// Number of leading samples the partition covers.
    pub window: usize,
    /// Every `stride`-th index starting at 0.
    pub kept: Vec<usize>,
    /// The remaining indices of the window, ascending.
    pub removed: Vec<usize>,
}

impl Subsample {
    /// Partition the first `prefix_fraction * n` samples (all of them when
    /// `None`; truncated toward zero) by `stride`.
    pub fn plan(n: usize, stride: usize, prefix_fraction: Option<f64>) -> Result<Self> {
        if stride == 0 {
            return Err(Error::InvalidDerivation("sub-sampling stride must be >= 1".into()));
        }
        let window = match prefix_fraction {
            None => n,
            Some(f) if f > 0.0 && f <= 1.0 => ((n as f64) * f).floor() as usize,
            Some(f) => {
                return Err(Error::InvalidDerivation(format!(
                    "prefix fraction must lie in (0, 1], got {f}"
                )));
            }
        };
        let (kept, removed): (Vec<usize>, Vec<usize>) =
            (0..window).partition(|i| i % stride == 0);
        Ok(Self {
            window,
            kept,
            removed,
        })
    }

    /// Materialize both partitions of `source` as new tables, each carrying
    /// every source field plus [`INDEX_FIELD`].
    pub fn apply(
        &self,
        source: &SeriesTable,
        kept_name: &str,
        removed_name: &str,
    ) -> Result<(SeriesTable, SeriesTable)> {
        let kept = Self::gather(source, kept_name, &self.kept)?;
        let removed = Self::gather(source, removed_name, &self.removed)?;
        Ok((kept, removed))
    }

    fn gather(source: &SeriesTable, name: &str, rows: &[usize]) -> Result<SeriesTable> {
        let mut table = source.select_rows(name, rows)?;
        table.insert(INDEX_FIELD, rows.iter().map(|&i| i as f64).collect())?;
        Ok(table)
    }
}

/// One declarative derivation, as written in experiment manifests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum DerivedStep {
    /// Adds `output` to `table`: `slope * x + intercept`.
    LinearFit {
        table: String,
        x: String,
        output: String,
        slope: f64,
        intercept: f64,
    },
    /// Adds `output` to `table`: the Euclidean norm of `fields`.
    Norm {
        table: String,
        fields: Vec<String>,
        output: String,
    },
    /// Registers two new tables, `kept` and `removed`, partitioning a prefix
    /// of `table` by `stride`.
    Subsample {
        table: String,
        stride: usize,
        #[serde(default)]
        prefix_fraction: Option<f64>,
        kept: String,
        removed: String,
    },
}

impl DerivedStep {
    pub fn table(&self) -> &str {
        match self {
            DerivedStep::LinearFit { table, .. }
            | DerivedStep::Norm { table, .. }
            | DerivedStep::Subsample { table, .. } => table,
        }
    }
}

/// Run one step against the experiment's tables.
pub fn apply_step(tables: &mut TableSet, step: &DerivedStep) -> Result<()> {
    match step {
        DerivedStep::LinearFit {
            table,
            x,
            output,
            slope,
            intercept,
        } => {
            let values = linear_fit(tables.get(table)?.field(x)?, *slope, *intercept);
            tables.get_mut(table)?.insert(output.clone(), values)?;
            debug!(table = %table, output = %output, slope, intercept, "derived linear fit");
        }
        DerivedStep::Norm {
            table,
            fields,
            output,
        } => {
            let source = tables.get(table)?;
            let inputs = fields
                .iter()
                .map(|f| source.field(f))
                .collect::<Result<Vec<_>>>()?;
            let values = norm(&inputs)?;
            tables.get_mut(table)?.insert(output.clone(), values)?;
            debug!(table = %table, output = %output, "derived norm");
        }
        DerivedStep::Subsample {
            table,
            stride,
            prefix_fraction,
            kept,
            removed,
        } => {
            let source = tables.get(table)?;
            let plan = Subsample::plan(source.len(), *stride, *prefix_fraction)?;
            let (kept_table, removed_table) = plan.apply(source, kept, removed)?;
            debug!(
                table = %table,
                window = plan.window,
                kept = kept_table.len(),
                removed = removed_table.len(),
                "derived sub-sample"
            );
            tables.add(kept_table)?;
            tables.add(removed_table)?;
        }
    }
    Ok(())
}
