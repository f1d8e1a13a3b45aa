//! One experiment, run start to finish: load, derive, render, persist.
//!
//! The stages must run in order. The first failure halts the pipeline and
//! every later call reports a `StageOrder` error naming where it stopped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::core::derive::{DerivedStep, apply_step};
use crate::core::loader::{load_table, load_with_header};
use crate::core::schema::{Delimiter, SchemaDescriptor};
use crate::core::table::{SeriesTable, TableSet};
use crate::error::{Error, Result};
use crate::plot::figure::Figure;
use crate::plot::render::render_figure;
use crate::plot::spec::FigureSpec;
use crate::sink::OutputSink;

/// A data file loaded as one named table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub path: PathBuf,
    /// Column layout; when absent, the first line of the file names the
    /// columns.
    #[serde(default)]
    pub schema: Option<SchemaDescriptor>,
    /// Delimiter used with a header-derived schema.
    #[serde(default)]
    pub delimiter: Delimiter,
}

impl Source {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, schema: SchemaDescriptor) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            schema: Some(schema),
            delimiter: Delimiter::Whitespace,
        }
    }

    /// A source whose first line holds the field names.
    pub fn with_header(name: impl Into<String>, path: impl Into<PathBuf>, delimiter: Delimiter) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            schema: None,
            delimiter,
        }
    }

    pub fn load(&self) -> Result<SeriesTable> {
        match &self.schema {
            Some(schema) => load_table(&self.name, &self.path, schema),
            None => load_with_header(&self.name, &self.path, self.delimiter),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Experiment {
    pub name: String,
    pub sources: Vec<Source>,
    pub derive: Vec<DerivedStep>,
    pub figures: Vec<FigureSpec>,
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
            derive: Vec::new(),
            figures: Vec::new(),
        }
    }

    pub fn source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    pub fn derive(mut self, step: DerivedStep) -> Self {
        self.derive.push(step);
        self
    }

    pub fn figure(mut self, figure: impl Into<FigureSpec>) -> Self {
        self.figures.push(figure.into());
        self
    }
}

fn load_sources(sources: &[Source]) -> Result<TableSet> {
    let mut tables = TableSet::new();
    for source in sources {
        tables.add(source.load()?)?;
    }
    Ok(tables)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Configured,
    Loaded,
    Derived,
    Rendered,
    Persisted,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Configured => "configured",
            Stage::Loaded => "loaded",
            Stage::Derived => "derived",
            Stage::Rendered => "rendered",
            Stage::Persisted => "persisted",
        }
    }
}

/// Outcome of a full run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub experiment: String,
    pub figures: usize,
    pub written: Vec<PathBuf>,
    pub shown: usize,
}

pub struct Pipeline {
    experiment: Experiment,
    stage: Stage,
    tables: TableSet,
    figures: Vec<Figure>,
    failed_at: Option<Stage>,
}

impl Pipeline {
    pub fn new(experiment: Experiment) -> Self {
        Self {
            experiment,
            stage: Stage::Configured,
            tables: TableSet::new(),
            figures: Vec::new(),
            failed_at: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The stage whose work failed, if any. The pipeline stays in the last
    /// stage it completed.
    pub fn failed_at(&self) -> Option<Stage> {
        self.failed_at
    }

    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    fn require_stage(&self, allowed: &[Stage], target: Stage) -> Result<()> {
        if let Some(failed) = self.failed_at {
            return Err(Error::StageOrder {
                expected: target.name(),
                actual: failed.name(),
            });
        }
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(Error::StageOrder {
                expected: target.name(),
                actual: self.stage.name(),
            })
        }
    }

    fn finish<T>(&mut self, target: Stage, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {
                self.stage = target;
                info!(experiment = %self.experiment.name, stage = target.name(), "stage complete");
            }
            Err(err) => {
                self.failed_at = Some(target);
                error!(experiment = %self.experiment.name, stage = target.name(), %err, "stage failed");
            }
        }
        result
    }

    /// Read every source. Either all tables load or none are kept.
    pub fn load(&mut self) -> Result<()> {
        self.require_stage(&[Stage::Configured], Stage::Loaded)?;
        let loaded = load_sources(&self.experiment.sources);
        let tables = self.finish(Stage::Loaded, loaded)?;
        self.tables = tables;
        Ok(())
    }

    pub fn derive(&mut self) -> Result<()> {
        self.require_stage(&[Stage::Loaded], Stage::Derived)?;
        let mut tables = self.tables.clone();
        let derived = self
            .experiment
            .derive
            .iter()
            .try_for_each(|step| apply_step(&mut tables, step));
        self.finish(Stage::Derived, derived)?;
        self.tables = tables;
        Ok(())
    }

    /// Render every figure; nothing is kept unless all of them succeed.
    /// Derivation is optional, so this runs after either `load` or `derive`.
    pub fn render(&mut self) -> Result<&[Figure]> {
        self.require_stage(&[Stage::Loaded, Stage::Derived], Stage::Rendered)?;
        let rendered = self
            .experiment
            .figures
            .iter()
            .map(|spec| render_figure(spec, &self.tables))
            .collect::<Result<Vec<_>>>();
        self.figures = self.finish(Stage::Rendered, rendered)?;
        Ok(&self.figures)
    }

    pub fn persist(&mut self, sink: &mut OutputSink) -> Result<RunReport> {
        self.require_stage(&[Stage::Rendered], Stage::Persisted)?;
        let mut report = RunReport {
            experiment: self.experiment.name.clone(),
            figures: self.figures.len(),
            ..RunReport::default()
        };
        let emitted = self.figures.iter().try_for_each(|figure| {
            let out = sink.emit(figure)?;
            report.written.extend(out.path);
            report.shown += usize::from(out.shown);
            Ok::<(), Error>(())
        });
        self.finish(Stage::Persisted, emitted)?;
        Ok(report)
    }

    /// Write every table, derived ones included, to `dir` as
    /// `<experiment>.<table>.csv`. Needs at least the derived stage.
    pub fn export_tables(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.require_stage(&[Stage::Derived, Stage::Rendered, Stage::Persisted], Stage::Derived)?;
        fs::create_dir_all(dir).map_err(|e| Error::write_failure(dir, e))?;
        let mut written = Vec::with_capacity(self.tables.len());
        for table in self.tables.iter() {
            let path = dir.join(format!("{}.{}.csv", self.experiment.name, table.name()));
            fs::write(&path, table.to_csv()).map_err(|e| Error::write_failure(&path, e))?;
            debug!(path = %path.display(), rows = table.len(), "exported table");
            written.push(path);
        }
        Ok(written)
    }

    /// Every stage in order; the first error halts the run.
    pub fn run(&mut self, sink: &mut OutputSink) -> Result<RunReport> {
        self.load()?;
        self.derive()?;
        self.render()?;
        self.persist(sink)
    }
}
