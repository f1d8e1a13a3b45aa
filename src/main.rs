// Entry point: resolves experiments from a manifest or a preset and runs
// each pipeline to completion.
mod cli;

use std::error::Error;
use std::io;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use simplot::battery::{self, PRESETS};
use simplot::config::{Manifest, RenderConfig};
use simplot::pipeline::{Experiment, Pipeline};
use simplot::sink::OutputSink;

use cli::{Args, Command, RunArgs};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut cfg = RenderConfig::load_or_default(&args.config);

    let (experiments, dirs) = match args.command {
        Command::List => {
            for name in PRESETS {
                println!("{name}");
            }
            return Ok(());
        }
        Command::Run { manifest, dirs } => {
            apply_overrides(&mut cfg, &dirs);
            let experiments = Manifest::load(&manifest)?.into_experiments(
                &cfg,
                &dirs.data_dir,
                &cfg.output.dir,
            );
            (experiments, dirs)
        }
        Command::Preset { name, dirs } => {
            apply_overrides(&mut cfg, &dirs);
            let experiment = battery::preset(&name, &cfg, &dirs.data_dir, &cfg.output.dir)?;
            (vec![experiment], dirs)
        }
    };

    info!(
        experiments = experiments.len(),
        data_dir = %dirs.data_dir.display(),
        out_dir = %cfg.output.dir.display(),
        "starting"
    );
    run_all(experiments, &cfg, &dirs)
}

fn apply_overrides(cfg: &mut RenderConfig, dirs: &RunArgs) {
    if let Some(out_dir) = &dirs.out_dir {
        cfg.output.dir = out_dir.clone();
    }
    if dirs.show {
        cfg.output.show = true;
    }
}

/// Experiments are independent: a failing one is reported and the rest
/// still run.
fn run_all(experiments: Vec<Experiment>, cfg: &RenderConfig, dirs: &RunArgs) -> Result<(), Box<dyn Error>> {
    let needs_presenter = experiments
        .iter()
        .flat_map(|e| &e.figures)
        .any(|f| f.output.show);
    let mut sink = if needs_presenter {
        OutputSink::new(cfg.text.clone())
    } else {
        OutputSink::headless(cfg.text.clone())
    };

    let mut failed = Vec::new();
    for experiment in experiments {
        let name = experiment.name.clone();
        let mut pipeline = Pipeline::new(experiment);
        let run = pipeline.run(&mut sink).and_then(|report| {
            let tables = match &dirs.export_tables {
                Some(dir) => pipeline.export_tables(dir)?,
                None => Vec::new(),
            };
            Ok((report, tables))
        });
        match run {
            Ok((report, tables)) => {
                for path in report.written.iter().chain(&tables) {
                    println!("{}", path.display());
                }
                info!(experiment = %name, figures = report.figures, shown = report.shown, "done");
            }
            Err(err) => {
                let stage = pipeline.failed_at().map(|s| s.name()).unwrap_or("export");
                error!(experiment = %name, stage, data_dir = %dirs.data_dir.display(), "{err}");
                failed.push(name);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} experiment(s) failed: {}", failed.len(), failed.join(", ")).into())
    }
}
