use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML (created with commented defaults if missing)
    #[arg(long, default_value = "simplot.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run every experiment declared in a manifest
    Run {
        /// Experiment manifest (TOML)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        #[command(flatten)]
        dirs: RunArgs,
    },
    /// Run one built-in experiment
    Preset {
        /// Preset name (see `list`)
        #[arg(value_name = "NAME")]
        name: String,

        #[command(flatten)]
        dirs: RunArgs,
    },
    /// List the built-in experiments
    List,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Directory relative source paths are read from
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Directory figures are written to (overrides config)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Present every figure after writing it (overrides config)
    #[arg(long, default_value_t = false)]
    pub show: bool,

    /// Also write every loaded and derived table as CSV into this directory
    #[arg(long, value_name = "DIR")]
    pub export_tables: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_preset_with_dirs() {
        let args = Args::parse_from([
            "simplot", "preset", "lorenz", "--data-dir", "runs", "--out-dir", "figs", "--show",
        ]);
        assert_eq!(args.config, PathBuf::from("simplot.toml"));
        match args.command {
            Command::Preset { name, dirs } => {
                assert_eq!(name, "lorenz");
                assert_eq!(dirs.data_dir, PathBuf::from("runs"));
                assert_eq!(dirs.out_dir, Some(PathBuf::from("figs")));
                assert!(dirs.show);
                assert_eq!(dirs.export_tables, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn run_requires_a_manifest() {
        assert!(Args::try_parse_from(["simplot", "run"]).is_err());
        let args = Args::try_parse_from(["simplot", "--config", "c.toml", "run", "m.toml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("c.toml"));
        assert!(matches!(args.command, Command::Run { .. }));
    }

    #[test]
    fn export_tables_takes_a_directory() {
        let args = Args::parse_from(["simplot", "run", "m.toml", "--export-tables", "tables"]);
        match args.command {
            Command::Run { dirs, .. } => {
                assert_eq!(dirs.export_tables, Some(PathBuf::from("tables")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
