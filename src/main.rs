use anyhow::Context;
use clap::Parser;
use config::{delimiter_byte, Config, MissingFlagColumn};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod compute;
mod config;
mod data;
mod read;
mod sync;
mod write;

/// Sets the isCNCJ flag of every account of the PCG reference file from the
/// account numbers listed in the CNCJ reference file.
///
/// Without options both files are looked up in `prod-data/` next to the
/// executable.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// YAML configuration file; relative paths inside it are resolved against
    /// its own directory
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// The file to update in place
    #[arg(long)]
    target: Option<PathBuf>,
    /// The file listing the member account numbers
    #[arg(long)]
    membership: Option<PathBuf>,
    /// Account number column of the membership file
    #[arg(long)]
    key_column: Option<String>,
    /// Account code column of the target file
    #[arg(long)]
    code_column: Option<String>,
    /// Flag column of the target file
    #[arg(long)]
    flag_column: Option<String>,
    /// Field delimiter of both files
    #[arg(long)]
    delimiter: Option<char>,
    /// What to do when the target file has no flag column
    #[arg(long, value_enum)]
    missing_flag_column: Option<MissingFlagColumn>,
    /// Report what would change without writing anything
    #[arg(short = 'n', long)]
    dry_run: bool,
}

impl Cli {
    fn config(&self) -> anyhow::Result<Config> {
        let exe = std::env::current_exe().context("locating the executable")?;
        let base = exe.parent().map(PathBuf::from).unwrap_or_default();
        let mut config = Config::with_base_dir(&base);
        if let Some(path) = &self.config {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let dir = path.parent().map(PathBuf::from).unwrap_or_default();
            config = config
                .overlay_yaml(&text, &dir)
                .with_context(|| format!("loading {}", path.display()))?;
        }
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(membership) = &self.membership {
            config.membership = membership.clone();
        }
        if let Some(column) = &self.key_column {
            config.key_column = column.clone();
        }
        if let Some(column) = &self.code_column {
            config.code_column = column.clone();
        }
        if let Some(column) = &self.flag_column {
            config.flag_column = column.clone();
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter_byte(delimiter)?;
        }
        if let Some(missing) = self.missing_flag_column {
            config.missing_flag_column = missing;
        }
        Ok(config)
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<data::Error>()
        .map_or(1, data::Error::exit_code)
}

fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = cli
        .config()
        .and_then(|config| sync::run(&config, cli.dry_run));
    match result {
        Ok(summary) => {
            if summary.keys > 0 && summary.stats.flagged == 0 {
                warn!("none of the {} CNCJ accounts matched a code", summary.keys);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
