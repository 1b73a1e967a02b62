//! fattrace CLI

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fattrace::config::{self, CliOverrides};
use fattrace::{ColorChoice, Snapshot};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fattrace")]
#[command(version, about = "Render a captured failure snapshot with every frame's locals")]
struct Args {
    /// Snapshot file (JSON) to render
    snapshot: PathBuf,

    /// Number of sequence elements shown before truncation
    #[arg(long)]
    threshold: Option<usize>,

    /// Do not expand the attributes of `self`
    #[arg(long)]
    no_self: bool,

    /// Variable names to skip (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ignore: Vec<String>,

    /// Type names to skip (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ignore_type: Vec<String>,

    /// Show names starting with `__`
    #[arg(long)]
    include_private: bool,

    /// Exit with status 1 after rendering
    #[arg(long)]
    exit: bool,

    /// When to colorize output
    #[arg(long, value_enum)]
    color: Option<ColorArg>,

    /// Config file to use instead of searching for fattrace.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore fattrace.toml configuration
    #[arg(long, conflicts_with = "config")]
    no_config: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => ColorChoice::Auto,
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init()
        .ok();

    let config = if args.no_config {
        None
    } else {
        config::load_config(args.config.as_deref())?
    };

    let overrides = CliOverrides {
        threshold: args.threshold,
        no_self: args.no_self,
        include_private: args.include_private,
        ignore: args.ignore,
        ignore_type: args.ignore_type,
        color: args.color.map(Into::into),
        exit: args.exit,
    };
    let options = config::merge_config(config.as_ref(), &overrides);
    log::debug!("render options: {:?}", options);

    let snapshot = Snapshot::load(&args.snapshot)
        .with_context(|| format!("could not load {}", args.snapshot.display()))?;
    log::debug!("rendering {} frame(s)", snapshot.frames.len());

    fattrace::format(&snapshot, &options);
    Ok(())
}
