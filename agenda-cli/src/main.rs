mod commands;
mod config;
mod date_range;
mod render;
mod sources;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::AgendaConfig;
use date_range::{DateRange, DayWindow};
use sources::Loader;

#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "Find overlaps and free time across agendas and calendar exports")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Days to cover. `free` searches every day in the range. For all commands
/// the range also limits which instances of recurring .ics events are read;
/// agenda text files and one-off events are used in full.
#[derive(Args)]
struct RangeArgs {
    /// First day (YYYY-MM-DD or MM/DD/YYYY, defaults to today)
    #[arg(long)]
    from: Option<String>,

    /// Last day (YYYY-MM-DD or MM/DD/YYYY, defaults to `default_days` from the first)
    #[arg(long)]
    to: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print intervals grouped by day
    ///
    /// --from/--to only bound recurring .ics events; text agendas are shown in full.
    Show {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        range: RangeArgs,
    },
    /// Merge overlapping intervals into a sorted, disjoint list
    ///
    /// --from/--to only bound recurring .ics events; text agendas are read in full.
    Normalize {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long)]
        json: bool,
    },
    /// Print the overlap of two agendas
    ///
    /// --from/--to only bound recurring .ics events; text agendas are read in full.
    Intersect {
        left: PathBuf,
        right: PathBuf,

        /// Label every result with this text instead of the left-hand label
        #[arg(long)]
        label: Option<String>,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long)]
        json: bool,
    },
    /// Find free time in each day of a date range
    Free {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        range: RangeArgs,

        /// Time of day to search, e.g. "09:00-17:00" or "9am-5pm"
        #[arg(short, long)]
        window: Option<String>,

        /// Label for free blocks
        #[arg(long)]
        label: Option<String>,

        /// Calendar event UID that should not count as busy
        #[arg(long = "ignore", value_name = "UID")]
        ignore: Vec<String>,

        /// Also list the busy blocks
        #[arg(long)]
        show_busy: bool,

        #[arg(long)]
        json: bool,
    },
    /// Show the configuration in use
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AgendaConfig::load()?;

    match cli.command {
        Commands::Show { files, range } => {
            let range = resolve_range(&range, &config)?;
            let loader = Loader::new(&config, &range, &[])?;
            commands::show::run(loader.load_all(&files)?)
        }
        Commands::Normalize { files, range, json } => {
            let range = resolve_range(&range, &config)?;
            let loader = Loader::new(&config, &range, &[])?;
            commands::normalize::run(loader.load_merged(&files)?, json)
        }
        Commands::Intersect {
            left,
            right,
            label,
            range,
            json,
        } => {
            let range = resolve_range(&range, &config)?;
            let loader = Loader::new(&config, &range, &[])?;
            let left = loader.load(&left)?.intervals;
            let right = loader.load(&right)?.intervals;
            commands::intersect::run(&left, &right, label.as_deref(), json)
        }
        Commands::Free {
            files,
            range,
            window,
            label,
            ignore,
            show_busy,
            json,
        } => {
            let range = resolve_range(&range, &config)?;
            let window = match window.as_deref() {
                Some(spec) => DayWindow::parse(spec)?,
                None => config.window()?,
            };
            let label = label.as_deref().unwrap_or(&config.free_label);

            let loader = Loader::new(&config, &range, &ignore)?;
            let busy = loader.load_merged(&files)?;
            commands::free::run(&busy, &range, &window, label, show_busy, json)
        }
        Commands::Config => commands::config::run(&config),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_range(args: &RangeArgs, config: &AgendaConfig) -> Result<DateRange> {
    DateRange::from_args(args.from.as_deref(), args.to.as_deref(), config.default_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_range_help_says_text_agendas_are_not_filtered() {
        let mut cli = Cli::command();
        for name in ["show", "normalize", "intersect"] {
            let sub = cli.find_subcommand_mut(name).unwrap();
            let help = sub.render_long_help().to_string();
            assert!(help.contains("only bound recurring .ics events"), "{name}: {help}");
        }
    }

    #[test]
    fn test_free_flags_parse() {
        let cli = Cli::try_parse_from([
            "agenda", "free", "me.agenda", "--from", "2017-11-16", "--window", "9am-5pm",
            "--ignore", "abc", "--ignore", "def", "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Free {
                range,
                window,
                ignore,
                ..
            } => {
                assert_eq!(range.from.as_deref(), Some("2017-11-16"));
                assert_eq!(window.as_deref(), Some("9am-5pm"));
                assert_eq!(ignore, ["abc", "def"]);
            }
            _ => panic!("expected free"),
        }
    }
}
