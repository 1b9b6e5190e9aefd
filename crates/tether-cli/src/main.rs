#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::PathBuf;
use tether_core::config::DEFAULT_CONFIG_FILE;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tether: typed content relationships in SQLite join tables",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Path to the relationship config file.
    #[arg(long, global = true, env = "TETHER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create join tables for configured relationships",
        after_help = "EXAMPLES:\n    # Create the database and every category table\n    tether init\n\n    # Use another config file\n    tether --config site/tether.toml init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "List configured relationships",
        after_help = "EXAMPLES:\n    tether relationships\n    tether relationships --json"
    )]
    Relationships(cmd::relationships::RelationshipsArgs),

    #[command(
        next_help_heading = "Setup",
        about = "List created join tables",
        after_help = "EXAMPLES:\n    tether tables --json"
    )]
    Tables(cmd::tables::TablesArgs),

    #[command(
        next_help_heading = "Write",
        about = "Link two entities",
        after_help = "EXAMPLES:\n    # Link car 1 to tire 10\n    tether add related-tires 1 10\n\n    # Pick one of several same-name relationships\n    tether add same-name 1 11 --from-type post:car"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Write",
        about = "Unlink two entities",
        after_help = "EXAMPLES:\n    tether rm related-tires 1 10"
    )]
    Rm(cmd::rm::RmArgs),

    #[command(
        next_help_heading = "Write",
        about = "Replace every link of a source entity",
        after_help = "EXAMPLES:\n    # Make tires 12, 10, 11 (in that order) the links of car 1\n    tether replace related-tires 1 12 10 11\n\n    # Clear car 1\n    tether replace related-tires 1"
    )]
    Replace(cmd::replace::ReplaceArgs),

    #[command(
        next_help_heading = "Write",
        about = "Reorder the links of a source entity",
        after_help = "EXAMPLES:\n    tether reorder gallery 7 30 10 20"
    )]
    Reorder(cmd::reorder::ReorderArgs),

    #[command(
        next_help_heading = "Write",
        about = "Remove every link of a deleted entity",
        after_help = "EXAMPLES:\n    tether purge post:car 1\n    tether purge user:author 42"
    )]
    Purge(cmd::purge::PurgeArgs),

    #[command(
        next_help_heading = "Read",
        about = "IDs related through one relationship",
        after_help = "EXAMPLES:\n    # Tires linked from car 1\n    tether related related-tires 1\n\n    # Cars linking to tire 10\n    tether related related-tires 10 --direction to"
    )]
    Related(cmd::related::RelatedArgs),

    #[command(
        name = "by-name",
        next_help_heading = "Read",
        about = "IDs related through every relationship with a name",
        after_help = "EXAMPLES:\n    tether by-name related-tires 1 --as post:car\n    tether by-name same-name 1 --as car --as tire --json"
    )]
    ByName(cmd::by_name::ByNameArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TETHER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "tether=debug,info"
        } else {
            "tether=info,warn"
        })
    });

    let format = env::var("TETHER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays parseable in --json mode.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }
    debug!(config = %cli.config.display(), "using config");

    let output = OutputMode::from_json_flag(cli.json);
    let config = cli.config.as_path();

    let command_result = match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, config),
        Commands::Relationships(args) => {
            cmd::relationships::run_relationships(args, output, config)
        }
        Commands::Tables(args) => cmd::tables::run_tables(args, output, config),
        Commands::Add(args) => cmd::add::run_add(args, output, config),
        Commands::Rm(args) => cmd::rm::run_rm(args, output, config),
        Commands::Replace(args) => cmd::replace::run_replace(args, output, config),
        Commands::Reorder(args) => cmd::reorder::run_reorder(args, output, config),
        Commands::Purge(args) => cmd::purge::run_purge(args, output, config),
        Commands::Related(args) => cmd::related::run_related(args, output, config),
        Commands::ByName(args) => cmd::by_name::run_by_name(args, output, config),
    };

    if let Err(err) = command_result {
        render_error(output, &CliError::from(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
