use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    check_ledger, init_ledger, list_mod_packs, list_mods, mod_status, reset_config, reset_ledger,
    set_game_path, set_ledger_path, show_config, ListModsArgs, ModStatusArgs, ResetLedgerArgs,
};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Ledger file to use instead of the configured one
    #[arg(long, global = true)]
    ledger: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty ledger if none exists
    Init,
    /// List active mod entries
    List {
        /// Only show entries installed with this mod pack
        #[arg(short, long, conflicts_with = "standalone")]
        pack: Option<String>,

        /// Only show entries that belong to no mod pack
        #[arg(short, long)]
        standalone: bool,
    },
    /// List mod packs and how many of their entries are enabled
    Packs,
    /// Show whether a mod is enabled for an archive path
    Status {
        /// Archive path, e.g. chara/human/c0101/obj/body/b0001/texture/c0101b0001_d.tex
        path: String,
    },
    /// Verify the ledger counters and entries
    Check,
    /// Delete the ledger file
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the configuration and the ledger it resolves to
    Show,
    /// Set the sqpack/ffxiv directory of the installation
    SetGamePath { path: String },
    /// Use an explicit ledger file
    SetLedgerPath { path: String },
    /// Restore the default configuration
    Reset,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sqpack_mod=info,sqmod_ledger=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let args = parse_args();
    let ledger = args.ledger;

    match args.command {
        Commands::Init => init_ledger(ledger.as_deref()),
        Commands::List { pack, standalone } => list_mods(ListModsArgs {
            ledger,
            pack,
            standalone,
        }),
        Commands::Packs => list_mod_packs(ledger.as_deref()),
        Commands::Status { path } => mod_status(ModStatusArgs { ledger, path }),
        Commands::Check => check_ledger(ledger.as_deref()),
        Commands::Reset { yes } => reset_ledger(ResetLedgerArgs { ledger, yes }),
        Commands::Config { action } => match action {
            ConfigCommands::Show => show_config(ledger.as_deref()),
            ConfigCommands::SetGamePath { path } => set_game_path(path),
            ConfigCommands::SetLedgerPath { path } => set_ledger_path(path),
            ConfigCommands::Reset => reset_config(),
        },
    }
}
