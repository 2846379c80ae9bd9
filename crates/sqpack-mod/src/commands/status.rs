use crate::errors::CliError;
use crate::println_pad;
use crate::utils::open_store;
use colored::Colorize;
use sqmod_ledger::{MemoryIndex, ModLedger, ModStatus};

pub struct ModStatusArgs {
    pub ledger: Option<String>,
    pub path: String,
}

pub fn mod_status(args: ModStatusArgs) -> miette::Result<()> {
    let store = open_store(args.ledger.as_deref())?;
    // No archive index is attached, so the ledger flag is trusted.
    let mut ledger = ModLedger::new(store, MemoryIndex::new());
    let (status, pack) = ledger
        .query_status(&args.path, false)
        .map_err(CliError::from)?;

    let status_text = match status {
        ModStatus::Original => status.to_string().bright_white(),
        ModStatus::Enabled => status.to_string().bright_green(),
        ModStatus::Disabled => status.to_string().bright_red(),
    };

    println_pad!(
        "{} {}",
        "Path:".bright_white().bold(),
        args.path.bright_cyan()
    );
    println_pad!("{} {}", "Status:".bright_white().bold(), status_text.bold());
    if status != ModStatus::Original {
        println_pad!(
            "{} {}",
            "Mod pack:".bright_white().bold(),
            pack.as_deref().unwrap_or("(standalone)")
        );
    }

    Ok(())
}
