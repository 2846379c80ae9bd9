use crate::errors::CliError;
use crate::println_pad;
use crate::utils::open_store;
use colored::Colorize;
use inquire::Confirm;

pub struct ResetLedgerArgs {
    pub ledger: Option<String>,
    pub yes: bool,
}

pub fn reset_ledger(args: ResetLedgerArgs) -> miette::Result<()> {
    let mut store = open_store(args.ledger.as_deref())?;

    if !store.exists() {
        println_pad!(
            "{} {}",
            "No ledger at".bright_yellow(),
            store.path().as_str().bright_white()
        );
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::new(&format!("Delete the ledger at {}?", store.path()))
            .with_default(false)
            .with_help_message("Mod data stays in the archive, but the record of it is lost")
            .prompt()
            .map_err(CliError::from)?;
        if !confirmed {
            println_pad!("{}", "Aborted".bright_yellow());
            return Ok(());
        }
    }

    store.reset().map_err(CliError::from)?;
    println_pad!(
        "{} {}",
        "✓ Deleted ledger".bright_green().bold(),
        store.path().as_str().bright_white()
    );

    Ok(())
}
