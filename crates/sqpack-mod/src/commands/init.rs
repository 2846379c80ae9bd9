use crate::errors::CliError;
use crate::println_pad;
use crate::utils::open_store;
use colored::Colorize;

pub fn init_ledger(ledger: Option<&str>) -> miette::Result<()> {
    let mut store = open_store(ledger)?;

    if store.create().map_err(CliError::from)? {
        println_pad!(
            "{} {}",
            "✓ Created empty ledger:".bright_green().bold(),
            store.path().as_str().bright_white()
        );
    } else {
        println_pad!(
            "{} {}",
            "Ledger already exists:".bright_yellow(),
            store.path().as_str().bright_white()
        );
    }

    Ok(())
}
