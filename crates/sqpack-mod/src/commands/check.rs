use crate::errors::CliError;
use crate::println_pad;
use crate::utils::open_store;
use colored::Colorize;

pub fn check_ledger(ledger: Option<&str>) -> miette::Result<()> {
    let mut store = open_store(ledger)?;
    let ledger = store.load().map_err(CliError::from)?;

    println_pad!(
        "{} {} {}",
        "🔍 Checking".bright_blue().bold(),
        store.path().as_str().bright_white(),
        format!(
            "(version {}, {} active, {} empty, {} packs)",
            ledger.schema_version,
            ledger.active_mod_count,
            ledger.empty_mod_slot_count,
            ledger.mod_pack_count
        )
        .dimmed()
    );

    if !ledger.is_supported_version() {
        println_pad!(
            "   {} unsupported schema version {}",
            "!".bright_yellow(),
            ledger.schema_version
        );
    }

    let issues = ledger.verify();
    if issues.is_empty() {
        println_pad!("{}", "✓ Ledger is consistent".bright_green().bold());
        return Ok(());
    }

    for issue in &issues {
        println_pad!("   {} {}", "✗".bright_red(), issue);
    }
    Err(CliError::LedgerIssues {
        count: issues.len(),
    }
    .into())
}
