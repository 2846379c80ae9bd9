use crate::errors::CliError;
use crate::println_pad;
use crate::utils::open_store;
use colored::Colorize;

pub fn list_mod_packs(ledger: Option<&str>) -> miette::Result<()> {
    let mut store = open_store(ledger)?;
    let ledger = store.load().map_err(CliError::from)?;

    println_pad!(
        "{} {}",
        "📦 Mod packs".bright_blue().bold(),
        format!("({})", ledger.mod_packs.len()).dimmed()
    );

    for pack in &ledger.mod_packs {
        let members = ledger.pack_members(&pack.name).count();
        let enabled = ledger
            .pack_members(&pack.name)
            .filter(|m| m.enabled)
            .count();

        println_pad!(
            "   {} {} {}",
            "•".bright_cyan(),
            pack.name.bright_cyan().bold(),
            format!("v{} by {}", pack.version, pack.author).dimmed()
        );
        println_pad!(
            "     {} {}/{} enabled",
            "Entries:".bright_white(),
            enabled,
            members
        );
        if !pack.url.is_empty() {
            println_pad!("     {} {}", "Url:".bright_white(), pack.url);
        }
    }

    let standalone = ledger.active_mods().filter(|m| m.is_standalone()).count();
    println_pad!(
        "\n{} {}",
        "Standalone entries:".bright_white(),
        standalone
    );

    Ok(())
}
