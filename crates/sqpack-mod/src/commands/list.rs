use crate::errors::CliError;
use crate::println_pad;
use crate::utils::open_store;
use colored::Colorize;
use sqmod_ledger::{Mod, ModGroup};

pub struct ListModsArgs {
    pub ledger: Option<String>,
    pub pack: Option<String>,
    pub standalone: bool,
}

pub fn list_mods(args: ListModsArgs) -> miette::Result<()> {
    let mut store = open_store(args.ledger.as_deref())?;
    let ledger = store.load().map_err(CliError::from)?;

    let group = match (args.pack, args.standalone) {
        (Some(name), _) => Some(ModGroup::Pack(name)),
        (None, true) => Some(ModGroup::Standalone),
        (None, false) => None,
    };

    let entries: Vec<&Mod> = ledger
        .active_mods()
        .filter(|m| group.as_ref().map_or(true, |g| g.contains(m)))
        .collect();

    match &group {
        Some(group) => println_pad!(
            "{} {} {}",
            "📋 Mods in".bright_blue().bold(),
            group.to_string().bright_cyan().bold(),
            format!("({})", entries.len()).dimmed()
        ),
        None => println_pad!(
            "{} {}",
            "📋 Active mods".bright_blue().bold(),
            format!("({})", entries.len()).dimmed()
        ),
    }

    for entry in entries {
        let state = if entry.enabled {
            "enabled ".bright_green()
        } else {
            "disabled".bright_red()
        };
        let owner = entry.pack_name().unwrap_or("standalone");
        println_pad!(
            "   {} {} {} {}",
            state,
            entry.full_path.bright_white(),
            entry.name.bright_cyan(),
            format!("[{}, {}]", owner, entry.container_id).dimmed()
        );
    }

    Ok(())
}
