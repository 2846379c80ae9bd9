use crate::errors::CliError;
use crate::utils::config::{self, AppConfig};
use crate::utils::{is_valid_game_path, resolve_ledger_path};
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::Result;

fn update_config(update: impl FnOnce(&mut AppConfig)) -> Result<()> {
    let mut cfg = config::load_config();
    update(&mut cfg);
    config::save_config(&cfg).map_err(|e| CliError::config_save_failed(e).into())
}

/// Print a config path entry with status indicator
fn print_path_config(
    name: &str,
    path: Option<&Utf8PathBuf>,
    validator: impl Fn(&Utf8PathBuf) -> bool,
) {
    match path {
        Some(p) => {
            let status = if validator(p) {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", format!("{}:", name).bright_white(), p, status);
        }
        None => {
            println!(
                "  {} {}",
                format!("{}:", name).bright_white(),
                "(not set)".bright_yellow()
            );
        }
    }
}

pub fn show_config(ledger: Option<&str>) -> Result<()> {
    let cfg = config::load_config();
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    print_path_config("game_path", cfg.game_path.as_ref(), |p| {
        is_valid_game_path(p)
    });
    print_path_config("ledger_path", cfg.ledger_path.as_ref(), |p| {
        p.as_std_path().is_file()
    });

    match resolve_ledger_path(ledger, &cfg) {
        Ok(path) => print_path_config("effective_ledger", Some(&path), |p| {
            p.as_std_path().is_file()
        }),
        Err(_) => print_path_config("effective_ledger", None, |_| false),
    }

    println!();
    Ok(())
}

pub fn set_game_path(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    if !is_valid_game_path(&path) {
        eprintln!(
            "  {}",
            "The path must point to the sqpack/ffxiv directory of the installation.".bright_yellow()
        );
        eprintln!(
            "  {}",
            "Example: C:\\Program Files (x86)\\SquareEnix\\FINAL FANTASY XIV - A Realm Reborn\\game\\sqpack\\ffxiv"
                .bright_yellow()
        );
        return Err(CliError::invalid_game_path(path).into());
    }

    update_config(|cfg| cfg.game_path = Some(path.clone()))?;

    println!("{}", "✓ Game path set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );

    Ok(())
}

pub fn set_ledger_path(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    update_config(|cfg| cfg.ledger_path = Some(path.clone()))?;

    println!("{}", "✓ Ledger path set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );
    if !path.as_std_path().is_file() {
        println!();
        println!(
            "  {}",
            "The file does not exist yet. Run 'sqpack-mod init' to create it.".bright_cyan()
        );
    }

    Ok(())
}

pub fn reset_config() -> Result<()> {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    config::save_config(&AppConfig::default()).map_err(CliError::config_save_failed)?;

    println!(
        "{}",
        "✓ Configuration reset to defaults".bright_green().bold()
    );
    println!();
    println!("  {} {}", "Config file:".bright_white().bold(), config_path);
    println!();
    println!(
        "  {}",
        "Run 'sqpack-mod config set-game-path <dir>' to point at your installation".bright_cyan()
    );

    Ok(())
}
