use crate::errors::CliError;
use camino::{Utf8Path, Utf8PathBuf};
use sqmod_ledger::LedgerStore;

pub mod config;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// Whether `path` looks like the archive directory of an installation (`.../sqpack/ffxiv`).
pub fn is_valid_game_path(path: &Utf8Path) -> bool {
    path.as_std_path().is_dir()
        && path.file_name() == Some("ffxiv")
        && path.parent().and_then(Utf8Path::file_name) == Some("sqpack")
}

/// Pick the ledger file: the `--ledger` flag, then the configured ledger path,
/// then the canonical ledger of the configured game directory.
pub fn resolve_ledger_path(
    flag: Option<&str>,
    cfg: &config::AppConfig,
) -> Result<Utf8PathBuf, CliError> {
    if let Some(path) = flag {
        return Ok(Utf8PathBuf::from(path));
    }
    if let Some(path) = &cfg.ledger_path {
        return Ok(path.clone());
    }
    match &cfg.game_path {
        Some(game_path) => LedgerStore::for_game_dir(game_path)
            .map(|store| store.path().to_path_buf())
            .map_err(|_| CliError::invalid_game_path(game_path.clone())),
        None => Err(CliError::LedgerPathUnset),
    }
}

/// Open the ledger store selected by `flag` and the saved configuration.
pub fn open_store(flag: Option<&str>) -> Result<LedgerStore, CliError> {
    let cfg = config::load_config();
    let path = resolve_ledger_path(flag, &cfg)?;
    tracing::debug!("Using ledger {}", path);
    Ok(LedgerStore::new(path))
}
