use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("No ledger location configured")]
    #[diagnostic(
        code(config::ledger_path_unset),
        help("Run 'sqpack-mod config set-game-path <dir>' with the game/sqpack/ffxiv directory, or pass --ledger <file>")
    )]
    LedgerPathUnset,

    #[error("Invalid game path: {path}")]
    #[diagnostic(
        code(config::invalid_game_path),
        help("The path must be the archive directory of an installation, e.g. C:\\Games\\FINAL FANTASY XIV\\game\\sqpack\\ffxiv")
    )]
    InvalidGamePath { path: Utf8PathBuf },

    #[error("Ledger not found: {path}")]
    #[diagnostic(
        code(ledger::not_found),
        help("Run 'sqpack-mod init' to create an empty ledger")
    )]
    LedgerNotFound { path: Utf8PathBuf },

    #[error("{source}")]
    #[diagnostic(
        code(ledger::entry_not_found),
        help("Run 'sqpack-mod list' for recorded entries and 'sqpack-mod packs' for mod packs")
    )]
    EntryNotFound {
        #[source]
        source: sqmod_ledger::Error,
    },

    #[error("Ledger has {count} consistency issue(s)")]
    #[diagnostic(
        code(ledger::inconsistent),
        help("The counters or entries were edited outside of a mod manager. Re-import the affected mod packs or reset the ledger")
    )]
    LedgerIssues { count: usize },

    #[error("Ledger operation failed")]
    #[diagnostic(code(ledger::operation_failed))]
    Ledger {
        #[source]
        source: sqmod_ledger::Error,
    },

    #[error("Failed to save configuration")]
    #[diagnostic(
        code(config::save_failed),
        help("Check that the directory of the executable is writable")
    )]
    ConfigSaveFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt failed")]
    #[diagnostic(code(prompt::failed))]
    Prompt {
        #[from]
        source: inquire::InquireError,
    },
}

impl From<sqmod_ledger::Error> for CliError {
    fn from(source: sqmod_ledger::Error) -> Self {
        match source {
            sqmod_ledger::Error::LedgerNotFound(path) => Self::LedgerNotFound { path },
            source if source.is_not_found() => Self::EntryNotFound { source },
            source => Self::Ledger { source },
        }
    }
}

impl CliError {
    pub fn invalid_game_path(path: Utf8PathBuf) -> Self {
        Self::InvalidGamePath { path }
    }

    pub fn config_save_failed(source: std::io::Error) -> Self {
        Self::ConfigSaveFailed { source }
    }
}
