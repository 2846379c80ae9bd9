mod check;
mod config;
mod init;
mod list;
mod packs;
mod reset;
mod status;

pub use check::check_ledger;
pub use config::{reset_config, set_game_path, set_ledger_path, show_config};
pub use init::init_ledger;
pub use list::{list_mods, ListModsArgs};
pub use packs::list_mod_packs;
pub use reset::{reset_ledger, ResetLedgerArgs};
pub use status::{mod_status, ModStatusArgs};
