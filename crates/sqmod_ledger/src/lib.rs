//! Mod ledger and offset redirection for SqPack archives.
//!
//! Mods never modify the original archive data. Replacement data is appended to a
//! data container and the archive index entry for the affected path is pointed at
//! it. This crate keeps the record of those redirects (the ledger) and drives the
//! index writes that enable, disable and remove them:
//!
//! - **Status queries**: trust the ledger flag, or cross-check it against the live index
//! - **Toggles**: one path, a mod pack, all standalone mods, or everything
//! - **Soft deletion**: blank entries in place and reuse their slots later
//! - **Legacy migration**: point every path of an old line-based ledger back at its original data
//!
//! The archive index itself is reached through the [`OffsetIndex`] trait.
//!
//! # Example
//!
//! ```no_run
//! use sqmod_ledger::{LedgerStore, MemoryIndex, ModGroup, ModLedger};
//! use camino::Utf8Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = LedgerStore::for_game_dir(Utf8Path::new("C:/ffxiv/game/sqpack/ffxiv"))?;
//! let mut ledger = ModLedger::new(store, MemoryIndex::new()).with_progress(|progress| {
//!     println!("{}/{} {}", progress.current, progress.total, progress.path);
//! });
//!
//! ledger.toggle_group(&ModGroup::Standalone, false)?;
//! let (status, pack) = ledger.query_status("chara/human/c0101/skin.tex", true)?;
//! println!("{} ({:?})", status, pack);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod index;
pub mod legacy;
pub mod model;
pub mod path_hash;
pub mod store;

// Re-export main types
pub use engine::{ModGroup, ModLedger, ModStatus, ToggleProgress, STANDALONE_GROUP};
pub use error::{Error, ErrorKind, Result};
pub use index::{set_offset_mirrored, MemoryIndex, OffsetIndex};
pub use legacy::{LegacyLedgerReader, LegacyRecord};
pub use model::{
    normalize_path, ContainerId, Ledger, LedgerIssue, Mod, ModData, ModPack, ModPackRef,
    LEDGER_VERSION, TOOL_ADDED_SOURCE,
};
pub use path_hash::PathHash;
pub use store::{LedgerStore, LEDGER_FILE_NAME};

#[cfg(test)]
mod tests;
