//! The persisted ledger document.
//!
//! A [`Ledger`] records every mod redirect and every mod pack known to an
//! installation. It is stored as a single JSON document whose field names match
//! ledger files written by earlier tools, so existing files load unchanged:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "modCount": 1,
//!   "modPackCount": 0,
//!   "emptyCount": 0,
//!   "ModPacks": [],
//!   "Mods": [
//!     {
//!       "source": "MyTool",
//!       "name": "Body",
//!       "category": "Body",
//!       "fullPath": "chara/human/c0101/obj/body/b0001/texture/c0101b0001_d.tex",
//!       "datFile": "040000",
//!       "enabled": true,
//!       "modPack": null,
//!       "data": { "dataType": 4, "originalOffset": 100, "modOffset": 200, "modSize": 0 }
//!     }
//!   ]
//! }
//! ```
//!
//! Entries are never removed from `Mods`. Deleting a mod blanks it in place
//! ([`Mod::blank`]) and the slot is reused by the next [`Ledger::insert_mod`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Schema version written into new ledgers.
pub const LEDGER_VERSION: &str = "1.0";

/// `source` value marking files that exist in the archive only because a mod added them.
pub const TOOL_ADDED_SOURCE: &str = "FilesAddedByTexTools";

/// Normalize an archive path to forward slashes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Identifies the data container (dat file) an entry lives in, e.g. `"040000"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A named group of mods installed together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModPack {
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub url: String,
}

/// Reference from a [`Mod`] to the [`ModPack`] it was installed with.
///
/// Only `name` participates in lookups; it is resolved against
/// [`Ledger::mod_packs`] by [`Ledger::mod_pack`]. Any other fields stored next to
/// it in the file are kept as-is so they survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModPackRef {
    pub name: String,
    #[serde(flatten)]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl ModPackRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: BTreeMap::new(),
        }
    }
}

impl From<&ModPack> for ModPackRef {
    fn from(pack: &ModPack) -> Self {
        let mut details = BTreeMap::new();
        details.insert("author".to_string(), pack.author.clone().into());
        details.insert("version".to_string(), pack.version.clone().into());
        details.insert("url".to_string(), pack.url.clone().into());
        Self {
            name: pack.name.clone(),
            details,
        }
    }
}

/// Offsets and record type of one redirect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModData {
    /// Archive record type, carried through for index writes.
    #[serde(default)]
    pub data_type: i32,
    /// Offset restored when the mod is disabled.
    pub original_offset: i64,
    /// Offset applied when the mod is enabled.
    pub mod_offset: i64,
    /// Size of the replacement data in bytes.
    #[serde(default)]
    pub mod_size: i32,
}

/// One path-level redirect between an original offset and a replacement offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mod {
    /// Provenance tag. [`TOOL_ADDED_SOURCE`] marks files with no original counterpart.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Archive-internal path, forward-slash normalized. Empty for soft-deleted slots.
    #[serde(default)]
    pub full_path: String,
    #[serde(rename = "datFile", default)]
    pub container_id: ContainerId,
    #[serde(default)]
    pub enabled: bool,
    /// `None` for standalone mods.
    #[serde(rename = "modPack", default)]
    pub mod_pack_ref: Option<ModPackRef>,
    #[serde(rename = "data", default)]
    pub offsets: ModData,
}

impl Mod {
    /// A soft-deleted slot, skipped by every lookup and batch.
    pub fn is_blank(&self) -> bool {
        self.full_path.is_empty()
    }

    pub fn is_tool_added(&self) -> bool {
        self.source == TOOL_ADDED_SOURCE
    }

    pub fn pack_name(&self) -> Option<&str> {
        self.mod_pack_ref.as_ref().map(|r| r.name.as_str())
    }

    pub fn is_standalone(&self) -> bool {
        self.mod_pack_ref.is_none()
    }

    /// Offset the index must hold for this entry to be in the `enable` state.
    pub fn target_offset(&self, enable: bool) -> i64 {
        if enable {
            self.offsets.mod_offset
        } else {
            self.offsets.original_offset
        }
    }

    /// Soft-delete this entry in place.
    ///
    /// `mod_offset` and `mod_size` are left untouched while `original_offset` and
    /// `data_type` are zeroed. Existing ledger files carry exactly this shape, so
    /// the asymmetry is kept.
    pub fn blank(&mut self) {
        self.name.clear();
        self.category.clear();
        self.full_path.clear();
        self.source.clear();
        self.mod_pack_ref = None;
        self.enabled = false;
        self.offsets.original_offset = 0;
        self.offsets.data_type = 0;
    }
}

/// Root of the persisted ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(rename = "version")]
    pub schema_version: String,
    #[serde(rename = "modCount")]
    pub active_mod_count: usize,
    #[serde(rename = "modPackCount")]
    pub mod_pack_count: usize,
    #[serde(rename = "emptyCount")]
    pub empty_mod_slot_count: usize,
    /// Mod packs in import order.
    #[serde(rename = "ModPacks", default)]
    pub mod_packs: Vec<ModPack>,
    /// Mod entries. Slots keep their position for the lifetime of the file.
    #[serde(rename = "Mods", default)]
    pub mods: Vec<Mod>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            schema_version: LEDGER_VERSION.to_string(),
            active_mod_count: 0,
            mod_pack_count: 0,
            empty_mod_slot_count: 0,
            mod_packs: Vec::new(),
            mods: Vec::new(),
        }
    }
}

/// A problem found by [`Ledger::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerIssue {
    /// `active_mod_count + empty_mod_slot_count` differs from the number of slots.
    SlotCountDrift {
        active: usize,
        empty: usize,
        slots: usize,
    },
    /// `active_mod_count` differs from the number of non-blank entries.
    ActiveCountDrift { recorded: usize, actual: usize },
    /// `mod_pack_count` differs from the number of recorded packs.
    PackCountDrift { recorded: usize, actual: usize },
    /// Two active entries share one path.
    DuplicatePath { path: String, slots: Vec<usize> },
    /// An active entry references a pack that is not recorded.
    DanglingPackRef { path: String, pack: String },
}

impl fmt::Display for LedgerIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerIssue::SlotCountDrift {
                active,
                empty,
                slots,
            } => write!(
                f,
                "active ({active}) + empty ({empty}) counts do not add up to {slots} slots"
            ),
            LedgerIssue::ActiveCountDrift { recorded, actual } => write!(
                f,
                "recorded active count {recorded} but {actual} entries are active"
            ),
            LedgerIssue::PackCountDrift { recorded, actual } => write!(
                f,
                "recorded mod pack count {recorded} but {actual} packs are listed"
            ),
            LedgerIssue::DuplicatePath { path, slots } => {
                write!(f, "path '{path}' is claimed by slots {slots:?}")
            }
            LedgerIssue::DanglingPackRef { path, pack } => {
                write!(f, "'{path}' references unknown mod pack '{pack}'")
            }
        }
    }
}

impl Ledger {
    /// An empty ledger with zero counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this crate understands the stored schema version (any `1.x`).
    pub fn is_supported_version(&self) -> bool {
        self.schema_version
            .split('.')
            .next()
            .and_then(|major| major.parse::<u32>().ok())
            == Some(1)
    }

    /// Slot index of the active entry for `path`, if any.
    ///
    /// Back-slashes in `path` are normalized first. Blank slots never match.
    pub fn find_active(&self, path: &str) -> Option<usize> {
        let path = normalize_path(path);
        if path.is_empty() {
            return None;
        }
        self.mods.iter().position(|m| m.full_path == path)
    }

    pub fn get_active(&self, path: &str) -> Option<&Mod> {
        self.find_active(path).map(|i| &self.mods[i])
    }

    pub fn mod_pack(&self, name: &str) -> Option<&ModPack> {
        self.mod_packs.iter().find(|p| p.name == name)
    }

    /// Active entries in slot order.
    pub fn active_mods(&self) -> impl Iterator<Item = &Mod> {
        self.mods.iter().filter(|m| !m.is_blank())
    }

    /// Active entries belonging to the named pack, in slot order.
    pub fn pack_members<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Mod> + 'a {
        self.active_mods().filter(move |m| m.pack_name() == Some(name))
    }

    /// Record a new mod entry and return its slot index.
    ///
    /// The first blank slot is reused when one exists; otherwise the entry is
    /// appended. Fails with [`Error::InvalidArgument`] when the entry has no path
    /// or another active entry already owns the path.
    pub fn insert_mod(&mut self, mut entry: Mod) -> Result<usize> {
        entry.full_path = normalize_path(&entry.full_path);
        if entry.full_path.is_empty() {
            return Err(Error::InvalidArgument(
                "mod entry has no archive path".to_string(),
            ));
        }
        if self.find_active(&entry.full_path).is_some() {
            return Err(Error::InvalidArgument(format!(
                "an active entry already exists for '{}'",
                entry.full_path
            )));
        }

        let slot = match self.mods.iter().position(Mod::is_blank) {
            Some(slot) => {
                self.mods[slot] = entry;
                self.empty_mod_slot_count = self.empty_mod_slot_count.saturating_sub(1);
                slot
            }
            None => {
                self.mods.push(entry);
                self.mods.len() - 1
            }
        };
        self.active_mod_count += 1;
        Ok(slot)
    }

    /// Record a new mod pack. Pack names are unique.
    pub fn insert_mod_pack(&mut self, pack: ModPack) -> Result<()> {
        if pack.name.is_empty() {
            return Err(Error::InvalidArgument("mod pack has no name".to_string()));
        }
        if self.mod_pack(&pack.name).is_some() {
            return Err(Error::InvalidArgument(format!(
                "mod pack '{}' already exists",
                pack.name
            )));
        }
        self.mod_packs.push(pack);
        self.mod_pack_count += 1;
        Ok(())
    }

    /// Check the counters and path uniqueness against the entries.
    pub fn verify(&self) -> Vec<LedgerIssue> {
        let mut issues = Vec::new();

        if self.active_mod_count + self.empty_mod_slot_count != self.mods.len() {
            issues.push(LedgerIssue::SlotCountDrift {
                active: self.active_mod_count,
                empty: self.empty_mod_slot_count,
                slots: self.mods.len(),
            });
        }

        let actual_active = self.active_mods().count();
        if actual_active != self.active_mod_count {
            issues.push(LedgerIssue::ActiveCountDrift {
                recorded: self.active_mod_count,
                actual: actual_active,
            });
        }

        if self.mod_pack_count != self.mod_packs.len() {
            issues.push(LedgerIssue::PackCountDrift {
                recorded: self.mod_pack_count,
                actual: self.mod_packs.len(),
            });
        }

        let mut slots_by_path: HashMap<&str, Vec<usize>> = HashMap::new();
        for (slot, entry) in self.mods.iter().enumerate() {
            if entry.is_blank() {
                continue;
            }
            slots_by_path
                .entry(entry.full_path.as_str())
                .or_default()
                .push(slot);

            if let Some(pack) = entry.pack_name() {
                if self.mod_pack(pack).is_none() {
                    issues.push(LedgerIssue::DanglingPackRef {
                        path: entry.full_path.clone(),
                        pack: pack.to_string(),
                    });
                }
            }
        }

        let mut duplicates: Vec<_> = slots_by_path
            .into_iter()
            .filter(|(_, slots)| slots.len() > 1)
            .collect();
        duplicates.sort_by_key(|(_, slots)| slots[0]);
        for (path, slots) in duplicates {
            issues.push(LedgerIssue::DuplicatePath {
                path: path.to_string(),
                slots,
            });
        }

        issues
    }
}
