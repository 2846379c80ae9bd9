//! Mod ledger engine.
//!
//! [`ModLedger`] keeps the ledger and the archive index in step. Every mod entry
//! records two offsets for its path; enabling the mod points the index at the
//! mod offset, disabling points it back at the original offset. The ledger's
//! `enabled` flag is only changed after both mirrored index writes succeeded.
//!
//! # Batches
//!
//! Group toggles, global toggles and mod pack deletion process entries one at a
//! time, in slot order, and save the ledger once at the end. The first failing
//! entry stops the batch. Index writes already made are not rolled back and the
//! ledger is not saved, so the two disagree afterwards. That outcome is reported
//! as [`Error::BatchInterrupted`], which lists every path whose index entry was
//! already redirected, and is logged at `error` level. Callers should re-query
//! [`ModLedger::query_status`] with `cross_check` before retrying.
//!
//! # Deletion
//!
//! Entries are soft-deleted: the slot is blanked in place ([`Mod::blank`]) and
//! the counters move one entry from active to empty. Entries whose source marks
//! them as tool-added first have their index descriptors (the path and its
//! `.flag` companion) removed, since no original file exists behind them. Any
//! enabled entry is then disabled before it is blanked.

use crate::error::{Error, Result};
use crate::index::{set_offset_mirrored, OffsetIndex};
use crate::legacy::LegacyLedgerReader;
use crate::model::{normalize_path, Ledger, Mod};
use crate::path_hash::PathHash;
use crate::store::LedgerStore;
use camino::Utf8Path;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Selector text for mods that belong to no pack.
pub const STANDALONE_GROUP: &str = "Standalone (Non-ModPack)";

/// Status of an archive path as seen by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModStatus {
    /// No mod is recorded for the path.
    Original,
    /// The index points at the mod offset.
    Enabled,
    /// The index points at the original offset.
    Disabled,
}

impl fmt::Display for ModStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModStatus::Original => "original",
            ModStatus::Enabled => "enabled",
            ModStatus::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// Which entries a group toggle applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModGroup {
    /// Entries without a mod pack.
    Standalone,
    /// Entries installed with the named mod pack.
    Pack(String),
}

impl ModGroup {
    pub fn contains(&self, entry: &Mod) -> bool {
        match self {
            ModGroup::Standalone => entry.is_standalone(),
            ModGroup::Pack(name) => entry.pack_name() == Some(name.as_str()),
        }
    }
}

impl FromStr for ModGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Err(Error::InvalidArgument("empty group selector".to_string())),
            STANDALONE_GROUP => Ok(ModGroup::Standalone),
            name => Ok(ModGroup::Pack(name.to_string())),
        }
    }
}

impl fmt::Display for ModGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModGroup::Standalone => f.write_str(STANDALONE_GROUP),
            ModGroup::Pack(name) => f.write_str(name),
        }
    }
}

/// Progress of a batch toggle, emitted after every processed entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleProgress {
    /// 1-based number of entries processed so far.
    pub current: usize,
    /// Number of entries the batch will process.
    pub total: usize,
    /// Path of the entry just processed.
    pub path: String,
}

type ProgressCallback = Arc<dyn Fn(ToggleProgress) + Send + Sync>;

/// Operates on the ledger and keeps the archive index consistent with it.
pub struct ModLedger<I> {
    store: LedgerStore,
    index: I,
    progress_callback: Option<ProgressCallback>,
}

impl<I: OffsetIndex> ModLedger<I> {
    pub fn new(store: LedgerStore, index: I) -> Self {
        Self {
            store,
            index,
            progress_callback: None,
        }
    }

    /// Register a progress callback for [`toggle_group`](Self::toggle_group) and
    /// [`toggle_all`](Self::toggle_all).
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ToggleProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LedgerStore {
        &mut self.store
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut I {
        &mut self.index
    }

    pub fn into_parts(self) -> (LedgerStore, I) {
        (self.store, self.index)
    }

    /// Return a copy of the active entry for `path`.
    ///
    /// Returns `Ok(None)` when the ledger file does not exist or no active entry
    /// matches. Back-slashes in `path` are accepted.
    pub fn find_entry(&mut self, path: &str) -> Result<Option<Mod>> {
        if !self.store.is_cached() && !self.store.exists() {
            return Ok(None);
        }
        let ledger = self.store.load()?;
        Ok(ledger.get_active(path).cloned())
    }

    /// Report whether a mod is enabled for `path` and which pack owns it.
    ///
    /// With `cross_check` unset, the ledger flag is trusted. With it set, the live
    /// offset is read from the index and compared against both recorded offsets;
    /// an offset matching neither is an [`Error::IndexLedgerMismatch`].
    pub fn query_status(
        &mut self,
        path: &str,
        cross_check: bool,
    ) -> Result<(ModStatus, Option<String>)> {
        let Some(entry) = self.find_entry(path)? else {
            return Ok((ModStatus::Original, None));
        };
        let owner = entry.pack_name().map(str::to_string);

        if !cross_check {
            let status = if entry.enabled {
                ModStatus::Enabled
            } else {
                ModStatus::Disabled
            };
            return Ok((status, owner));
        }

        let hash = PathHash::of(&entry.full_path);
        let offset = self
            .index
            .get_offset(hash.folder, hash.file, &entry.container_id)?;

        if offset == entry.offsets.original_offset {
            Ok((ModStatus::Disabled, owner))
        } else if offset == entry.offsets.mod_offset {
            Ok((ModStatus::Enabled, owner))
        } else {
            Err(Error::IndexLedgerMismatch {
                path: entry.full_path,
                index_offset: offset,
                original_offset: entry.offsets.original_offset,
                mod_offset: entry.offsets.mod_offset,
            })
        }
    }

    /// Enable or disable the mod recorded for `path`.
    ///
    /// Both index structures are rewritten before the ledger flag changes. If
    /// either write fails the ledger is left untouched.
    pub fn toggle(&mut self, path: &str, enable: bool) -> Result<()> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(Error::InvalidArgument(
                "archive path missing, unable to toggle mod".to_string(),
            ));
        }

        let mut ledger = self.store.load()?;
        let slot = ledger
            .find_active(&path)
            .ok_or_else(|| Error::ModNotFound(path.clone()))?;

        apply_state(&mut self.index, &mut ledger.mods[slot], enable)?;
        self.store.save(&ledger)?;

        tracing::info!(
            "{} mod {}",
            if enable { "Enabled" } else { "Disabled" },
            path
        );
        Ok(())
    }

    /// Enable or disable every entry of a group.
    ///
    /// Blank slots and entries without a name are skipped. Entries are rewritten
    /// even if they already are in the target state.
    pub fn toggle_group(&mut self, group: &ModGroup, enable: bool) -> Result<()> {
        let mut ledger = self.store.load()?;

        if let ModGroup::Pack(name) = group {
            if name.is_empty() {
                return Err(Error::InvalidArgument("empty mod pack name".to_string()));
            }
            if ledger.mod_pack(name).is_none() && ledger.pack_members(name).next().is_none() {
                return Err(Error::InvalidArgument(format!(
                    "unknown mod pack '{}'",
                    name
                )));
            }
        }

        let slots: Vec<usize> = ledger
            .mods
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_blank() && !m.name.is_empty() && group.contains(m))
            .map(|(slot, _)| slot)
            .collect();

        tracing::info!(
            "{} {} entries of group '{}'",
            if enable { "Enabling" } else { "Disabling" },
            slots.len(),
            group
        );

        self.run_batch(&mut ledger, &slots, enable, false)?;
        self.store.save(&ledger)
    }

    /// Enable or disable every active entry in the ledger.
    ///
    /// Only entries not already in the target state are written to the index.
    /// Does nothing when the ledger records no active mods.
    pub fn toggle_all(&mut self, enable: bool) -> Result<()> {
        let mut ledger = self.store.load()?;
        if ledger.active_mod_count == 0 {
            tracing::debug!("No active mods, nothing to toggle");
            return Ok(());
        }

        let slots: Vec<usize> = ledger
            .mods
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_blank() && !m.name.is_empty())
            .map(|(slot, _)| slot)
            .collect();

        tracing::info!(
            "{} all mods ({} entries)",
            if enable { "Enabling" } else { "Disabling" },
            slots.len()
        );

        self.run_batch(&mut ledger, &slots, enable, true)?;
        self.store.save(&ledger)
    }

    /// Soft-delete the mod recorded for `path`.
    ///
    /// Deleting the same path twice fails the second time with
    /// [`Error::ModNotFound`]; counters are only adjusted once.
    pub fn delete_mod(&mut self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(Error::InvalidArgument(
                "archive path missing, unable to delete mod".to_string(),
            ));
        }

        let mut ledger = self.store.load()?;
        let slot = ledger
            .find_active(&path)
            .ok_or_else(|| Error::ModNotFound(path.clone()))?;

        retire_entry(&mut self.index, &mut ledger.mods[slot])?;
        release_slots(&mut ledger, 1);
        self.store.save(&ledger)?;

        tracing::info!("Deleted mod {} (slot {})", path, slot);
        Ok(())
    }

    /// Remove a mod pack and soft-delete every entry installed with it.
    pub fn delete_mod_pack(&mut self, name: &str) -> Result<()> {
        let mut ledger = self.store.load()?;
        let pos = ledger
            .mod_packs
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| Error::ModPackNotFound(name.to_string()))?;
        ledger.mod_packs.remove(pos);

        let slots: Vec<usize> = ledger
            .mods
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_blank() && m.pack_name() == Some(name))
            .map(|(slot, _)| slot)
            .collect();
        let total = slots.len();

        let mut applied = Vec::with_capacity(total);
        for slot in slots {
            let entry = &mut ledger.mods[slot];
            let path = entry.full_path.clone();
            if let Err(e) = retire_entry(&mut self.index, entry) {
                return Err(interrupted(path, applied, total, e));
            }
            applied.push(path);
        }

        release_slots(&mut ledger, total);
        ledger.mod_pack_count = ledger.mod_pack_count.saturating_sub(1);
        self.store.save(&ledger)?;

        tracing::info!("Deleted mod pack '{}' ({} entries)", name, total);
        Ok(())
    }

    /// Soft-delete every active entry whose source marks it as tool-added.
    ///
    /// Each entry is deleted (and the ledger saved) on its own. Returns the
    /// number of entries deleted.
    pub fn delete_tool_added(&mut self) -> Result<usize> {
        let ledger = self.store.load()?;
        let paths: Vec<String> = ledger
            .active_mods()
            .filter(|m| m.is_tool_added())
            .map(|m| m.full_path.clone())
            .collect();

        for path in &paths {
            self.delete_mod(path)?;
        }

        tracing::info!("Deleted {} tool-added entries", paths.len());
        Ok(paths.len())
    }

    /// Point every path listed in a legacy ledger back at its original offset.
    ///
    /// The legacy file holds one JSON record per line. Records without a path are
    /// skipped. The first record that fails stops the migration with
    /// [`Error::MigrationRecord`]. The current ledger is not read or modified.
    /// Returns the number of records redirected.
    pub fn disable_from_legacy_ledger(&mut self, legacy_path: &Utf8Path) -> Result<usize> {
        let reader = LegacyLedgerReader::open(legacy_path)?;
        let mut disabled = 0;

        for record in reader {
            let (line, record) = record?;
            if record.full_path.is_empty() {
                continue;
            }

            let path = normalize_path(&record.full_path);
            set_offset_mirrored(
                &mut self.index,
                record.original_offset,
                &path,
                &record.container_id,
            )
            .map_err(|e| Error::MigrationRecord {
                line,
                name: record.name.clone(),
                path: path.clone(),
                source: Box::new(e),
            })?;

            tracing::debug!("Disabled legacy entry {} (line {})", path, line);
            disabled += 1;
        }

        tracing::info!(
            "Disabled {} entries from legacy ledger {}",
            disabled,
            legacy_path
        );
        Ok(disabled)
    }

    /// Apply `enable` to the entries at `slots`, in order, stopping at the first failure.
    fn run_batch(
        &mut self,
        ledger: &mut Ledger,
        slots: &[usize],
        enable: bool,
        only_transitions: bool,
    ) -> Result<()> {
        let total = slots.len();
        let mut applied = Vec::with_capacity(total);

        for (n, &slot) in slots.iter().enumerate() {
            let entry = &mut ledger.mods[slot];

            if !(only_transitions && entry.enabled == enable) {
                if let Err(e) = apply_state(&mut self.index, entry, enable) {
                    return Err(interrupted(entry.full_path.clone(), applied, total, e));
                }
                tracing::debug!("Redirected {} (slot {})", entry.full_path, slot);
                applied.push(entry.full_path.clone());
            }

            let path = entry.full_path.clone();
            self.emit_progress(ToggleProgress {
                current: n + 1,
                total,
                path,
            });
        }

        Ok(())
    }

    fn emit_progress(&self, progress: ToggleProgress) {
        if let Some(callback) = &self.progress_callback {
            callback(progress);
        }
    }
}

/// Rewrite both index structures for `entry`, then record the new state.
fn apply_state<I: OffsetIndex + ?Sized>(index: &mut I, entry: &mut Mod, enable: bool) -> Result<()> {
    set_offset_mirrored(
        index,
        entry.target_offset(enable),
        &entry.full_path,
        &entry.container_id,
    )?;
    entry.enabled = enable;
    Ok(())
}

/// Strip tool-added descriptors, disable if enabled, then blank the slot.
fn retire_entry<I: OffsetIndex + ?Sized>(index: &mut I, entry: &mut Mod) -> Result<()> {
    if entry.is_tool_added() {
        index.delete_descriptor(&entry.full_path, &entry.container_id)?;
        index.delete_descriptor(&format!("{}.flag", entry.full_path), &entry.container_id)?;
    }
    if entry.enabled {
        apply_state(index, entry, false)?;
    }
    entry.blank();
    Ok(())
}

/// Move `count` entries from the active counter to the empty counter.
fn release_slots(ledger: &mut Ledger, count: usize) {
    if ledger.active_mod_count < count {
        tracing::warn!(
            "Active mod count {} is lower than the {} entries being released",
            ledger.active_mod_count,
            count
        );
    }
    ledger.active_mod_count = ledger.active_mod_count.saturating_sub(count);
    ledger.empty_mod_slot_count += count;
}

fn interrupted(failed_path: String, applied: Vec<String>, total: usize, source: Error) -> Error {
    tracing::error!(
        "Batch stopped at '{}' after {} of {} entries; index entries changed but not saved to the ledger: {:?}",
        failed_path,
        applied.len(),
        total,
        applied
    );
    Error::BatchInterrupted {
        failed_path,
        applied,
        total,
        source: Box::new(source),
    }
}
