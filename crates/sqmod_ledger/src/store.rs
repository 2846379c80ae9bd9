//! Ledger persistence.
//!
//! [`LedgerStore`] owns the path of the ledger file and an optional in-memory
//! snapshot of its contents. The first [`load`](LedgerStore::load) reads the file
//! and caches it; later loads are served from the cache. Every
//! [`save`](LedgerStore::save) drops the cache *before* writing, so the next load
//! always re-reads what was just written. Saves rewrite the whole document; there
//! is no append path.
//!
//! While writing, the file is held under an exclusive advisory lock. A second
//! writer that finds the lock taken fails immediately instead of waiting. No
//! other cross-process coordination is attempted.

use crate::error::{Error, Result};
use crate::model::Ledger;
use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};

/// File name of the ledger inside an installation.
pub const LEDGER_FILE_NAME: &str = "XivMods.json";

/// Owns the on-disk ledger file and its cached contents.
#[derive(Debug)]
pub struct LedgerStore {
    path: Utf8PathBuf,
    cache: Option<Ledger>,
}

impl LedgerStore {
    /// Create a store for the ledger at `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: None,
        }
    }

    /// Create a store for the canonical ledger of an installation.
    ///
    /// `game_dir` is the archive directory (`.../game/sqpack/ffxiv`); the ledger
    /// lives two levels above it.
    pub fn for_game_dir(game_dir: &Utf8Path) -> Result<Self> {
        let root = game_dir
            .parent()
            .and_then(Utf8Path::parent)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "'{}' is not an archive directory of an installation",
                    game_dir
                ))
            })?;
        Ok(Self::new(root.join(LEDGER_FILE_NAME)))
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.as_std_path().is_file()
    }

    /// Whether a snapshot is currently held in memory.
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Drop the cached snapshot so the next load re-reads the file.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Return the ledger, reading it from disk if no snapshot is cached.
    ///
    /// Fails with [`Error::LedgerNotFound`] when the file does not exist.
    pub fn load(&mut self) -> Result<Ledger> {
        if let Some(ledger) = &self.cache {
            return Ok(ledger.clone());
        }

        let file = match File::open(self.path.as_std_path()) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::LedgerNotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let ledger: Ledger = serde_json::from_reader(BufReader::new(file))?;

        if !ledger.is_supported_version() {
            tracing::warn!(
                "Ledger {} has schema version {}, expected 1.x",
                self.path,
                ledger.schema_version
            );
        }
        tracing::debug!(
            "Loaded ledger {} ({} active, {} empty, {} packs)",
            self.path,
            ledger.active_mod_count,
            ledger.empty_mod_slot_count,
            ledger.mod_pack_count
        );

        self.cache = Some(ledger.clone());
        Ok(ledger)
    }

    /// Overwrite the ledger file with `ledger`.
    ///
    /// The cache is invalidated first, whether or not the write succeeds.
    pub fn save(&mut self, ledger: &Ledger) -> Result<()> {
        self.cache = None;

        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent.as_std_path())?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.path.as_std_path())?;
        file.try_lock_exclusive()?;
        file.set_len(0)?;

        let mut writer = BufWriter::new(&file);
        serde_json::to_writer(&mut writer, ledger)?;
        writer.flush()?;
        drop(writer);
        file.sync_all()?;
        // The lock is released when `file` is closed.

        tracing::debug!(
            "Saved ledger {} ({} slots)",
            self.path,
            ledger.mods.len()
        );
        Ok(())
    }

    /// Write an empty ledger if none exists. Returns `true` when a file was written.
    pub fn create(&mut self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.save(&Ledger::new())?;
        tracing::info!("Created ledger {}", self.path);
        Ok(true)
    }

    /// Delete the ledger file and drop the cache. A missing file is not an error.
    pub fn reset(&mut self) -> Result<()> {
        self.cache = None;
        match std::fs::remove_file(self.path.as_std_path()) {
            Ok(()) => {
                tracing::info!("Deleted ledger {}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
