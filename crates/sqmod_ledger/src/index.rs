//! Archive index abstraction.
//!
//! The ledger engine never touches index files directly. It reads and rewrites
//! single entries through the [`OffsetIndex`] trait, which decouples the engine
//! from the binary index format.
//!
//! The archive keeps two index structures that must mirror each other: a primary
//! index keyed by folder/file hash pair and a secondary index keyed by the full
//! path. Every redirect writes the primary first, then the secondary. The pair is
//! not atomic.
//!
//! [`MemoryIndex`] is an in-process implementation for tests and embedders that
//! keep their own copy of the index.

use crate::error::{Error, Result};
use crate::model::ContainerId;
use crate::path_hash::{hash_component, PathHash};
use std::collections::HashMap;

/// Read/write access to the archive's offset index.
///
/// Methods take `&mut self` so implementations can keep open file handles or
/// other stateful readers.
pub trait OffsetIndex {
    /// Return the offset the primary index currently holds for a path.
    fn get_offset(&mut self, folder_hash: u32, file_hash: u32, container: &ContainerId)
        -> Result<i64>;

    /// Rewrite the primary index entry for `path`.
    fn set_offset_primary(&mut self, offset: i64, path: &str, container: &ContainerId)
        -> Result<()>;

    /// Rewrite the secondary index entry for `path`.
    fn set_offset_secondary(
        &mut self,
        offset: i64,
        path: &str,
        container: &ContainerId,
    ) -> Result<()>;

    /// Remove the descriptor for `path` from the index entirely.
    fn delete_descriptor(&mut self, path: &str, container: &ContainerId) -> Result<()>;
}

/// Write `offset` into both mirrored index structures, primary first.
pub fn set_offset_mirrored<I: OffsetIndex + ?Sized>(
    index: &mut I,
    offset: i64,
    path: &str,
    container: &ContainerId,
) -> Result<()> {
    index.set_offset_primary(offset, path, container)?;
    index.set_offset_secondary(offset, path, container)?;
    Ok(())
}

type PrimaryKey = (ContainerId, u32, u32);
type SecondaryKey = (ContainerId, u32);

/// In-memory archive index with two separately stored tables.
///
/// Writes to a path that has no descriptor change nothing, the same way a real
/// index only rewrites descriptors it contains. Reads of such a path fail with
/// [`Error::Index`].
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    /// (container, folder hash, file hash) -> offset.
    primary: HashMap<PrimaryKey, i64>,
    /// (container, full path hash) -> offset.
    secondary: HashMap<SecondaryKey, i64>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn primary_key(path: &str, container: &ContainerId) -> PrimaryKey {
        let hash = PathHash::of(path);
        (container.clone(), hash.folder, hash.file)
    }

    fn secondary_key(path: &str, container: &ContainerId) -> SecondaryKey {
        (
            container.clone(),
            hash_component(&path.replace('\\', "/")),
        )
    }

    /// Add (or overwrite) a descriptor in both tables.
    pub fn insert(&mut self, path: &str, container: &ContainerId, offset: i64) {
        self.primary
            .insert(Self::primary_key(path, container), offset);
        self.secondary
            .insert(Self::secondary_key(path, container), offset);
    }

    pub fn primary_offset(&self, path: &str, container: &ContainerId) -> Option<i64> {
        self.primary
            .get(&Self::primary_key(path, container))
            .copied()
    }

    pub fn secondary_offset(&self, path: &str, container: &ContainerId) -> Option<i64> {
        self.secondary
            .get(&Self::secondary_key(path, container))
            .copied()
    }

    /// Whether either table still holds a descriptor for `path`.
    pub fn contains(&self, path: &str, container: &ContainerId) -> bool {
        self.primary_offset(path, container).is_some()
            || self.secondary_offset(path, container).is_some()
    }

    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }
}

impl OffsetIndex for MemoryIndex {
    fn get_offset(
        &mut self,
        folder_hash: u32,
        file_hash: u32,
        container: &ContainerId,
    ) -> Result<i64> {
        self.primary
            .get(&(container.clone(), folder_hash, file_hash))
            .copied()
            .ok_or_else(|| {
                Error::Index(format!(
                    "no entry for {:08x}/{:08x} in {}",
                    folder_hash, file_hash, container
                ))
            })
    }

    fn set_offset_primary(
        &mut self,
        offset: i64,
        path: &str,
        container: &ContainerId,
    ) -> Result<()> {
        match self.primary.get_mut(&Self::primary_key(path, container)) {
            Some(slot) => *slot = offset,
            None => tracing::debug!("'{}' not in primary index, nothing to rewrite", path),
        }
        Ok(())
    }

    fn set_offset_secondary(
        &mut self,
        offset: i64,
        path: &str,
        container: &ContainerId,
    ) -> Result<()> {
        match self.secondary.get_mut(&Self::secondary_key(path, container)) {
            Some(slot) => *slot = offset,
            None => tracing::debug!("'{}' not in secondary index, nothing to rewrite", path),
        }
        Ok(())
    }

    fn delete_descriptor(&mut self, path: &str, container: &ContainerId) -> Result<()> {
        self.primary.remove(&Self::primary_key(path, container));
        self.secondary.remove(&Self::secondary_key(path, container));
        Ok(())
    }
}
