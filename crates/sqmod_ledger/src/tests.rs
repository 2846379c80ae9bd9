use crate::engine::{ModGroup, ModLedger, ModStatus, ToggleProgress, STANDALONE_GROUP};
use crate::error::{Error, ErrorKind, Result};
use crate::index::{MemoryIndex, OffsetIndex};
use crate::model::{ContainerId, Ledger, Mod, ModData, ModPack, ModPackRef, TOOL_ADDED_SOURCE};
use crate::store::{LedgerStore, LEDGER_FILE_NAME};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum IndexWrite {
    Primary(String, i64),
    Secondary(String, i64),
    Delete(String),
}

/// Wraps [`MemoryIndex`], logging every write and failing on request.
#[derive(Debug, Default)]
struct RecordingIndex {
    inner: MemoryIndex,
    writes: Vec<IndexWrite>,
    fail_primary: Option<String>,
    fail_secondary: Option<String>,
}

impl RecordingIndex {
    fn offset(&self, path: &str) -> Option<i64> {
        self.inner.primary_offset(path, &container())
    }

    fn written_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .writes
            .iter()
            .map(|w| match w {
                IndexWrite::Primary(p, _) | IndexWrite::Secondary(p, _) | IndexWrite::Delete(p) => {
                    p.as_str()
                }
            })
            .collect();
        paths.dedup();
        paths
    }
}

impl OffsetIndex for RecordingIndex {
    fn get_offset(&mut self, folder_hash: u32, file_hash: u32, container: &ContainerId) -> Result<i64> {
        self.inner.get_offset(folder_hash, file_hash, container)
    }

    fn set_offset_primary(&mut self, offset: i64, path: &str, container: &ContainerId) -> Result<()> {
        if self.fail_primary.as_deref() == Some(path) {
            return Err(Error::Index(format!("primary write refused for {}", path)));
        }
        self.inner.set_offset_primary(offset, path, container)?;
        self.writes.push(IndexWrite::Primary(path.to_string(), offset));
        Ok(())
    }

    fn set_offset_secondary(&mut self, offset: i64, path: &str, container: &ContainerId) -> Result<()> {
        if self.fail_secondary.as_deref() == Some(path) {
            return Err(Error::Index(format!("secondary write refused for {}", path)));
        }
        self.inner.set_offset_secondary(offset, path, container)?;
        self.writes.push(IndexWrite::Secondary(path.to_string(), offset));
        Ok(())
    }

    fn delete_descriptor(&mut self, path: &str, container: &ContainerId) -> Result<()> {
        self.inner.delete_descriptor(path, container)?;
        self.writes.push(IndexWrite::Delete(path.to_string()));
        Ok(())
    }
}

fn container() -> ContainerId {
    ContainerId::from("040000")
}

fn entry(path: &str, pack: Option<&str>, enabled: bool, original: i64, modded: i64) -> Mod {
    Mod {
        source: "TestTool".to_string(),
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        category: "Body".to_string(),
        full_path: path.to_string(),
        container_id: container(),
        enabled,
        mod_pack_ref: pack.map(ModPackRef::new),
        offsets: ModData {
            data_type: 4,
            original_offset: original,
            mod_offset: modded,
            mod_size: 64,
        },
    }
}

fn blank_entry() -> Mod {
    let mut blank = entry("chara/deleted.tex", None, false, 10, 20);
    blank.blank();
    blank
}

fn pack(name: &str) -> ModPack {
    ModPack {
        name: name.to_string(),
        author: "tester".to_string(),
        version: "1.0.0".to_string(),
        url: String::new(),
    }
}

struct Fixture {
    _dir: TempDir,
    path: Utf8PathBuf,
    ledger: ModLedger<RecordingIndex>,
}

impl Fixture {
    /// Write a ledger holding `entries` in the given slot order, and an index
    /// matching their `enabled` flags.
    fn new(packs: Vec<ModPack>, entries: Vec<Mod>) -> Self {
        let dir = TempDir::new().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join(LEDGER_FILE_NAME);

        let mut doc = Ledger::new();
        for p in packs {
            doc.insert_mod_pack(p).unwrap();
        }

        let mut index = RecordingIndex::default();
        for e in entries {
            if e.is_blank() {
                doc.empty_mod_slot_count += 1;
            } else {
                let offset = e.target_offset(e.enabled);
                index.inner.insert(&e.full_path, &e.container_id, offset);
                if e.is_tool_added() {
                    index
                        .inner
                        .insert(&format!("{}.flag", e.full_path), &e.container_id, 0);
                }
                doc.active_mod_count += 1;
            }
            doc.mods.push(e);
        }
        assert!(doc.verify().is_empty());

        let mut store = LedgerStore::new(path.clone());
        store.save(&doc).unwrap();

        Self {
            _dir: dir,
            path,
            ledger: ModLedger::new(store, index),
        }
    }

    fn without_ledger() -> Self {
        let dir = TempDir::new().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join(LEDGER_FILE_NAME);
        let store = LedgerStore::new(path.clone());
        Self {
            _dir: dir,
            path,
            ledger: ModLedger::new(store, RecordingIndex::default()),
        }
    }

    /// Read the ledger file with a fresh store, bypassing any cache.
    fn on_disk(&self) -> Ledger {
        LedgerStore::new(self.path.clone()).load().unwrap()
    }

    fn index(&mut self) -> &mut RecordingIndex {
        self.ledger.index_mut()
    }
}

fn collect_progress(fx: Fixture) -> (Fixture, Arc<Mutex<Vec<ToggleProgress>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let Fixture { _dir, path, ledger } = fx;
    let (store, index) = ledger.into_parts();
    let ledger = ModLedger::new(store, index).with_progress(move |p| {
        sink.lock().unwrap().push(p);
    });
    (Fixture { _dir, path, ledger }, seen)
}

#[test]
fn test_toggle_round_trip() {
    let mut fx = Fixture::new(vec![], vec![entry("chara/body.tex", None, false, 100, 200)]);

    fx.ledger.toggle("chara/body.tex", true).unwrap();
    assert_eq!(fx.index().offset("chara/body.tex"), Some(200));
    assert_eq!(
        fx.index().inner.secondary_offset("chara/body.tex", &container()),
        Some(200)
    );
    assert!(fx.on_disk().mods[0].enabled);

    fx.ledger.toggle("chara/body.tex", false).unwrap();
    assert_eq!(fx.index().offset("chara/body.tex"), Some(100));
    assert_eq!(
        fx.index().inner.secondary_offset("chara/body.tex", &container()),
        Some(100)
    );
    assert!(!fx.on_disk().mods[0].enabled);

    assert_eq!(
        fx.index().writes,
        vec![
            IndexWrite::Primary("chara/body.tex".to_string(), 200),
            IndexWrite::Secondary("chara/body.tex".to_string(), 200),
            IndexWrite::Primary("chara/body.tex".to_string(), 100),
            IndexWrite::Secondary("chara/body.tex".to_string(), 100),
        ]
    );
}

#[test]
fn test_toggle_accepts_backslash_paths() {
    let mut fx = Fixture::new(vec![], vec![entry("chara/body.tex", None, false, 100, 200)]);

    fx.ledger.toggle("chara\\body.tex", true).unwrap();
    assert_eq!(fx.index().offset("chara/body.tex"), Some(200));
}

#[test]
fn test_toggle_errors() {
    let mut fx = Fixture::new(vec![], vec![entry("chara/body.tex", None, false, 100, 200)]);

    let err = fx.ledger.toggle("", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = fx.ledger.toggle("chara/missing.tex", true).unwrap_err();
    assert!(matches!(err, Error::ModNotFound(ref p) if p == "chara/missing.tex"));

    let mut empty = Fixture::without_ledger();
    let err = empty.ledger.toggle("chara/body.tex", true).unwrap_err();
    assert!(matches!(err, Error::LedgerNotFound(_)));
}

#[test]
fn test_toggle_failure_keeps_ledger_flag() {
    let mut fx = Fixture::new(vec![], vec![entry("chara/body.tex", None, false, 100, 200)]);
    fx.index().fail_secondary = Some("chara/body.tex".to_string());

    assert!(fx.ledger.toggle("chara/body.tex", true).is_err());

    // The primary write went through; the pair is not atomic.
    assert_eq!(fx.index().offset("chara/body.tex"), Some(200));
    assert!(!fx.on_disk().mods[0].enabled);
}

#[test]
fn test_query_status_without_ledger() {
    let mut fx = Fixture::without_ledger();
    let status = fx.ledger.query_status("chara/body.tex", true).unwrap();
    assert_eq!(status, (ModStatus::Original, None));
}

#[test]
fn test_query_status_trusts_flag_without_cross_check() {
    let mut fx = Fixture::new(
        vec![pack("Foo")],
        vec![
            entry("chara/a.tex", Some("Foo"), true, 100, 200),
            entry("chara/b.tex", None, false, 300, 400),
        ],
    );

    // Index drift is invisible without cross-checking.
    fx.index().inner.insert("chara/a.tex", &container(), 999);

    assert_eq!(
        fx.ledger.query_status("chara/a.tex", false).unwrap(),
        (ModStatus::Enabled, Some("Foo".to_string()))
    );
    assert_eq!(
        fx.ledger.query_status("chara/b.tex", false).unwrap(),
        (ModStatus::Disabled, None)
    );
    assert_eq!(
        fx.ledger.query_status("chara/unknown.tex", false).unwrap(),
        (ModStatus::Original, None)
    );
    assert!(fx.index().writes.is_empty());
}

#[test]
fn test_query_status_cross_check() {
    let mut fx = Fixture::new(
        vec![],
        vec![
            entry("chara/a.tex", None, true, 100, 200),
            entry("chara/b.tex", None, false, 300, 400),
        ],
    );

    assert_eq!(
        fx.ledger.query_status("chara/a.tex", true).unwrap().0,
        ModStatus::Enabled
    );
    assert_eq!(
        fx.ledger.query_status("chara/b.tex", true).unwrap().0,
        ModStatus::Disabled
    );

    // The index wins over the ledger flag.
    fx.index().inner.insert("chara/b.tex", &container(), 400);
    assert_eq!(
        fx.ledger.query_status("chara/b.tex", true).unwrap().0,
        ModStatus::Enabled
    );
}

#[test]
fn test_query_status_mismatch() {
    let mut fx = Fixture::new(vec![], vec![entry("chara/a.tex", None, true, 100, 200)]);
    fx.index().inner.insert("chara/a.tex", &container(), 12345);

    let err = fx.ledger.query_status("chara/a.tex", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexLedgerMismatch);
    match err {
        Error::IndexLedgerMismatch {
            index_offset,
            original_offset,
            mod_offset,
            ..
        } => {
            assert_eq!(index_offset, 12345);
            assert_eq!(original_offset, 100);
            assert_eq!(mod_offset, 200);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_delete_mod_pack_cascades() {
    let mut fx = Fixture::new(
        vec![pack("Foo"), pack("Bar")],
        vec![
            entry("chara/a.tex", Some("Foo"), true, 100, 200),
            entry("chara/b.tex", Some("Foo"), false, 300, 400),
            entry("chara/c.tex", Some("Foo"), true, 500, 600),
            entry("chara/d.tex", Some("Bar"), true, 700, 800),
        ],
    );
    let before = fx.on_disk();

    fx.ledger.delete_mod_pack("Foo").unwrap();

    // Every member points at its original data again.
    assert_eq!(fx.index().offset("chara/a.tex"), Some(100));
    assert_eq!(fx.index().offset("chara/b.tex"), Some(300));
    assert_eq!(fx.index().offset("chara/c.tex"), Some(500));
    assert_eq!(fx.index().offset("chara/d.tex"), Some(800));
    assert_eq!(fx.index().written_paths(), vec!["chara/a.tex", "chara/c.tex"]);

    let after = fx.on_disk();
    assert_eq!(after.mod_pack_count, before.mod_pack_count - 1);
    assert_eq!(after.empty_mod_slot_count, before.empty_mod_slot_count + 3);
    assert_eq!(after.active_mod_count, before.active_mod_count - 3);
    assert!(after.mod_pack("Foo").is_none());
    assert!(after.mods[..3].iter().all(Mod::is_blank));
    assert!(!after.mods[3].is_blank());
    assert!(after.verify().is_empty());
}

#[test]
fn test_delete_unknown_mod_pack() {
    let mut fx = Fixture::new(vec![pack("Foo")], vec![]);
    let err = fx.ledger.delete_mod_pack("Nope").unwrap_err();
    assert!(matches!(err, Error::ModPackNotFound(_)));
    assert_eq!(fx.on_disk().mod_pack_count, 1);
}

#[test]
fn test_toggle_standalone_group_skips_blank_slots() {
    let mut fx = Fixture::new(
        vec![pack("Foo")],
        vec![
            blank_entry(),
            entry("chara/solo.tex", None, false, 100, 200),
            entry("chara/packed.tex", Some("Foo"), false, 300, 400),
        ],
    );

    fx.ledger.toggle_group(&ModGroup::Standalone, true).unwrap();

    assert_eq!(fx.index().written_paths(), vec!["chara/solo.tex"]);
    let after = fx.on_disk();
    assert!(after.mods[1].enabled);
    assert!(!after.mods[2].enabled);
    assert!(after.mods[0].is_blank());
}

#[test]
fn test_toggle_pack_group_with_progress() {
    let fx = Fixture::new(
        vec![pack("Foo")],
        vec![
            entry("chara/a.tex", Some("Foo"), true, 100, 200),
            entry("chara/solo.tex", None, false, 300, 400),
            entry("chara/b.tex", Some("Foo"), false, 500, 600),
        ],
    );
    let (mut fx, seen) = collect_progress(fx);

    fx.ledger
        .toggle_group(&ModGroup::Pack("Foo".to_string()), true)
        .unwrap();

    // Already-enabled members are rewritten as well.
    assert_eq!(fx.index().written_paths(), vec!["chara/a.tex", "chara/b.tex"]);
    assert_eq!(fx.index().offset("chara/b.tex"), Some(600));

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            ToggleProgress {
                current: 1,
                total: 2,
                path: "chara/a.tex".to_string()
            },
            ToggleProgress {
                current: 2,
                total: 2,
                path: "chara/b.tex".to_string()
            },
        ]
    );
}

#[test]
fn test_group_selector_parsing() {
    assert_eq!(
        STANDALONE_GROUP.parse::<ModGroup>().unwrap(),
        ModGroup::Standalone
    );
    assert_eq!(
        "Foo".parse::<ModGroup>().unwrap(),
        ModGroup::Pack("Foo".to_string())
    );
    assert_eq!(
        "".parse::<ModGroup>().unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(ModGroup::Standalone.to_string(), STANDALONE_GROUP);
}

#[test]
fn test_toggle_unknown_pack_group() {
    let mut fx = Fixture::new(vec![pack("Foo")], vec![]);
    let err = fx
        .ledger
        .toggle_group(&ModGroup::Pack("Bar".to_string()), true)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_toggle_all_writes_only_transitions() {
    let fx = Fixture::new(
        vec![],
        vec![
            entry("chara/a.tex", None, true, 100, 200),
            blank_entry(),
            entry("chara/b.tex", None, true, 300, 400),
        ],
    );
    let (mut fx, seen) = collect_progress(fx);

    fx.ledger.toggle_all(true).unwrap();
    assert!(fx.index().writes.is_empty());
    assert_eq!(fx.on_disk().active_mod_count, 2);
    assert_eq!(seen.lock().unwrap().len(), 2);

    fx.ledger.toggle_all(false).unwrap();
    assert_eq!(fx.index().written_paths(), vec!["chara/a.tex", "chara/b.tex"]);
    assert_eq!(fx.index().offset("chara/a.tex"), Some(100));
    assert!(fx.on_disk().active_mods().all(|m| !m.enabled));
}

#[test]
fn test_toggle_all_without_active_mods() {
    let mut fx = Fixture::new(vec![], vec![blank_entry()]);
    fx.ledger.toggle_all(true).unwrap();
    assert!(fx.index().writes.is_empty());

    let mut missing = Fixture::without_ledger();
    assert!(matches!(
        missing.ledger.toggle_all(true),
        Err(Error::LedgerNotFound(_))
    ));
}

#[test]
fn test_batch_fails_fast_without_saving() {
    let mut fx = Fixture::new(
        vec![],
        vec![
            entry("chara/a.tex", None, false, 100, 200),
            entry("chara/b.tex", None, false, 300, 400),
            entry("chara/c.tex", None, false, 500, 600),
        ],
    );
    fx.index().fail_primary = Some("chara/b.tex".to_string());

    let err = fx.ledger.toggle_group(&ModGroup::Standalone, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialBatch);
    match err {
        Error::BatchInterrupted {
            failed_path,
            applied,
            total,
            source,
        } => {
            assert_eq!(failed_path, "chara/b.tex");
            assert_eq!(applied, vec!["chara/a.tex".to_string()]);
            assert_eq!(total, 3);
            assert!(matches!(*source, Error::Index(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The first redirect stays in the index but was never recorded.
    assert_eq!(fx.index().offset("chara/a.tex"), Some(200));
    assert_eq!(fx.index().offset("chara/c.tex"), Some(500));
    assert!(fx.on_disk().mods.iter().all(|m| !m.enabled));
}

#[test]
fn test_delete_mod_twice() {
    let mut fx = Fixture::new(
        vec![],
        vec![
            entry("chara/a.tex", None, true, 100, 200),
            entry("chara/b.tex", None, false, 300, 400),
        ],
    );

    fx.ledger.delete_mod("chara/a.tex").unwrap();
    assert_eq!(fx.index().offset("chara/a.tex"), Some(100));

    let after_first = fx.on_disk();
    assert_eq!(after_first.active_mod_count, 1);
    assert_eq!(after_first.empty_mod_slot_count, 1);

    // Blanking keeps the mod offset and size, and zeroes the rest.
    let blanked = &after_first.mods[0];
    assert!(blanked.is_blank());
    assert_eq!(blanked.offsets.mod_offset, 200);
    assert_eq!(blanked.offsets.mod_size, 64);
    assert_eq!(blanked.offsets.original_offset, 0);
    assert_eq!(blanked.offsets.data_type, 0);

    let err = fx.ledger.delete_mod("chara/a.tex").unwrap_err();
    assert!(matches!(err, Error::ModNotFound(_)));
    assert_eq!(fx.on_disk(), after_first);
}

#[test]
fn test_delete_tool_added_strips_descriptors() {
    let mut added = entry("chara/new.tex", None, true, 0, 200);
    added.source = TOOL_ADDED_SOURCE.to_string();
    let mut fx = Fixture::new(
        vec![],
        vec![added, entry("chara/a.tex", None, false, 100, 200)],
    );

    fx.ledger.delete_mod("chara/new.tex").unwrap();

    assert!(!fx.index().inner.contains("chara/new.tex", &container()));
    assert!(!fx.index().inner.contains("chara/new.tex.flag", &container()));
    // Descriptors go first, then the enabled entry is disabled like any other.
    assert_eq!(
        fx.index().writes,
        vec![
            IndexWrite::Delete("chara/new.tex".to_string()),
            IndexWrite::Delete("chara/new.tex.flag".to_string()),
            IndexWrite::Primary("chara/new.tex".to_string(), 0),
            IndexWrite::Secondary("chara/new.tex".to_string(), 0),
        ]
    );
    assert!(fx.on_disk().mods[0].is_blank());
}

#[test]
fn test_delete_disabled_tool_added_skips_redirect() {
    let mut added = entry("chara/new.tex", None, false, 0, 200);
    added.source = TOOL_ADDED_SOURCE.to_string();
    let mut fx = Fixture::new(vec![], vec![added]);

    fx.ledger.delete_mod("chara/new.tex").unwrap();

    assert_eq!(
        fx.index().writes,
        vec![
            IndexWrite::Delete("chara/new.tex".to_string()),
            IndexWrite::Delete("chara/new.tex.flag".to_string()),
        ]
    );
}

#[test]
fn test_delete_mod_empty_path() {
    let mut fx = Fixture::new(vec![], vec![entry("chara/a.tex", None, true, 100, 200)]);
    let before = fx.on_disk();

    let err = fx.ledger.delete_mod("").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(fx.index().writes.is_empty());
    assert_eq!(fx.on_disk(), before);
}

#[test]
fn test_delete_mod_pack_fails_fast_without_saving() {
    let mut fx = Fixture::new(
        vec![pack("Foo")],
        vec![
            entry("chara/a.tex", Some("Foo"), true, 100, 200),
            entry("chara/b.tex", Some("Foo"), true, 300, 400),
            entry("chara/c.tex", Some("Foo"), true, 500, 600),
        ],
    );
    let before = fx.on_disk();
    fx.index().fail_primary = Some("chara/b.tex".to_string());

    let err = fx.ledger.delete_mod_pack("Foo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialBatch);
    match err {
        Error::BatchInterrupted {
            failed_path,
            applied,
            total,
            ..
        } => {
            assert_eq!(failed_path, "chara/b.tex");
            assert_eq!(applied, vec!["chara/a.tex".to_string()]);
            assert_eq!(total, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The first member was redirected but the ledger still records the whole pack.
    assert_eq!(fx.index().offset("chara/a.tex"), Some(100));
    assert_eq!(fx.index().offset("chara/c.tex"), Some(600));
    let after = fx.on_disk();
    assert_eq!(after, before);
    assert_eq!(after.mod_pack_count, 1);
    assert_eq!(after.active_mod_count, 3);
}

#[test]
fn test_delete_all_tool_added() {
    let mut first = entry("chara/new1.tex", None, false, 0, 200);
    first.source = TOOL_ADDED_SOURCE.to_string();
    let mut second = entry("chara/new2.tex", None, true, 0, 300);
    second.source = TOOL_ADDED_SOURCE.to_string();
    let mut fx = Fixture::new(
        vec![],
        vec![first, entry("chara/keep.tex", None, true, 100, 400), second],
    );

    assert_eq!(fx.ledger.delete_tool_added().unwrap(), 2);

    let after = fx.on_disk();
    assert_eq!(after.active_mod_count, 1);
    assert_eq!(after.empty_mod_slot_count, 2);
    assert_eq!(after.active_mods().next().unwrap().full_path, "chara/keep.tex");
    assert!(after.verify().is_empty());
}

#[test]
fn test_disable_from_legacy_ledger() {
    let mut fx = Fixture::without_ledger();
    fx.index().inner.insert("chara/a.tex", &container(), 200);
    fx.index().inner.insert("chara/b.tex", &container(), 400);

    let legacy = fx.path.with_file_name("modlist.dat");
    std::fs::write(
        legacy.as_std_path(),
        concat!(
            r#"{"source":"old","name":"A","category":"Body","fullPath":"chara/a.tex","datFile":"040000","originalOffset":100,"modOffset":200}"#,
            "\n",
            r#"{"name":"Removed","fullPath":"","datFile":"040000","originalOffset":0}"#,
            "\n\n",
            r#"{"name":"B","fullPath":"chara\\b.tex","datFile":"040000","originalOffset":300}"#,
            "\n",
        ),
    )
    .unwrap();

    assert_eq!(fx.ledger.disable_from_legacy_ledger(&legacy).unwrap(), 2);
    assert_eq!(fx.index().offset("chara/a.tex"), Some(100));
    assert_eq!(fx.index().offset("chara/b.tex"), Some(300));
    assert_eq!(
        fx.index().inner.secondary_offset("chara/b.tex", &container()),
        Some(300)
    );
    // Migration never creates the current ledger.
    assert!(!fx.ledger.store().exists());
}

#[test]
fn test_legacy_migration_stops_at_failing_record() {
    let mut fx = Fixture::without_ledger();
    fx.index().inner.insert("chara/a.tex", &container(), 200);
    fx.index().inner.insert("chara/gone.tex", &container(), 400);
    fx.index().inner.insert("chara/c.tex", &container(), 600);
    fx.index().fail_secondary = Some("chara/gone.tex".to_string());

    let legacy = fx.path.with_file_name("modlist.dat");
    std::fs::write(
        legacy.as_std_path(),
        concat!(
            r#"{"name":"A","fullPath":"chara/a.tex","datFile":"040000","originalOffset":100}"#,
            "\n",
            r#"{"name":"Gone","fullPath":"chara/gone.tex","datFile":"040000","originalOffset":300}"#,
            "\n",
            r#"{"name":"C","fullPath":"chara/c.tex","datFile":"040000","originalOffset":500}"#,
            "\n",
        ),
    )
    .unwrap();

    let err = fx.ledger.disable_from_legacy_ledger(&legacy).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MigrationRecord);
    match err {
        Error::MigrationRecord {
            line, name, path, ..
        } => {
            assert_eq!(line, 2);
            assert_eq!(name, "Gone");
            assert_eq!(path, "chara/gone.tex");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(fx.index().offset("chara/a.tex"), Some(100));
    assert_eq!(fx.index().offset("chara/c.tex"), Some(600));
}

#[test]
fn test_counts_hold_across_operations() {
    let mut fx = Fixture::new(
        vec![pack("Foo")],
        vec![
            entry("chara/a.tex", Some("Foo"), false, 100, 200),
            entry("chara/b.tex", None, false, 300, 400),
            entry("chara/c.tex", Some("Foo"), true, 500, 600),
            entry("chara/d.tex", None, true, 700, 800),
        ],
    );
    let check = |ledger: &Ledger| {
        assert_eq!(
            ledger.active_mod_count + ledger.empty_mod_slot_count,
            ledger.mods.len()
        );
        assert!(ledger.verify().is_empty(), "{:?}", ledger.verify());
    };

    fx.ledger.toggle_all(true).unwrap();
    check(&fx.on_disk());
    fx.ledger.delete_mod("chara/b.tex").unwrap();
    check(&fx.on_disk());
    fx.ledger.toggle_group(&ModGroup::Standalone, false).unwrap();
    check(&fx.on_disk());
    fx.ledger.delete_mod_pack("Foo").unwrap();
    check(&fx.on_disk());
    fx.ledger.toggle_all(false).unwrap();
    check(&fx.on_disk());

    let after = fx.on_disk();
    assert_eq!(after.active_mod_count, 1);
    assert_eq!(after.empty_mod_slot_count, 3);

    // A freed slot is reused by the next insert.
    let mut doc = after;
    let slot = doc
        .insert_mod(entry("chara/e.tex", None, false, 900, 1000))
        .unwrap();
    assert_eq!(slot, 0);
    check(&doc);
}

#[test]
fn test_find_entry() {
    let mut fx = Fixture::new(vec![], vec![entry("chara/a.tex", None, true, 100, 200)]);
    let found = fx.ledger.find_entry("chara\\a.tex").unwrap().unwrap();
    assert_eq!(found.offsets.mod_offset, 200);
    assert!(fx.ledger.find_entry("chara/b.tex").unwrap().is_none());
    assert!(fx.ledger.find_entry("").unwrap().is_none());

    let mut missing = Fixture::without_ledger();
    assert!(missing.ledger.find_entry("chara/a.tex").unwrap().is_none());
}
