//! Integration tests for the classification pipeline
//!
//! These drive a full batch run against an in-test file source and an
//! in-test oracle module whose classification word is embedded in the file
//! bytes, so cache behavior, date gating, and protocol handling can be
//! verified end to end.

use sapscope_core::cache::ResultCache;
use sapscope_core::codec::{self, Protocol};
use sapscope_core::error::{Error, Result};
use sapscope_core::oracle::{ArenaBridge, OracleModule, PAGE_SIZE};
use sapscope_core::pipeline::ClassificationPipeline;
use sapscope_core::sink::RemoteSink;
use sapscope_core::source::FileSource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// In-memory file source. Keys listed in insertion order, duplicates
/// allowed.
struct FakeSource {
    keys: Vec<String>,
    files: HashMap<String, Vec<u8>>,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            keys: Vec::new(),
            files: HashMap::new(),
        }
    }

    /// Add a file whose bytes carry the raw word the oracle will answer.
    fn add_raw(&mut self, key: &str, raw: i64) {
        self.keys.push(key.to_string());
        self.files
            .insert(key.to_string(), format!("raw:{}", raw).into_bytes());
    }

    /// Add a listing entry with no backing bytes (fetch fails).
    fn add_unreadable(&mut self, key: &str) {
        self.keys.push(key.to_string());
    }

    /// List the same key again without re-adding bytes.
    fn relist(&mut self, key: &str) {
        self.keys.push(key.to_string());
    }
}

impl FileSource for FakeSource {
    fn list_candidates(&self) -> Result<Vec<String>> {
        Ok(self.keys.clone())
    }

    fn fetch_bytes(&self, file_key: &str) -> Result<Vec<u8>> {
        self.files.get(file_key).cloned().ok_or_else(|| Error::Source {
            file_key: file_key.to_string(),
            message: "unreadable".to_string(),
        })
    }
}

/// In-test module: classifies by parsing the `raw:<n>` marker the source
/// wrote into the arena, so the answer travels with the file bytes.
struct FakeModule {
    memory: Vec<u8>,
    bump: usize,
    protocol: Protocol,
    classify_calls: Arc<AtomicUsize>,
}

impl FakeModule {
    fn new(protocol: Protocol, classify_calls: Arc<AtomicUsize>) -> Self {
        Self {
            memory: vec![0; PAGE_SIZE],
            bump: 0,
            protocol,
            classify_calls,
        }
    }
}

impl OracleModule for FakeModule {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn memory_size(&self) -> usize {
        self.memory.len()
    }

    fn grow(&mut self, additional_pages: u32) -> Result<()> {
        self.memory
            .resize(self.memory.len() + additional_pages as usize * PAGE_SIZE, 0);
        Ok(())
    }

    fn alloc(&mut self, size: usize) -> Result<u32> {
        let ptr = self.bump as u32;
        self.bump += size;
        Ok(ptr)
    }

    fn write(&mut self, ptr: u32, bytes: &[u8]) -> Result<()> {
        let start = ptr as usize;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn classify(&mut self, ptr: u32, len: usize) -> Result<i64> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        let bytes = &self.memory[ptr as usize..ptr as usize + len];
        let text = std::str::from_utf8(bytes).unwrap_or("");
        Ok(text
            .strip_prefix("raw:")
            .and_then(|n| n.parse::<i64>().ok())
            .unwrap_or(codec::SENTINEL))
    }

    fn debug_sum(&mut self, ptr: u32, len: usize) -> Result<u64> {
        let bytes = &self.memory[ptr as usize..ptr as usize + len];
        Ok(bytes.iter().map(|&b| b as u64).sum())
    }
}

struct Harness {
    bridge: ArenaBridge,
    cache: ResultCache,
    sink: RemoteSink,
    classify_calls: Arc<AtomicUsize>,
    _dir: Option<TempDir>,
}

impl Harness {
    fn new(protocol: Protocol) -> Self {
        let dir = TempDir::new().unwrap();
        let mut harness = Self::at_cache_path(protocol, &dir.path().join("results.json"));
        harness._dir = Some(dir);
        harness
    }

    fn at_cache_path(protocol: Protocol, cache_path: &std::path::Path) -> Self {
        let classify_calls = Arc::new(AtomicUsize::new(0));
        let module = FakeModule::new(protocol, classify_calls.clone());
        let bridge = ArenaBridge::new(Box::new(module), 4).unwrap();
        let cache = ResultCache::load(cache_path);
        Self {
            bridge,
            cache,
            sink: RemoteSink::disabled(),
            classify_calls,
            _dir: None,
        }
    }

    fn run(&mut self, source: &FakeSource, min_date: i64) -> sapscope_core::ScanReport {
        ClassificationPipeline::new(&mut self.bridge, &mut self.cache, &self.sink)
            .run(source, min_date)
            .unwrap()
    }

    fn calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }
}

#[test]
fn test_scan_classifies_caches_and_reports() {
    let mut source = FakeSource::new();
    source.add_raw("a_20230815-1.png", codec::encode(2, true, 12));
    source.add_raw("b_20230816-1.png", codec::encode(0, false, 21));
    source.add_raw("junk_20230816-2.png", -1);

    let mut h = Harness::new(Protocol::TurnCount);
    let report = h.run(&source, 0);

    assert_eq!(report.summary.files_total, 3);
    assert_eq!(report.summary.classified, 3);
    assert_eq!(report.summary.not_screenshots, 1);
    assert!(report.summary.errors.is_empty());

    assert_eq!(report.results.len(), 2);
    let a = &report.results[0];
    assert_eq!(
        (a.heart_count, a.has_bandage, a.turn_count),
        (2, true, Some(12))
    );

    // The sentinel outcome is cached with zeroed fields.
    let junk = h.cache.get("junk_20230816-2.png").unwrap();
    assert!(!junk.valid);
    assert_eq!((junk.heart_count, junk.has_bandage, junk.turn_count), (0, false, Some(0)));
}

#[test]
fn test_second_run_hits_cache_without_oracle_calls() {
    let mut source = FakeSource::new();
    source.add_raw("a_20230815-1.png", codec::encode(3, false, 14));
    source.add_raw("junk_20230815-2.png", -1);

    let mut h = Harness::new(Protocol::TurnCount);
    h.run(&source, 0);
    assert_eq!(h.calls(), 2);

    let report = h.run(&source, 0);
    assert_eq!(h.calls(), 2, "cached files must not reach the oracle");
    assert_eq!(report.summary.cache_hits, 1);
    assert_eq!(report.summary.cached_invalid, 1);
    assert_eq!(report.summary.classified, 0);
    // The cached non-screenshot stays out of the result set.
    assert_eq!(report.results.len(), 1);
}

#[test]
fn test_duplicate_identifier_classified_once() {
    let mut source = FakeSource::new();
    source.add_raw("a_20230815-1.png", codec::encode(1, false, 11));
    source.relist("a_20230815-1.png");

    let mut h = Harness::new(Protocol::TurnCount);
    let report = h.run(&source, 0);

    // Cache population is synchronous with respect to the second lookup.
    assert_eq!(h.calls(), 1);
    assert_eq!(report.summary.classified, 1);
    assert_eq!(report.summary.cache_hits, 1);
    assert_eq!(report.results.len(), 1, "file_key stays unique in the result set");
}

#[test]
fn test_date_gate_skips_old_unclassified_files() {
    let mut source = FakeSource::new();
    source.add_raw("old_20230101-1.png", codec::encode(1, false, 11));
    source.add_raw("new_20230815-1.png", codec::encode(1, false, 11));
    source.add_raw("undated.png", codec::encode(1, false, 11));

    let mut h = Harness::new(Protocol::TurnCount);
    let report = h.run(&source, 20230601);

    // The old file: no oracle call, no cache write.
    assert_eq!(h.calls(), 2);
    assert_eq!(report.summary.skipped_by_date, 1);
    assert!(h.cache.get("old_20230101-1.png").is_none());
    // Files without a date token are never excluded by the gate.
    assert!(h.cache.get("undated.png").is_some());

    // A later run with a lower threshold picks the skipped file up.
    let report = h.run(&source, 0);
    assert_eq!(h.calls(), 3);
    assert_eq!(report.summary.skipped_by_date, 0);
    assert!(h.cache.get("old_20230101-1.png").is_some());
}

#[test]
fn test_cached_files_are_exempt_from_date_gate() {
    let mut source = FakeSource::new();
    source.add_raw("old_20230101-1.png", codec::encode(1, false, 11));

    let mut h = Harness::new(Protocol::TurnCount);
    h.run(&source, 0);

    let report = h.run(&source, 20230601);
    assert_eq!(report.summary.cache_hits, 1);
    assert_eq!(report.summary.skipped_by_date, 0);
    assert_eq!(report.results.len(), 1);
}

#[test]
fn test_per_file_failure_does_not_abort_run() {
    let mut source = FakeSource::new();
    source.add_raw("a_20230815-1.png", codec::encode(1, false, 11));
    source.add_unreadable("broken_20230815-2.png");
    source.add_raw("c_20230815-3.png", codec::encode(2, false, 12));

    let mut h = Harness::new(Protocol::TurnCount);
    let report = h.run(&source, 0);

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.summary.errors.len(), 1);
    assert_eq!(report.summary.errors[0].0, "broken_20230815-2.png");
    // Failed files stay uncached, so the next full run retries naturally.
    assert!(h.cache.get("broken_20230815-2.png").is_none());
}

#[test]
fn test_legacy_protocol_results_have_no_turn_count() {
    let mut source = FakeSource::new();
    source.add_raw("a_20230815-1.png", 0x0b);

    let mut h = Harness::new(Protocol::Legacy);
    let report = h.run(&source, 0);

    let a = &report.results[0];
    assert_eq!((a.heart_count, a.has_bandage), (3, true));
    assert!(a.is_legacy());
}

#[test]
fn test_legacy_cache_entries_survive_protocol_upgrade() {
    let mut source = FakeSource::new();
    source.add_raw("a_20230815-1.png", 0x0b);

    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("results.json");

    let mut h = Harness::at_cache_path(Protocol::Legacy, &cache_path);
    h.run(&source, 0);
    drop(h);

    // Same cache, module now speaking the current protocol.
    let mut h = Harness::at_cache_path(Protocol::TurnCount, &cache_path);
    let report = h.run(&source, 0);

    // Served from cache, never reinterpreted under the new protocol.
    assert_eq!(h.calls(), 0);
    assert!(report.results[0].is_legacy());
}

#[test]
fn test_arena_exhaustion_is_local_to_the_file() {
    let mut source = FakeSource::new();
    // Big enough to blow through the 1-page ceiling on its own.
    let big = vec![b'x'; 2 * PAGE_SIZE];
    source.keys.push("big_20230815-1.png".to_string());
    source.files.insert("big_20230815-1.png".to_string(), big);
    source.add_raw("small_20230815-2.png", codec::encode(1, false, 11));

    let dir = TempDir::new().unwrap();
    let classify_calls = Arc::new(AtomicUsize::new(0));
    let module = FakeModule::new(Protocol::TurnCount, classify_calls);
    let mut bridge = ArenaBridge::new(Box::new(module), 1).unwrap();
    let mut cache = ResultCache::load(&dir.path().join("results.json"));
    let sink = RemoteSink::disabled();

    let report = ClassificationPipeline::new(&mut bridge, &mut cache, &sink)
        .run(&source, 0)
        .unwrap();

    assert_eq!(report.summary.errors.len(), 1);
    assert!(report.summary.errors[0].1.contains("arena exhausted"));
    assert_eq!(report.results.len(), 1);
}
