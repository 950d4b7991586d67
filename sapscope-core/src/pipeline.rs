//! Classification pipeline
//!
//! Orchestrates one batch run: for each candidate identifier, consult the
//! cache, apply the minimum-date gate, and only then pay for a byte fetch
//! and an oracle call. Every completed classification (win or sentinel) is
//! written through to the cache so no file is ever classified twice.
//!
//! Files are processed strictly in the order given, one at a time. The
//! arena is a single shared append-only region with no free; interleaving
//! allocations from two in-flight files would corrupt both, so sequential
//! processing is a design constraint here, not a missed optimization.
//! Per-file failures are caught, logged, and counted; only candidate
//! listing failure aborts the run.

use crate::cache::ResultCache;
use crate::codec;
use crate::datekey;
use crate::error::Result;
use crate::oracle::ArenaBridge;
use crate::sink::RemoteSink;
use crate::source::FileSource;
use crate::types::ScreenshotResult;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

/// Counters for one batch run.
#[derive(Debug, Default, Serialize)]
pub struct ScanSummary {
    /// Number of candidate identifiers listed
    pub files_total: usize,
    /// Valid results served from the cache (no oracle call)
    pub cache_hits: usize,
    /// Cached non-screenshots skipped without reprocessing
    pub cached_invalid: usize,
    /// Unclassified files below the minimum-date gate (left uncached,
    /// eligible for a future run with a lower threshold)
    pub skipped_by_date: usize,
    /// Oracle calls that completed
    pub classified: usize,
    /// Freshly classified files the oracle rejected with the sentinel
    pub not_screenshots: usize,
    /// Per-file failures (file key, error message); the run continued past
    /// each one
    pub errors: Vec<(String, String)>,
}

/// Outcome of one batch run.
///
/// Each run owns its result set and is tagged with a fresh `run_id`, so
/// output from an abandoned run can never be merged into a newer one.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub run_id: String,
    /// Valid results accumulated this run (cache hits plus fresh wins),
    /// unique per file key, in candidate order
    pub results: Vec<ScreenshotResult>,
    pub summary: ScanSummary,
}

/// Per-file orchestration over a source, the arena bridge, and the cache.
pub struct ClassificationPipeline<'a> {
    bridge: &'a mut ArenaBridge,
    cache: &'a mut ResultCache,
    sink: &'a RemoteSink,
}

impl<'a> ClassificationPipeline<'a> {
    pub fn new(
        bridge: &'a mut ArenaBridge,
        cache: &'a mut ResultCache,
        sink: &'a RemoteSink,
    ) -> Self {
        Self {
            bridge,
            cache,
            sink,
        }
    }

    /// Run the batch over every candidate the source lists.
    ///
    /// `min_date` is a `YYYYMMDD` number gating which *unclassified* files
    /// are processed; cached files are exempt.
    pub fn run(&mut self, source: &dyn FileSource, min_date: i64) -> Result<ScanReport> {
        self.run_with_progress(source, min_date, |_, _, _| {})
    }

    /// Run the batch with a progress callback receiving
    /// `(current_index, total, file_key)` before each candidate.
    pub fn run_with_progress<F>(
        &mut self,
        source: &dyn FileSource,
        min_date: i64,
        mut on_progress: F,
    ) -> Result<ScanReport>
    where
        F: FnMut(usize, usize, &str),
    {
        let run_id = Uuid::new_v4().to_string();
        let keys = source.list_candidates()?;
        let total = keys.len();

        tracing::info!(run_id = %run_id, candidates = total, min_date, "Scan started");
        self.sink.log(json!({
            "run_id": run_id,
            "event": "listed",
            "count": total,
        }));

        let mut summary = ScanSummary {
            files_total: total,
            ..Default::default()
        };
        let mut results: Vec<ScreenshotResult> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (i, key) in keys.iter().enumerate() {
            on_progress(i, total, key);

            // Cached entries are never reprocessed, valid or not.
            if let Some(cached) = self.cache.get(key) {
                if cached.valid {
                    summary.cache_hits += 1;
                    if seen.insert(key.clone()) {
                        results.push(cached.clone());
                    }
                } else {
                    summary.cached_invalid += 1;
                }
                continue;
            }

            // The date gate applies only to files that would need a fresh
            // oracle call. Skipped files stay uncached so a lower
            // threshold can pick them up later.
            if datekey::sort_key(key) < min_date {
                summary.skipped_by_date += 1;
                continue;
            }

            match self.classify_one(&run_id, source, key) {
                Ok(result) => {
                    summary.classified += 1;
                    if !result.valid {
                        summary.not_screenshots += 1;
                    }
                    // Write-through happens before the next lookup, so a
                    // duplicate later in the list becomes a cache hit.
                    self.cache.put(result.clone());
                    if result.valid && seen.insert(key.clone()) {
                        results.push(result);
                    }
                }
                Err(e) => {
                    tracing::warn!(run_id = %run_id, file_key = %key, error = %e, "File failed");
                    self.sink.log(json!({
                        "run_id": run_id,
                        "event": "file_error",
                        "file_key": key,
                        "error": e.to_string(),
                    }));
                    summary.errors.push((key.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            run_id = %run_id,
            wins = results.len(),
            classified = summary.classified,
            errors = summary.errors.len(),
            "Scan complete"
        );
        self.sink.log(json!({
            "run_id": run_id,
            "event": "complete",
            "files_total": summary.files_total,
            "wins": results.len(),
        }));

        Ok(ScanReport {
            run_id,
            results,
            summary,
        })
    }

    /// Fetch, hand the bytes to the arena bridge, decode the raw word.
    fn classify_one(
        &mut self,
        run_id: &str,
        source: &dyn FileSource,
        key: &str,
    ) -> Result<ScreenshotResult> {
        let bytes = source.fetch_bytes(key)?;
        tracing::debug!(file_key = %key, size = bytes.len(), "Fetched file");
        self.sink.log(json!({
            "run_id": run_id,
            "event": "fetched",
            "file_key": key,
            "size": bytes.len(),
        }));

        let raw = self.bridge.classify_bytes(&bytes)?;
        let result = codec::decode(raw, self.bridge.protocol()).into_result(key.to_string());

        if result.valid {
            self.sink.log(json!({
                "run_id": run_id,
                "event": "win",
                "file_key": key,
                "heart_count": result.heart_count,
                "has_bandage": result.has_bandage,
                "turn_count": result.turn_count,
            }));
        } else {
            tracing::debug!(file_key = %key, "Not an outcome screenshot");
            self.sink.log(json!({
                "run_id": run_id,
                "event": "not_screenshot",
                "file_key": key,
            }));
        }

        Ok(result)
    }
}
