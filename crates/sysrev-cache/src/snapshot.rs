//! Durable snapshot format: versioned JSON, optionally gzip-compressed.
//!
//! A dump is a full-file overwrite written to a temporary file in the target
//! directory and atomically renamed into place, so a failed checkpoint never
//! leaves a half-written snapshot behind.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sysrev_common::{Result, SysrevError};
use sysrev_model::{SearchRequest, SearchResponse, Source};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::SearchCache;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    created_at: DateTime<Utc>,
    ignore_case: bool,
    entries: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    source: Source,
    request: SearchRequest,
    responses: Vec<SearchResponse>,
}

impl SearchCache {
    /// Serialize the full cache state to `path`.
    ///
    /// Raw provenance payloads are not persisted; everything that `len()` and
    /// `contains()` observe survives a round-trip.
    pub fn dump(&self, path: &Path, compress: bool) -> Result<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            ignore_case: self.ignore_case,
            entries: self
                .data
                .iter()
                .flat_map(|(source, requests)| {
                    requests.iter().map(|(request, responses)| SnapshotEntry {
                        source: *source,
                        request: request.clone(),
                        responses: responses.clone(),
                    })
                })
                .collect(),
        };

        let mut encoded = Vec::new();
        if compress {
            let mut encoder = GzEncoder::new(&mut encoded, Compression::default());
            serde_json::to_writer(&mut encoder, &snapshot)?;
            encoder.finish().map_err(SysrevError::DurableWrite)?;
        } else {
            serde_json::to_writer(&mut encoded, &snapshot)?;
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(SysrevError::DurableWrite)?;
        tmp.write_all(&encoded).map_err(SysrevError::DurableWrite)?;
        tmp.as_file().sync_all().map_err(SysrevError::DurableWrite)?;
        tmp.persist(path)
            .map_err(|e| SysrevError::DurableWrite(e.error))?;

        debug!(
            path = %path.display(),
            responses = self.len(),
            compress,
            "cache snapshot written"
        );
        Ok(())
    }

    /// Reconstruct a cache from a prior dump.
    ///
    /// Any decode problem (unreadable file, gzip error, malformed JSON,
    /// version mismatch) surfaces as `CorruptCache`; callers must not paper
    /// over it with an empty cache.
    pub fn load(path: &Path, compress: bool) -> Result<SearchCache> {
        let file = File::open(path).map_err(|e| {
            SysrevError::CorruptCache(format!("cannot open {}: {e}", path.display()))
        })?;
        let reader = BufReader::new(file);

        let snapshot: Snapshot = if compress {
            serde_json::from_reader(GzDecoder::new(reader))
        } else {
            serde_json::from_reader(reader)
        }
        .map_err(|e| SysrevError::CorruptCache(format!("{}: {e}", path.display())))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SysrevError::CorruptCache(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let mut data: HashMap<Source, HashMap<SearchRequest, Vec<SearchResponse>>> =
            HashMap::new();
        for entry in snapshot.entries {
            data.entry(entry.source)
                .or_default()
                .insert(entry.request, entry.responses);
        }

        let cache = SearchCache {
            ignore_case: snapshot.ignore_case,
            data,
        };
        info!(
            path = %path.display(),
            responses = cache.len(),
            created_at = %snapshot.created_at,
            "cache snapshot loaded"
        );
        Ok(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sysrev_model::{Article, SearchRequestSource, SearchToken};

    fn sample_cache() -> (SearchCache, Vec<SearchRequestSource>) {
        let mut cache = SearchCache::new(true);
        let keys = vec![
            SearchRequestSource::new(
                SearchRequest::new(SearchToken::Term, "bft"),
                Source::Scopus,
            ),
            SearchRequestSource::new(
                SearchRequest::new(SearchToken::Author, "barbara liskov"),
                Source::GoogleScholar,
            ),
        ];
        for (i, key) in keys.iter().enumerate() {
            let mut article = Article::new(format!("Paper {i}"));
            article.year = Some(1999 + i as i32);
            article.push_author("José da Silva");
            cache.put(key, SearchResponse::new(key.clone(), article));
        }
        (cache, keys)
    }

    #[test]
    fn round_trip_uncompressed() {
        let (cache, keys) = sample_cache();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sr");

        cache.dump(&path, false).unwrap();
        let loaded = SearchCache::load(&path, false).unwrap();

        assert_eq!(loaded.len(), cache.len());
        assert_eq!(loaded.ignore_case(), cache.ignore_case());
        for key in &keys {
            assert!(loaded.contains(key));
        }
    }

    #[test]
    fn round_trip_compressed() {
        let (cache, keys) = sample_cache();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sr.gz");

        cache.dump(&path, true).unwrap();
        let loaded = SearchCache::load(&path, true).unwrap();

        assert_eq!(loaded.len(), cache.len());
        for key in &keys {
            assert!(loaded.contains(key));
        }
    }

    #[test]
    fn dump_overwrites_previous_snapshot() {
        let (mut cache, keys) = sample_cache();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sr");

        cache.dump(&path, false).unwrap();
        cache.remove_bucket(&keys[0]).unwrap();
        cache.dump(&path, false).unwrap();

        let loaded = SearchCache::load(&path, false).unwrap();
        assert_eq!(loaded.len(), cache.len());
        assert!(!loaded.contains(&keys[0]));
    }

    #[test]
    fn truncated_snapshot_is_corrupt() {
        let (cache, _) = sample_cache();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sr");
        cache.dump(&path, false).unwrap();

        let full = std::fs::read(&path).unwrap();
        std::fs::write(&path, &full[..full.len() / 2]).unwrap();

        let err = SearchCache::load(&path, false).unwrap_err();
        assert!(matches!(err, SysrevError::CorruptCache(_)));
    }

    #[test]
    fn garbage_bytes_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sr");
        std::fs::write(&path, b"not a snapshot").unwrap();

        assert!(matches!(
            SearchCache::load(&path, false),
            Err(SysrevError::CorruptCache(_))
        ));
        // Same bytes under the compressed flag fail in the gzip layer.
        assert!(matches!(
            SearchCache::load(&path, true),
            Err(SysrevError::CorruptCache(_))
        ));
    }

    #[test]
    fn version_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sr");
        let body = serde_json::json!({
            "version": 99,
            "created_at": Utc::now(),
            "ignore_case": true,
            "entries": [],
        });
        std::fs::write(&path, serde_json::to_vec(&body).unwrap()).unwrap();

        let err = SearchCache::load(&path, false).unwrap_err();
        assert!(matches!(err, SysrevError::CorruptCache(_)));
    }

    #[test]
    fn missing_file_is_corrupt_not_silent() {
        let dir = tempfile::tempdir().unwrap();
        let err = SearchCache::load(&dir.path().join("absent.sr"), false).unwrap_err();
        assert!(matches!(err, SysrevError::CorruptCache(_)));
    }

    #[test]
    fn raw_payloads_are_not_persisted() {
        let mut cache = SearchCache::new(false);
        let key = SearchRequestSource::new(
            SearchRequest::new(SearchToken::Term, "BFT"),
            Source::Ieee,
        );
        let response = SearchResponse::new(key.clone(), Article::new("Practical BFT"))
            .with_raw(serde_json::json!({"page": 1}));
        cache.put(&key, response);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sr");
        cache.dump(&path, false).unwrap();

        let loaded = SearchCache::load(&path, false).unwrap();
        let bucket = loaded.get(&key).unwrap();
        assert_eq!(bucket.len(), 1);
        assert!(bucket[0].raw.is_none());
        // Still equal to the original response: raw is ignored by equality.
        assert!(cache.get(&key).unwrap()[0] == bucket[0]);
    }
}
