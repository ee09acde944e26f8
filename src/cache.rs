use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::instance::Instance;
use crate::{AsshError, Result};

/// How long a snapshot stays fresh. Instance topology changes are infrequent
/// relative to session launches, so one minute bounds staleness without a
/// network round trip on every invocation.
pub const CACHE_TTL_SECS: f64 = 60.0;

/// The upstream inventory collaborator. Rate limits, auth, and pagination are
/// its concern; it returns running instances only.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch_running(&self) -> Result<Vec<Instance>>;
}

/// On-disk snapshot: the cached inventory plus its fetch timestamp, replaced
/// wholesale on refresh and never mutated in place.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    fetched_at: f64,
    instances: Vec<Instance>,
}

/// TTL-bounded cache of the instance inventory.
///
/// The snapshot file is shared across separate invocations, not threads, and
/// carries no lock: two invocations racing the TTL boundary may both refresh.
/// Writes go through a temp-file-then-rename so a concurrent reader never
/// sees a torn file; last rename wins.
pub struct InstanceCache {
    dir: PathBuf,
}

impl InstanceCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Single fixed cache scope regardless of region or profile. Known
    /// limitation: multi-region use collides on this one file.
    fn snapshot_path(&self) -> PathBuf {
        self.dir.join("instances-default.json")
    }

    /// Return the cached inventory if it is fresh, otherwise refresh from
    /// `source` and persist the new snapshot.
    ///
    /// A persist failure after a successful fetch is logged but does not
    /// discard the freshly fetched list.
    pub async fn fetch(&self, source: &dyn InventorySource) -> Result<Vec<Instance>> {
        std::fs::create_dir_all(&self.dir).map_err(AsshError::cache_io)?;

        let now = unix_now();

        if let Some(snapshot) = self.read_snapshot()? {
            if now - snapshot.fetched_at < CACHE_TTL_SECS {
                debug!(
                    age_secs = now - snapshot.fetched_at,
                    count = snapshot.instances.len(),
                    "using cached inventory"
                );
                return Ok(snapshot.instances);
            }
        }

        debug!("cache stale or missing, fetching inventory");
        let instances = source.fetch_running().await?;

        let snapshot = Snapshot {
            fetched_at: now,
            instances,
        };
        if let Err(e) = self.write_snapshot(&snapshot) {
            warn!("failed to persist instance cache: {e}");
        }

        Ok(snapshot.instances)
    }

    /// Read the current snapshot. Missing or corrupt files force a refresh;
    /// an unreadable file is a hard cache error.
    fn read_snapshot(&self) -> Result<Option<Snapshot>> {
        let path = self.snapshot_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AsshError::cache_io(e)),
        };

        match serde_json::from_str(&content) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!("ignoring corrupt cache file {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    /// Atomic replace: write next to the snapshot, then rename over it.
    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let path = self.snapshot_path();
        let tmp = path.with_extension("json.tmp");

        let content = serde_json::to_string(snapshot)?;
        std::fs::write(&tmp, content).map_err(AsshError::cache_io)?;
        std::fs::rename(&tmp, &path).map_err(AsshError::cache_io)?;

        Ok(())
    }
}

fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::sample_instance;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InventorySource for CountingSource {
        async fn fetch_running(&self) -> Result<Vec<Instance>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![sample_instance()])
        }
    }

    struct FailingSource;

    #[async_trait]
    impl InventorySource for FailingSource {
        async fn fetch_running(&self) -> Result<Vec<Instance>> {
            Err(AsshError::Fetch("upstream unavailable".to_string()))
        }
    }

    fn write_snapshot_aged(cache: &InstanceCache, age_secs: f64) {
        let snapshot = Snapshot {
            fetched_at: unix_now() - age_secs,
            instances: vec![sample_instance()],
        };
        cache.write_snapshot(&snapshot).unwrap();
    }

    #[tokio::test]
    async fn test_first_fetch_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = InstanceCache::new(dir.path().join("cache"));
        let source = CountingSource::new();

        let instances = cache.fetch(&source).await.unwrap();

        assert_eq!(instances, vec![sample_instance()]);
        assert_eq!(source.call_count(), 1);
        assert!(cache.snapshot_path().exists());

        let raw = std::fs::read_to_string(cache.snapshot_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["fetched_at"].is_f64());
        assert!(value["instances"].is_array());
    }

    #[tokio::test]
    async fn test_fresh_snapshot_skips_source() {
        let dir = tempfile::tempdir().unwrap();
        let cache = InstanceCache::new(dir.path());
        write_snapshot_aged(&cache, 30.0);

        let source = CountingSource::new();
        let instances = cache.fetch(&source).await.unwrap();

        assert_eq!(instances, vec![sample_instance()]);
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_snapshot_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = InstanceCache::new(dir.path());
        write_snapshot_aged(&cache, 90.0);

        let source = CountingSource::new();
        cache.fetch(&source).await.unwrap();

        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_back_to_back_fetches_hit_source_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = InstanceCache::new(dir.path());
        let source = CountingSource::new();

        cache.fetch(&source).await.unwrap();
        cache.fetch(&source).await.unwrap();

        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_forces_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let cache = InstanceCache::new(dir.path());
        std::fs::write(cache.snapshot_path(), "{not json").unwrap();

        let source = CountingSource::new();
        let instances = cache.fetch(&source).await.unwrap();

        assert_eq!(instances, vec![sample_instance()]);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let cache = InstanceCache::new(dir.path());

        let err = cache.fetch(&FailingSource).await.unwrap_err();
        assert!(matches!(err, AsshError::Fetch(_)));
    }
}
