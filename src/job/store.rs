//! Durable job persistence to YAML files.
//!
//! Stores one record per job id in `{jobs_dir}/{id}.yaml` with an in-memory
//! cache. The store is the source of truth for what should be running; the
//! scheduler's running set is rebuilt from it on every startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::definition::JobDefinition;
use super::error::{JobError, Result};

/// Store for job definitions.
///
/// Maintains an in-memory cache backed by YAML files on disk. Writes are
/// atomic per key: a record is fully written to a temp file and renamed into
/// place, so a `put` or `delete` is never observed half-applied.
#[derive(Clone)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<String, JobDefinition>>>,
    /// Base path for job storage (e.g., `.growd/jobs`).
    jobs_path: PathBuf,
}

impl JobStore {
    /// Create a new store at the given path.
    pub fn new(jobs_path: PathBuf) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            jobs_path,
        }
    }

    /// Load all job records from disk.
    ///
    /// Call this on startup before recovery. Malformed files are skipped and
    /// recorded, never deleted.
    pub async fn load(&self) -> Result<LoadResult> {
        if !self.jobs_path.exists() {
            fs::create_dir_all(&self.jobs_path)
                .await
                .map_err(|e| JobError::Storage(e.to_string()))?;
            return Ok(LoadResult::default());
        }

        let mut loaded = 0;
        let mut errors = Vec::new();

        let mut entries = fs::read_dir(&self.jobs_path)
            .await
            .map_err(|e| JobError::Storage(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| JobError::Storage(e.to_string()))?
        {
            let path = entry.path();

            if path.is_dir() || path.extension().is_none_or(|ext| ext != "yaml") {
                continue;
            }

            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };

            match self.load_job_file(&path).await {
                Ok(definition) => {
                    let mut inner = self.inner.write().await;
                    inner.insert(id, definition);
                    loaded += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load job record");
                    errors.push((id, e.to_string()));
                }
            }
        }

        if loaded > 0 || !errors.is_empty() {
            info!(loaded = loaded, errors = errors.len(), "Loaded job records");
        }

        Ok(LoadResult { loaded, errors })
    }

    /// Load a single job record file.
    async fn load_job_file(&self, path: &Path) -> Result<JobDefinition> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| JobError::Storage(format!("read {}: {}", path.display(), e)))?;

        let definition: JobDefinition = serde_saphyr::from_str(&content)
            .map_err(|e| JobError::Storage(format!("parse {}: {}", path.display(), e)))?;

        Ok(definition)
    }

    /// Upsert a job record.
    ///
    /// Persists to disk first; the cache is only updated after the write
    /// lands, so a storage failure leaves both sides unchanged.
    pub async fn put(&self, id: &str, definition: &JobDefinition) -> Result<()> {
        self.persist(id, definition).await?;

        let mut inner = self.inner.write().await;
        inner.insert(id.to_string(), definition.clone());

        debug!(job_id = %id, job_type = %definition.job_type, "Stored job record");
        Ok(())
    }

    /// Get a job record by id.
    pub async fn get(&self, id: &str) -> Option<JobDefinition> {
        let inner = self.inner.read().await;
        inner.get(id).cloned()
    }

    /// Remove a job record.
    ///
    /// Deleting a missing id is a no-op that returns `Ok(false)`, not an
    /// error.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let existed = {
            let mut inner = self.inner.write().await;
            inner.remove(id).is_some()
        };

        let path = self.job_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(JobError::Storage(format!(
                    "delete {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        if existed {
            debug!(job_id = %id, "Deleted job record");
        }
        Ok(existed)
    }

    /// All cached records. Used at recovery; order is irrelevant.
    pub async fn list(&self) -> Vec<(String, JobDefinition)> {
        let inner = self.inner.read().await;
        inner.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Persist a record to disk.
    async fn persist(&self, id: &str, definition: &JobDefinition) -> Result<()> {
        fs::create_dir_all(&self.jobs_path)
            .await
            .map_err(|e| JobError::Storage(e.to_string()))?;

        let path = self.job_path(id);
        let content = serde_saphyr::to_string(definition)
            .map_err(|e| JobError::Storage(format!("serialize: {}", e)))?;

        // Write atomically via temp file
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, content)
            .await
            .map_err(|e| JobError::Storage(format!("write {}: {}", temp_path.display(), e)))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| JobError::Storage(format!("rename {}: {}", temp_path.display(), e)))?;

        Ok(())
    }

    /// File path for a job record.
    fn job_path(&self, id: &str) -> PathBuf {
        self.jobs_path.join(format!("{}.yaml", id))
    }

    /// Path to the jobs directory.
    pub fn path(&self) -> &Path {
        &self.jobs_path
    }
}

/// Result of loading job records from disk.
#[derive(Debug, Default)]
pub struct LoadResult {
    /// Number of records loaded.
    pub loaded: usize,
    /// Errors encountered (job id, error message).
    pub errors: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::definition::ParamValue;
    use tempfile::TempDir;

    fn test_definition(job_type: &str) -> JobDefinition {
        JobDefinition {
            job_type: job_type.to_string(),
            params: [
                ("relay".to_string(), ParamValue::Str("pump".to_string())),
                ("on_seconds".to_string(), ParamValue::Int(60)),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[tokio::test]
    async fn put_and_get_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = JobStore::new(temp_dir.path().join("jobs"));

        store.put("pump", &test_definition("cycle")).await.unwrap();

        let retrieved = store.get("pump").await.unwrap();
        assert_eq!(retrieved.job_type, "cycle");
        assert_eq!(
            retrieved.params.get("relay"),
            Some(&ParamValue::Str("pump".to_string()))
        );
    }

    #[tokio::test]
    async fn get_returns_none_for_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = JobStore::new(temp_dir.path().join("jobs"));

        assert!(store.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn put_overwrites_existing_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = JobStore::new(temp_dir.path().join("jobs"));

        store.put("pump", &test_definition("cycle")).await.unwrap();
        store.put("pump", &test_definition("poll")).await.unwrap();

        assert_eq!(store.get("pump").await.unwrap().job_type, "poll");
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_from_disk_and_cache() {
        let temp_dir = TempDir::new().unwrap();
        let store = JobStore::new(temp_dir.path().join("jobs"));

        store.put("pump", &test_definition("cycle")).await.unwrap();
        assert!(store.delete("pump").await.unwrap());
        assert!(store.get("pump").await.is_none());

        let path = temp_dir.path().join("jobs").join("pump.yaml");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn delete_missing_is_a_no_op() {
        let temp_dir = TempDir::new().unwrap();
        let store = JobStore::new(temp_dir.path().join("jobs"));

        assert!(!store.delete("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn load_recovers_records_from_disk() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = JobStore::new(temp_dir.path().join("jobs"));
            store.put("pump", &test_definition("cycle")).await.unwrap();
            store.put("fan", &test_definition("cycle")).await.unwrap();
        }

        let store = JobStore::new(temp_dir.path().join("jobs"));
        let result = store.load().await.unwrap();

        assert_eq!(result.loaded, 2);
        assert!(result.errors.is_empty());
        assert!(store.get("pump").await.is_some());
        assert!(store.get("fan").await.is_some());
    }

    #[tokio::test]
    async fn load_skips_malformed_records() {
        let temp_dir = TempDir::new().unwrap();
        let jobs_path = temp_dir.path().join("jobs");

        {
            let store = JobStore::new(jobs_path.clone());
            store.put("pump", &test_definition("cycle")).await.unwrap();
        }
        std::fs::write(jobs_path.join("broken.yaml"), "not: valid: yaml: [[[").unwrap();

        let store = JobStore::new(jobs_path.clone());
        let result = store.load().await.unwrap();

        assert_eq!(result.loaded, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].0, "broken");

        // The malformed file is left in place for inspection.
        assert!(jobs_path.join("broken.yaml").exists());
    }

    #[tokio::test]
    async fn load_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let jobs_path = temp_dir.path().join("does-not-exist-yet");
        let store = JobStore::new(jobs_path.clone());

        let result = store.load().await.unwrap();
        assert_eq!(result.loaded, 0);
        assert!(jobs_path.exists());
    }
}
