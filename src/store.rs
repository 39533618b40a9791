use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{LectureGraphError, Result};
use crate::graph::{Concept, Relationship};

/// A registered lecture video and everything extracted from it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureRecord {
    /// Generated record identifier
    pub id: String,

    pub title: String,

    /// Object key of the uploaded video in the bucket
    pub storage_key: String,

    /// Public URL the player streams from
    pub url: Option<String>,

    /// Full transcript, once the processing backend has delivered it
    #[serde(default)]
    pub transcript: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub concepts: Vec<Concept>,

    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl LectureRecord {
    pub fn new(title: String, storage_key: String, url: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            storage_key,
            url,
            transcript: None,
            created_at: Utc::now(),
            concepts: Vec::new(),
            relationships: Vec::new(),
        }
    }
}

/// Output of the processing backend for one lecture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingResults {
    pub transcript: Option<String>,
    pub concepts: Vec<Concept>,
    pub relationships: Vec<Relationship>,
}

/// Persistence for lecture records
#[async_trait]
pub trait LectureStore: Send + Sync {
    /// Persist a new record
    async fn create_lecture(&self, record: LectureRecord) -> Result<LectureRecord>;

    /// Fetch a record with its concepts and relationships
    async fn get_lecture(&self, id: &str) -> Result<LectureRecord>;

    /// All records, newest first
    async fn list_lectures(&self) -> Result<Vec<LectureRecord>>;

    /// Attach transcript, concepts and relationships, replacing earlier results
    async fn save_processing_results(
        &self,
        id: &str,
        results: ProcessingResults,
    ) -> Result<LectureRecord>;
}

/// Lecture store keeping one JSON file per record, cached in memory
#[derive(Debug, Clone)]
pub struct JsonLectureStore {
    /// Directory holding `<id>.json` files
    data_dir: PathBuf,

    /// In-memory record cache (thread-safe)
    cache: Arc<RwLock<HashMap<String, LectureRecord>>>,
}

impl JsonLectureStore {
    /// Open a store, creating the directory and loading existing records
    pub async fn open(data_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&data_dir).await.map_err(persistence)?;

        let store = Self {
            data_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        };
        store.load_existing_records().await?;

        let count = store.cache.read().await.len();
        info!("📚 Lecture store opened at {} with {} records", store.data_dir.display(), count);

        Ok(store)
    }

    async fn load_existing_records(&self) -> Result<()> {
        let mut entries = fs::read_dir(&self.data_dir).await.map_err(persistence)?;
        let mut loaded = 0;

        while let Some(entry) = entries.next_entry().await.map_err(persistence)? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                match self.load_record_file(&path).await {
                    Ok(record) => {
                        self.cache.write().await.insert(record.id.clone(), record);
                        loaded += 1;
                    }
                    Err(e) => {
                        warn!("Failed to load lecture file {}: {}", path.display(), e);
                    }
                }
            }
        }

        debug!("📁 Loaded {} lecture files from disk", loaded);
        Ok(())
    }

    async fn load_record_file(&self, path: &Path) -> Result<LectureRecord> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", id))
    }

    /// Write through a temp file so readers never see a half-written record
    async fn write_record(&self, record: &LectureRecord) -> Result<()> {
        let path = self.record_path(&record.id);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(record)?;

        fs::write(&tmp, content).await.map_err(persistence)?;
        fs::rename(&tmp, &path).await.map_err(persistence)?;
        Ok(())
    }
}

#[async_trait]
impl LectureStore for JsonLectureStore {
    async fn create_lecture(&self, record: LectureRecord) -> Result<LectureRecord> {
        if self.cache.read().await.contains_key(&record.id) {
            return Err(LectureGraphError::Persistence(format!(
                "lecture {} already exists",
                record.id
            )));
        }

        self.write_record(&record).await?;
        self.cache.write().await.insert(record.id.clone(), record.clone());

        info!("🆕 Registered lecture '{}' ({})", record.title, record.id);
        Ok(record)
    }

    async fn get_lecture(&self, id: &str) -> Result<LectureRecord> {
        self.cache
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| LectureGraphError::NotFound(id.to_string()))
    }

    async fn list_lectures(&self) -> Result<Vec<LectureRecord>> {
        let mut records: Vec<LectureRecord> = self.cache.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn save_processing_results(
        &self,
        id: &str,
        results: ProcessingResults,
    ) -> Result<LectureRecord> {
        let mut record = self.get_lecture(id).await?;
        record.transcript = results.transcript;
        record.concepts = results.concepts;
        record.relationships = results.relationships;

        self.write_record(&record).await?;
        self.cache.write().await.insert(record.id.clone(), record.clone());

        info!(
            "💾 Saved {} concepts and {} relationships for lecture {}",
            record.concepts.len(),
            record.relationships.len(),
            id
        );
        Ok(record)
    }
}

fn persistence(err: std::io::Error) -> LectureGraphError {
    LectureGraphError::Persistence(err.to_string())
}
