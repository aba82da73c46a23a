use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::record::WorkflowRecord;
use crate::models::state::WorkflowState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(String),

    #[error("record {id} changed concurrently: expected '{expected}', found '{current}'")]
    Conflict {
        id: u64,
        expected: String,
        current: String,
    },

    #[error("record {0} already exists")]
    Duplicate(u64),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistent table of workflow records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, id: u64) -> Result<WorkflowRecord, StoreError>;

    /// Every record sharing `workflow_id`, oldest first.
    async fn history(&self, workflow_id: &str) -> Result<Vec<WorkflowRecord>, StoreError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<WorkflowRecord>, StoreError>;

    async fn insert(&self, record: WorkflowRecord) -> Result<WorkflowRecord, StoreError>;

    /// Replaces the stored record only if its `estado` still equals
    /// `expected` and its version still equals `record.version()`, i.e. no
    /// other write landed since `record` was loaded. Guard and write happen
    /// as one step; the stored copy comes back with its version bumped.
    async fn update_if(
        &self,
        record: &WorkflowRecord,
        expected: &WorkflowState,
    ) -> Result<WorkflowRecord, StoreError>;
}

/// Process-local store. The write lock covers the state comparison and the
/// replacement so concurrent decisions cannot both win.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<u64, WorkflowRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, id: u64) -> Result<WorkflowRecord, StoreError> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn history(&self, workflow_id: &str) -> Result<Vec<WorkflowRecord>, StoreError> {
        let mut rows: Vec<WorkflowRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.workflow_id() == workflow_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (*r.created_at(), r.id()));
        Ok(rows)
    }

    async fn list(&self) -> Result<Vec<WorkflowRecord>, StoreError> {
        let mut rows: Vec<WorkflowRecord> = self.records.read().await.values().cloned().collect();
        rows.sort_by_key(|r| std::cmp::Reverse((*r.created_at(), r.id())));
        Ok(rows)
    }

    async fn insert(&self, record: WorkflowRecord) -> Result<WorkflowRecord, StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id()) {
            return Err(StoreError::Duplicate(record.id()));
        }
        records.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn update_if(
        &self,
        record: &WorkflowRecord,
        expected: &WorkflowState,
    ) -> Result<WorkflowRecord, StoreError> {
        let mut records = self.records.write().await;
        let stored = records
            .get_mut(&record.id())
            .ok_or_else(|| StoreError::NotFound(record.id().to_string()))?;
        if stored.estado() != expected || stored.version() != record.version() {
            return Err(StoreError::Conflict {
                id: record.id(),
                expected: format!("{} (version {})", expected, record.version()),
                current: format!("{} (version {})", stored.estado(), stored.version()),
            });
        }
        *stored = record.next_version();
        Ok(stored.clone())
    }
}
