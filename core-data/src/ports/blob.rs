use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("storage transport error: {0}")]
    Transport(String),
}

/// Object storage for the structural-chart files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the bytes and returns the public URL they are served from.
    async fn upload(&self, filename: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, BlobError>;
}

/// Keeps uploads in memory; URLs use the `memory://` scheme.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object(&self, url: &str) -> Option<(String, Vec<u8>)> {
        self.objects.read().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, filename: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, BlobError> {
        if filename.trim().is_empty() {
            return Err(BlobError::Rejected("empty filename".to_string()));
        }
        let url = format!("memory://documentos/{}", filename);
        self.objects
            .write()
            .await
            .insert(url.clone(), (content_type.to_string(), bytes));
        Ok(url)
    }
}
