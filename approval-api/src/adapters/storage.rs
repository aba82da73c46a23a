use async_trait::async_trait;
use core_data::ports::blob::{BlobError, BlobStore};
use tracing::{debug, instrument};

/// Object storage speaking the Supabase Storage REST dialect:
/// `POST {base}/storage/v1/object/{bucket}/{name}` to upload and
/// `{base}/storage/v1/object/public/{bucket}/{name}` to serve.
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: Option<String>,
}

impl HttpBlobStore {
    pub fn new(base_url: String, bucket: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            api_key,
        }
    }

    fn upload_url(&self, filename: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, filename)
    }

    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, filename)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, filename: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, BlobError> {
        let mut request = self
            .client
            .post(self.upload_url(filename))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BlobError::Rejected(format!("{}: {}", status, detail)));
        }

        let url = self.public_url(filename);
        debug!(url = %url, "Structural chart stored");
        Ok(url)
    }
}
