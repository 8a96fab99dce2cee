use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::not_found(format!("Object not found: {}", key)),
            StorageError::InvalidKey(key) => AppError::bad_request(format!("Invalid object key: {}", key)),
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key`, returning its public URL.
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String, StorageError>;
    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError>;
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError>;
    /// Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<(), StorageError>;
    fn public_url(&self, key: &str) -> String;
}

/// Key for a new image under an exhibition.
pub fn object_key(exhibition_id: &str, content_type: &str) -> String {
    format!(
        "{}{}.{}",
        crate::models::exhibition::storage_prefix(exhibition_id),
        uuid::Uuid::new_v4(),
        extension_for(content_type)
    )
}

pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next().map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Keys are relative, slash separated and may not climb out of the root.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let path = Path::new(key);
    let valid = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

pub struct LocalStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        let path = self.base_path.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(self.public_url(key))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        match fs::read(self.base_path.join(key)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        let trimmed = prefix.trim_end_matches('/');
        validate_key(trimmed)?;

        let root = self.base_path.join(trimmed);
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                let path = entry.path();
                if metadata.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.base_path) {
                    let key = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    objects.push(StoredObject {
                        key,
                        size: metadata.len(),
                    });
                }
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            validate_key(key)?;
            match fs::remove_file(self.base_path.join(key)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}

/// Object storage behind a REST bucket API (`/object/{bucket}/{key}`).
pub struct BucketStorage {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
    public_base_url: String,
}

#[derive(Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: u32,
    offset: u32,
}

#[derive(Deserialize)]
struct ListEntry {
    name: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: Option<ListMetadata>,
}

#[derive(Deserialize)]
struct ListMetadata {
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    prefixes: &'a [String],
}

impl BucketStorage {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        service_key: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            service_key: service_key.into(),
            public_base_url: public_base_url.into(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, key)
    }

    async fn check(response: reqwest::Response, key: &str) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Backend(format!("bucket API returned {}: {}", status, body)))
    }
}

#[async_trait]
impl ObjectStorage for BucketStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Self::check(response, key).await?;
        Ok(self.public_url(key))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        let response = self
            .client
            .get(self.object_url(key))
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let response = Self::check(response, key).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        let prefix = prefix.trim_end_matches('/');
        let response = self
            .client
            .post(format!("{}/object/list/{}", self.base_url, self.bucket))
            .bearer_auth(&self.service_key)
            .json(&ListRequest {
                prefix,
                limit: 1000,
                offset: 0,
            })
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let entries: Vec<ListEntry> = Self::check(response, prefix)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        // Folder placeholders come back without an id.
        Ok(entries
            .into_iter()
            .filter(|e| e.id.is_some())
            .map(|e| StoredObject {
                key: format!("{}/{}", prefix, e.name),
                size: e.metadata.and_then(|m| m.size).unwrap_or(0),
            })
            .collect())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        if keys.is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .delete(format!("{}/object/{}", self.base_url, self.bucket))
            .bearer_auth(&self.service_key)
            .json(&DeleteRequest { prefixes: keys })
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Self::check(response, &self.bucket).await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}

/// In-process storage for tests and demos.
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    public_base_url: String,
}

impl MemoryStorage {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            public_base_url: public_base_url.into(),
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        self.objects.write().await.insert(key.to_string(), data);
        Ok(self.public_url(key))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        Ok(self
            .objects
            .read()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, data)| StoredObject {
                key: key.clone(),
                size: data.len() as u64,
            })
            .collect())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}
