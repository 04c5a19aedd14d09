//! Three-phase upload coordination.
//!
//! A file becomes durable in two places: bytes in the bucket, metadata in the
//! database. The coordinator drives each file through slot request, transfer,
//! best-effort thumbnail, and metadata commit, and compensates by deleting
//! already-uploaded objects when the commit fails so the bucket never holds
//! blobs the gallery will serve from a missing row. The reverse (an orphaned
//! blob after a failed rollback delete) is tolerated: the metadata row is the
//! source of truth and an orphan is inert.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use uuid::Uuid;

use crate::entities::media::MediaType;
use crate::services::media::{self, SaveMediaMetadata, UploadSlot};
use crate::services::s3::StorageService;
use crate::utils::thumbnail::make_thumbnail;

pub const DEFAULT_MAX_CONCURRENT: usize = 3;
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(60);

const OCTET_STREAM: &str = "application/octet-stream";

/// Per-file lifecycle. Phases are strictly sequential within one file; files
/// never affect each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Pending,
    SlotRequested,
    Uploading,
    GeneratingThumbnail,
    MetadataCommitting,
    Success,
    Failed,
}

/// Which phase failed, with a human-readable reason. A retry re-enters at the
/// slot request; the old keys are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    Slot(String),
    Transfer(String),
    Commit(String),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::Slot(msg) => write!(f, "slot allocation failed: {}", msg),
            UploadError::Transfer(msg) => write!(f, "upload failed: {}", msg),
            UploadError::Commit(msg) => write!(f, "metadata commit failed: {}", msg),
        }
    }
}

/// The backend boundary the coordinator talks to: slot issuance and the
/// durable metadata commit.
#[async_trait]
pub trait SlotApi: Send + Sync {
    async fn request_slot(
        &self,
        guest_id: Uuid,
        file_name: &str,
        mime_type: Option<&str>,
    ) -> Result<UploadSlot, String>;

    async fn commit_metadata(&self, req: &SaveMediaMetadata) -> Result<Uuid, String>;
}

/// The blob-store boundary: write an object, best-effort delete one.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), String>;

    async fn delete(&self, key: &str) -> Result<(), String>;
}

#[async_trait]
impl BlobStore for StorageService {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), String> {
        self.put_object(key, data, content_type)
            .await
            .map_err(|e| e.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.delete_object(key).await.map_err(|e| e.to_string())
    }
}

/// In-process `SlotApi` over the database services, used when the server
/// itself drives an upload (the admin bulk import).
pub struct DirectApi {
    db: DatabaseConnection,
}

impl DirectApi {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SlotApi for DirectApi {
    async fn request_slot(
        &self,
        guest_id: Uuid,
        file_name: &str,
        mime_type: Option<&str>,
    ) -> Result<UploadSlot, String> {
        media::allocate_slot(guest_id, file_name, mime_type).map_err(|e| e.to_string())
    }

    async fn commit_metadata(&self, req: &SaveMediaMetadata) -> Result<Uuid, String> {
        media::save_media_metadata(&self.db, req)
            .await
            .map(|m| m.media_id)
            .map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub file_name: String,
    pub state: UploadState,
    pub media_id: Option<Uuid>,
    pub storage_key: Option<String>,
    pub thumbnail_key: Option<String>,
    pub error: Option<UploadError>,
}

impl UploadOutcome {
    fn failed(file_name: String, storage_key: Option<String>, error: UploadError) -> Self {
        Self {
            file_name,
            state: UploadState::Failed,
            media_id: None,
            storage_key,
            thumbnail_key: None,
            error: Some(error),
        }
    }
}

#[derive(Clone)]
pub struct UploadCoordinator {
    api: Arc<dyn SlotApi>,
    store: Arc<dyn BlobStore>,
    event_id: Uuid,
    guest_id: Uuid,
    max_concurrent: usize,
    phase_timeout: Duration,
}

impl UploadCoordinator {
    pub fn new(
        api: Arc<dyn SlotApi>,
        store: Arc<dyn BlobStore>,
        event_id: Uuid,
        guest_id: Uuid,
    ) -> Self {
        Self {
            api,
            store,
            event_id,
            guest_id,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            phase_timeout: DEFAULT_PHASE_TIMEOUT,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_phase_timeout(mut self, phase_timeout: Duration) -> Self {
        self.phase_timeout = phase_timeout;
        self
    }

    /// Upload a batch with bounded parallelism. A file enters its pipeline
    /// only when one of the `max_concurrent` slots frees up; outcomes come
    /// back in input order.
    pub async fn upload_all(&self, files: Vec<UploadFile>) -> Vec<UploadOutcome> {
        let total = files.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (idx, file) in files.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let coordinator = self.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("upload semaphore closed");
                (idx, coordinator.upload_one(file).await)
            });
        }

        let mut outcomes: Vec<Option<UploadOutcome>> = std::iter::repeat_with(|| None)
            .take(total)
            .collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, outcome)) => outcomes[idx] = Some(outcome),
                Err(e) => eprintln!("Uploader | task panicked: {}", e),
            }
        }

        outcomes.into_iter().flatten().collect()
    }

    /// Drive one file through all phases. Also the retry entry point: a
    /// failed file is simply submitted again and gets a fresh slot.
    pub async fn upload_one(&self, file: UploadFile) -> UploadOutcome {
        let mut state = UploadState::Pending;

        // Phase 1: reserve identity and keys. Nothing to roll back on failure.
        self.advance(&file.file_name, &mut state, UploadState::SlotRequested);
        let slot = match timeout(
            self.phase_timeout,
            self.api
                .request_slot(self.guest_id, &file.file_name, file.mime_type.as_deref()),
        )
        .await
        {
            Ok(Ok(slot)) => slot,
            Ok(Err(e)) => return UploadOutcome::failed(file.file_name, None, UploadError::Slot(e)),
            Err(_) => {
                return UploadOutcome::failed(
                    file.file_name,
                    None,
                    UploadError::Slot("timed out".to_string()),
                )
            }
        };

        let media_type = media::infer_media_type(&file.file_name, file.mime_type.as_deref());
        let content_type = file.mime_type.clone().unwrap_or_else(|| OCTET_STREAM.to_string());

        // Phase 2: move the bytes. On failure the object was never created,
        // so there is still nothing to roll back.
        self.advance(&file.file_name, &mut state, UploadState::Uploading);
        match timeout(
            self.phase_timeout,
            self.store
                .put(&slot.storage_key, file.data.clone(), &content_type),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return UploadOutcome::failed(
                    file.file_name,
                    Some(slot.storage_key),
                    UploadError::Transfer(e),
                )
            }
            Err(_) => {
                return UploadOutcome::failed(
                    file.file_name,
                    Some(slot.storage_key),
                    UploadError::Transfer("timed out".to_string()),
                )
            }
        }

        // Phase 3: thumbnail, images only, strictly best-effort. The gallery
        // falls back to the original key when this produces nothing.
        let mut thumbnail_uploaded = false;
        if media_type == MediaType::Image {
            self.advance(&file.file_name, &mut state, UploadState::GeneratingThumbnail);
            let bytes = file.data.clone();
            match tokio::task::spawn_blocking(move || make_thumbnail(&bytes)).await {
                Ok(Ok(thumb)) => {
                    match timeout(
                        self.phase_timeout,
                        self.store.put(&slot.thumbnail_key, thumb, "image/jpeg"),
                    )
                    .await
                    {
                        Ok(Ok(())) => thumbnail_uploaded = true,
                        Ok(Err(e)) => {
                            eprintln!("Uploader | {} | thumbnail upload failed: {}", file.file_name, e)
                        }
                        Err(_) => {
                            eprintln!("Uploader | {} | thumbnail upload timed out", file.file_name)
                        }
                    }
                }
                Ok(Err(e)) => {
                    eprintln!("Uploader | {} | thumbnail generation failed: {}", file.file_name, e)
                }
                Err(e) => eprintln!("Uploader | {} | thumbnail task failed: {}", file.file_name, e),
            }
        }

        // Phase 4: commit metadata. From here the row is the source of truth;
        // if the commit fails the uploaded objects must go.
        self.advance(&file.file_name, &mut state, UploadState::MetadataCommitting);
        let commit = SaveMediaMetadata {
            event_id: self.event_id,
            guest_id: Some(self.guest_id),
            storage_key: slot.storage_key.clone(),
            thumbnail_key: thumbnail_uploaded.then(|| slot.thumbnail_key.clone()),
            media_type,
            mime_type: file.mime_type.clone(),
            file_size_bytes: Some(file.data.len() as i64),
        };

        let commit_err = match timeout(self.phase_timeout, self.api.commit_metadata(&commit)).await
        {
            Ok(Ok(media_id)) => {
                self.advance(&file.file_name, &mut state, UploadState::Success);
                return UploadOutcome {
                    file_name: file.file_name,
                    state,
                    media_id: Some(media_id),
                    storage_key: Some(slot.storage_key),
                    thumbnail_key: thumbnail_uploaded.then_some(slot.thumbnail_key),
                    error: None,
                };
            }
            Ok(Err(e)) => e,
            Err(_) => "timed out".to_string(),
        };

        // Compensate: fire-and-forget deletes of what was uploaded. A delete
        // failure is logged and swallowed; the file still reports Failed.
        println!(
            "Uploader | {} | rolling back storage object {}",
            file.file_name, slot.storage_key
        );
        self.best_effort_delete(&file.file_name, &slot.storage_key)
            .await;
        if thumbnail_uploaded {
            self.best_effort_delete(&file.file_name, &slot.thumbnail_key)
                .await;
        }

        UploadOutcome::failed(
            file.file_name,
            Some(slot.storage_key),
            UploadError::Commit(commit_err),
        )
    }

    async fn best_effort_delete(&self, file_name: &str, key: &str) {
        let result = match timeout(self.phase_timeout, self.store.delete(key)).await {
            Ok(res) => res,
            Err(_) => Err("timed out".to_string()),
        };
        if let Err(e) = result {
            eprintln!(
                "Uploader | {} | rollback delete failed, orphaned blob at {}: {}",
                file_name, key, e
            );
        }
    }

    fn advance(&self, file_name: &str, state: &mut UploadState, next: UploadState) {
        println!("Uploader | {} | {:?} -> {:?}", file_name, *state, next);
        *state = next;
    }
}
