use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::media::MediaType;
use crate::error::AppError;
use crate::pagination::{PaginatedResponse, Pagination};
use crate::services::media::{self, MediaDetail, SaveMediaMetadata, UploadSlot};
use crate::services::s3::{public_media_url, StorageService};
use crate::session::MaybeSession;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UploadSlotRequest {
    pub guest_id: Uuid,
    pub file_name: String,
    pub mime_type: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MediaCreated {
    pub media_id: Uuid,
    pub storage_key: String,
    pub file_url: String,
    pub media_type: MediaType,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GalleryItem {
    pub media_id: Uuid,
    pub media_type: MediaType,
    pub key: String,
    pub url: String,
    pub like_count: u64,
    pub created_at: chrono::NaiveDateTime,
}

#[utoipa::path(
    post,
    path = "/media/upload-slot",
    request_body = UploadSlotRequest,
    responses(
        (status = 200, description = "Reserved media identity and storage keys", body = UploadSlot),
        (status = 400, description = "Missing guest id")
    ),
    tag = "Media"
)]
pub async fn create_upload_slot(
    Json(payload): Json<UploadSlotRequest>,
) -> Result<Json<UploadSlot>, AppError> {
    let slot = media::allocate_slot(
        payload.guest_id,
        &payload.file_name,
        payload.mime_type.as_deref(),
    )?;

    println!(
        "Media | POST /media/upload-slot | guest={} key={} | res=200",
        payload.guest_id, slot.storage_key
    );
    Ok(Json(slot))
}

#[utoipa::path(
    post,
    path = "/media/metadata",
    request_body = SaveMediaMetadata,
    responses(
        (status = 201, description = "Durable media row created", body = MediaCreated),
        (status = 404, description = "Event not found"),
        (status = 409, description = "storage_key already registered")
    ),
    tag = "Media"
)]
pub async fn save_metadata(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<SaveMediaMetadata>,
) -> Result<(StatusCode, Json<MediaCreated>), AppError> {
    let saved = media::save_media_metadata(&db, &payload).await?;

    println!(
        "Media | POST /media/metadata | event={} media={} | res=201",
        saved.event_id, saved.media_id
    );
    let file_url = public_media_url(&saved.storage_key);
    Ok((
        StatusCode::CREATED,
        Json(MediaCreated {
            media_id: saved.media_id,
            storage_key: saved.storage_key,
            file_url,
            media_type: saved.media_type,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/media/event/{event_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event ID"),
        Pagination
    ),
    responses(
        (status = 200, description = "Gallery page, newest first", body = PaginatedResponse<GalleryItem>)
    ),
    tag = "Media"
)]
pub async fn list_event_media(
    Path(event_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
    State(db): State<DatabaseConnection>,
) -> Result<Json<PaginatedResponse<GalleryItem>>, AppError> {
    let page = pagination.page();
    let limit = pagination.limit();

    let (items, total_items, total_pages) =
        media::list_media_by_event(&db, event_id, page, limit).await?;

    let data: Vec<GalleryItem> = items
        .into_iter()
        .map(|item| GalleryItem {
            media_id: item.media_id,
            media_type: item.media_type,
            url: public_media_url(&item.display_key),
            key: item.display_key,
            like_count: item.like_count,
            created_at: item.created_at,
        })
        .collect();

    println!(
        "Media | GET /media/event/{} | page={} count={} | res=200",
        event_id,
        page,
        data.len()
    );
    Ok(Json(PaginatedResponse::new(
        data,
        total_items,
        total_pages,
        page,
        limit,
    )))
}

#[utoipa::path(
    get,
    path = "/media/{id}",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Media detail", body = MediaDetail),
        (status = 404, description = "Media not found")
    ),
    tag = "Media"
)]
pub async fn get_media_detail(
    Path(id): Path<Uuid>,
    MaybeSession(session): MaybeSession,
    State(db): State<DatabaseConnection>,
) -> Result<Json<MediaDetail>, AppError> {
    let current_guest = session.map(|s| s.guest_id);
    let detail = media::get_media_detail(&db, id, current_guest)
        .await?
        .ok_or(AppError::NotFound("Media not found".to_string()))?;

    println!("Media | GET /media/{} | res=200", id);
    Ok(Json(detail))
}

#[utoipa::path(
    delete,
    path = "/media/{id}",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 204, description = "Media deleted"),
        (status = 404, description = "Media not found")
    ),
    tag = "Media"
)]
pub async fn delete_media(
    Path(id): Path<Uuid>,
    State(db): State<DatabaseConnection>,
) -> Result<StatusCode, AppError> {
    let found = media::get_media(&db, id)
        .await?
        .ok_or(AppError::NotFound("Media not found".to_string()))?;

    // Storage objects first, best-effort; the row delete is what makes the
    // item disappear from the gallery.
    let storage = StorageService::new().await;
    if let Err(e) = storage.delete_object(&found.storage_key).await {
        eprintln!("Media | DELETE /media/{} | storage delete failed: {}", id, e);
    }
    if let Some(thumbnail_key) = &found.thumbnail_key {
        if let Err(e) = storage.delete_object(thumbnail_key).await {
            eprintln!("Media | DELETE /media/{} | storage delete failed: {}", id, e);
        }
    }

    media::delete_media_row(&db, id).await?;

    println!("Media | DELETE /media/{} | res=204", id);
    Ok(StatusCode::NO_CONTENT)
}
