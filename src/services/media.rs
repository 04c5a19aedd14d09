use std::collections::HashMap;

use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::media::{self, MediaType, ProcessingStatus};
use crate::entities::{event, guest, like};
use crate::error::AppError;
use crate::utils::get_extension;

/// A reserved media identity: id plus both storage keys, handed out before
/// any bytes move. Nothing is persisted at allocation time; the keys become
/// durable only at the metadata commit.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct UploadSlot {
    pub media_id: Uuid,
    pub storage_key: String,
    pub thumbnail_key: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct SaveMediaMetadata {
    pub event_id: Uuid,
    pub guest_id: Option<Uuid>,
    pub storage_key: String,
    pub thumbnail_key: Option<String>,
    pub media_type: MediaType,
    pub mime_type: Option<String>,
    pub file_size_bytes: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MediaGalleryItem {
    pub media_id: Uuid,
    pub media_type: MediaType,
    // Thumbnail when one exists, otherwise the original.
    pub display_key: String,
    pub like_count: u64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MediaDetail {
    pub media_id: Uuid,
    pub event_id: Uuid,
    pub media_type: MediaType,
    pub storage_key: String,
    pub thumbnail_key: Option<String>,
    pub mime_type: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub processing_status: ProcessingStatus,
    pub uploaded_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub like_count: u64,
    pub is_liked: bool,
}

/// Mime type decides the category; the extension is the fallback for clients
/// that never set one.
pub fn infer_media_type(file_name: &str, mime_type: Option<&str>) -> MediaType {
    if let Some(mime) = mime_type {
        if mime.starts_with("video/") {
            return MediaType::Video;
        }
        if mime.starts_with("image/") {
            return MediaType::Image;
        }
    }
    match get_extension(file_name).as_str() {
        "mp4" | "mov" | "webm" | "m4v" | "avi" => MediaType::Video,
        _ => MediaType::Image,
    }
}

/// Reserve a media identity and its storage keys. Pure: no row is written.
///
/// Keys partition by category (`image/` vs `video/`) so bucket lifecycle
/// rules can target them separately, and both derive from the fresh media id,
/// so they are never reused.
pub fn allocate_slot(
    guest_id: Uuid,
    file_name: &str,
    mime_type: Option<&str>,
) -> Result<UploadSlot, AppError> {
    if guest_id.is_nil() {
        return Err(AppError::BadRequest("guest_id is required".to_string()));
    }

    let media_id = Uuid::new_v4();
    let category = match infer_media_type(file_name, mime_type) {
        MediaType::Video => "video",
        MediaType::Image => "image",
    };
    let ext = get_extension(file_name);

    Ok(UploadSlot {
        media_id,
        storage_key: format!("{}/original/{}.{}", category, media_id, ext),
        thumbnail_key: format!("{}/thumbnail/{}-thumb.jpg", category, media_id),
    })
}

/// Commit the durable media row. The bytes are already in the bucket by the
/// time this runs; this is the step that makes them visible.
pub async fn save_media_metadata<C: ConnectionTrait>(
    db: &C,
    req: &SaveMediaMetadata,
) -> Result<media::Model, AppError> {
    if req.storage_key.trim().is_empty() {
        return Err(AppError::BadRequest("storage_key is required".to_string()));
    }

    let exists = event::Entity::find_by_id(req.event_id).one(db).await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    let model = media::ActiveModel {
        media_id: Set(Uuid::new_v4()),
        event_id: Set(req.event_id),
        guest_id: Set(req.guest_id),
        media_type: Set(req.media_type),
        storage_key: Set(req.storage_key.clone()),
        thumbnail_key: Set(req.thumbnail_key.clone()),
        mime_type: Set(req.mime_type.clone()),
        file_size_bytes: Set(req.file_size_bytes),
        processing_status: Set(ProcessingStatus::Uploaded),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };

    match model.insert(db).await {
        Ok(saved) => Ok(saved),
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Err(AppError::Conflict(
                "storage_key is already registered".to_string(),
            )),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                Err(AppError::BadRequest("Unknown guest".to_string()))
            }
            _ => Err(e.into()),
        },
    }
}

pub async fn get_media<C: ConnectionTrait>(
    db: &C,
    media_id: Uuid,
) -> Result<Option<media::Model>, AppError> {
    Ok(media::Entity::find_by_id(media_id).one(db).await?)
}

pub async fn get_media_detail<C: ConnectionTrait>(
    db: &C,
    media_id: Uuid,
    current_guest: Option<Uuid>,
) -> Result<Option<MediaDetail>, AppError> {
    let Some(m) = get_media(db, media_id).await? else {
        return Ok(None);
    };

    let like_count = like::Entity::find()
        .filter(like::Column::MediaId.eq(media_id))
        .count(db)
        .await?;

    let is_liked = match current_guest {
        Some(guest_id) => {
            like::Entity::find()
                .filter(like::Column::MediaId.eq(media_id))
                .filter(like::Column::GuestId.eq(guest_id))
                .count(db)
                .await?
                > 0
        }
        None => false,
    };

    let uploaded_by = match m.guest_id {
        Some(guest_id) => guest::Entity::find_by_id(guest_id)
            .one(db)
            .await?
            .map(|g| g.nickname.unwrap_or_else(|| super::guests::ANONYMOUS_NICKNAME.to_string())),
        None => None,
    };

    Ok(Some(MediaDetail {
        media_id: m.media_id,
        event_id: m.event_id,
        media_type: m.media_type,
        storage_key: m.storage_key,
        thumbnail_key: m.thumbnail_key,
        mime_type: m.mime_type,
        file_size_bytes: m.file_size_bytes,
        processing_status: m.processing_status,
        uploaded_by,
        created_at: m.created_at,
        like_count,
        is_liked,
    }))
}

/// Newest-first gallery page for an event, with like counts pulled in one
/// grouped query.
pub async fn list_media_by_event<C: ConnectionTrait>(
    db: &C,
    event_id: Uuid,
    page: u64,
    page_size: u64,
) -> Result<(Vec<MediaGalleryItem>, u64, u64), AppError> {
    let paginator = media::Entity::find()
        .filter(media::Column::EventId.eq(event_id))
        .order_by_desc(media::Column::CreatedAt)
        .paginate(db, page_size);

    let total_items = paginator.num_items().await?;
    let total_pages = paginator.num_pages().await?;
    let items = paginator.fetch_page(page.saturating_sub(1)).await?;

    let ids: Vec<Uuid> = items.iter().map(|m| m.media_id).collect();
    let like_counts = like_counts_for(db, &ids).await?;

    let data = items
        .into_iter()
        .map(|m| MediaGalleryItem {
            media_id: m.media_id,
            media_type: m.media_type,
            display_key: m.thumbnail_key.unwrap_or(m.storage_key),
            like_count: like_counts.get(&m.media_id).copied().unwrap_or(0),
            created_at: m.created_at,
        })
        .collect();

    Ok((data, total_items, total_pages))
}

pub async fn like_counts_for<C: ConnectionTrait>(
    db: &C,
    media_ids: &[Uuid],
) -> Result<HashMap<Uuid, u64>, AppError> {
    if media_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, i64)> = like::Entity::find()
        .select_only()
        .column(like::Column::MediaId)
        .column_as(like::Column::LikeId.count(), "count")
        .filter(like::Column::MediaId.is_in(media_ids.to_vec()))
        .group_by(like::Column::MediaId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, count as u64))
        .collect())
}

/// Remove the row. Storage objects are the caller's problem: the route fires
/// best-effort deletes before this so an orphaned blob is the worst case,
/// never a dangling row.
pub async fn delete_media_row<C: ConnectionTrait>(
    db: &C,
    media_id: Uuid,
) -> Result<bool, AppError> {
    let res = media::Entity::delete_by_id(media_id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_keys_partition_by_category_and_keep_extension() {
        let guest = Uuid::new_v4();

        let image = allocate_slot(guest, "beach.JPG", Some("image/jpeg")).unwrap();
        assert!(image.storage_key.starts_with("image/original/"));
        assert!(image.storage_key.ends_with(".jpg"));
        assert!(image.thumbnail_key.starts_with("image/thumbnail/"));
        assert!(image.thumbnail_key.ends_with("-thumb.jpg"));

        let video = allocate_slot(guest, "dance.mp4", Some("video/mp4")).unwrap();
        assert!(video.storage_key.starts_with("video/original/"));
        assert!(video.storage_key.ends_with(".mp4"));
        assert!(video.thumbnail_key.starts_with("video/thumbnail/"));
    }

    #[test]
    fn slot_keys_embed_the_media_id() {
        let slot = allocate_slot(Uuid::new_v4(), "photo.png", None).unwrap();
        assert!(slot.storage_key.contains(&slot.media_id.to_string()));
        assert!(slot.thumbnail_key.contains(&slot.media_id.to_string()));
    }

    #[test]
    fn repeated_allocations_never_reuse_keys() {
        let guest = Uuid::new_v4();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let slot = allocate_slot(guest, "photo.jpg", Some("image/jpeg")).unwrap();
            assert!(seen.insert(slot.storage_key));
        }
    }

    #[test]
    fn unknown_extension_falls_back_to_bin() {
        let slot = allocate_slot(Uuid::new_v4(), "mystery", None).unwrap();
        assert!(slot.storage_key.ends_with(".bin"));
    }

    #[test]
    fn nil_guest_is_rejected() {
        assert!(allocate_slot(Uuid::nil(), "photo.jpg", None).is_err());
    }

    #[test]
    fn media_type_inference_prefers_mime() {
        assert_eq!(
            infer_media_type("clip.jpg", Some("video/quicktime")),
            MediaType::Video
        );
        assert_eq!(infer_media_type("clip.mov", None), MediaType::Video);
        assert_eq!(infer_media_type("photo.png", None), MediaType::Image);
        assert_eq!(infer_media_type("unknown", None), MediaType::Image);
    }
}
