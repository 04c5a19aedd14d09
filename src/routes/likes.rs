use axum::{
    extract::{Path, State},
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::likes::{self, LikeDetail, ToggleResult};
use crate::session::MaybeSession;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ToggleLikeRequest {
    pub media_id: Uuid,
    // Falls back to the session guest when omitted.
    pub guest_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/likes/toggle",
    request_body = ToggleLikeRequest,
    responses(
        (status = 200, description = "Like flipped; reports the action taken and the new count", body = ToggleResult),
        (status = 400, description = "No guest identity available"),
        (status = 404, description = "Media not found")
    ),
    tag = "Likes"
)]
pub async fn toggle_like(
    State(db): State<DatabaseConnection>,
    MaybeSession(session): MaybeSession,
    Json(payload): Json<ToggleLikeRequest>,
) -> Result<Json<ToggleResult>, AppError> {
    let guest_id = payload
        .guest_id
        .or(session.map(|s| s.guest_id))
        .ok_or(AppError::BadRequest("guest_id is required".to_string()))?;

    let result = likes::toggle_like(&db, payload.media_id, guest_id).await?;

    println!(
        "Likes | POST /likes/toggle | media={} guest={} action={:?} | res=200",
        payload.media_id, guest_id, result.action
    );
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/likes/media/{media_id}",
    params(("media_id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Likes on a media item", body = [LikeDetail])
    ),
    tag = "Likes"
)]
pub async fn list_media_likes(
    Path(media_id): Path<Uuid>,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Vec<LikeDetail>>, AppError> {
    let items = likes::list_media_likes(&db, media_id).await?;

    println!(
        "Likes | GET /likes/media/{} | count={} | res=200",
        media_id,
        items.len()
    );
    Ok(Json(items))
}
