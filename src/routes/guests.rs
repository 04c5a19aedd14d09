use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::events;
use crate::services::guests::{self, GuestCreated, GuestDetail, GuestListItem};
use crate::session::MaybeSession;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateGuestRequest {
    pub event_id: Option<Uuid>,
    // Alternative to event_id: the invite token from the QR link.
    pub event_token: Option<String>,
    pub nickname: Option<String>,
    pub fingerprint: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct FindGuestQuery {
    pub event_id: Uuid,
    pub fingerprint: String,
}

#[utoipa::path(
    post,
    path = "/guests",
    request_body = CreateGuestRequest,
    responses(
        (status = 201, description = "Resolved or newly registered guest", body = GuestCreated),
        (status = 400, description = "Neither event_id nor event_token supplied"),
        (status = 401, description = "Invalid invite token"),
        (status = 404, description = "Event not found")
    ),
    tag = "Guests"
)]
pub async fn create_guest(
    State(db): State<DatabaseConnection>,
    MaybeSession(session): MaybeSession,
    Json(payload): Json<CreateGuestRequest>,
) -> Result<(StatusCode, Json<GuestCreated>), AppError> {
    let event_id = match (payload.event_id, payload.event_token.as_deref()) {
        (Some(id), _) => id,
        (None, Some(token)) => events::validate_invite(&db, token).await?.event_id,
        (None, None) => {
            return Err(AppError::BadRequest(
                "event_id or event_token is required".to_string(),
            ))
        }
    };

    let resolved = guests::resolve_guest(
        &db,
        event_id,
        session.as_ref(),
        payload.fingerprint.as_deref(),
        payload.nickname.as_deref(),
    )
    .await?;

    println!(
        "Guests | POST /guests | event={} guest={} | res=201",
        event_id, resolved.guest_id
    );
    Ok((StatusCode::CREATED, Json(resolved)))
}

#[utoipa::path(
    get,
    path = "/guests/find",
    params(FindGuestQuery),
    responses(
        (status = 200, description = "Guest matching the fingerprint", body = GuestCreated),
        (status = 404, description = "No guest for this fingerprint")
    ),
    tag = "Guests"
)]
pub async fn find_guest(
    State(db): State<DatabaseConnection>,
    Query(query): Query<FindGuestQuery>,
) -> Result<Json<GuestCreated>, AppError> {
    let found = guests::find_by_fingerprint(&db, query.event_id, &query.fingerprint)
        .await?
        .ok_or(AppError::NotFound("Guest not found".to_string()))?;

    println!(
        "Guests | GET /guests/find | event={} guest={} | res=200",
        query.event_id, found.guest_id
    );
    Ok(Json(found))
}

#[utoipa::path(
    get,
    path = "/guests/{id}",
    params(("id" = Uuid, Path, description = "Guest ID")),
    responses(
        (status = 200, description = "Guest detail", body = GuestDetail),
        (status = 404, description = "Guest not found")
    ),
    tag = "Guests"
)]
pub async fn get_guest(
    Path(id): Path<Uuid>,
    State(db): State<DatabaseConnection>,
) -> Result<Json<GuestDetail>, AppError> {
    let detail = guests::get_guest_detail(&db, id)
        .await?
        .ok_or(AppError::NotFound("Guest not found".to_string()))?;

    println!("Guests | GET /guests/{} | res=200", id);
    Ok(Json(detail))
}

#[utoipa::path(
    get,
    path = "/guests/event/{event_id}",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Guests of the event, most uploads first", body = [GuestListItem])
    ),
    tag = "Guests"
)]
pub async fn list_event_guests(
    Path(event_id): Path<Uuid>,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Vec<GuestListItem>>, AppError> {
    let items = guests::list_guests_by_event(&db, event_id).await?;

    println!(
        "Guests | GET /guests/event/{} | count={} | res=200",
        event_id,
        items.len()
    );
    Ok(Json(items))
}
