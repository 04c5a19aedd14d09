use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::events::{self, EventAccess, EventCreated, EventDetail, EventListItem};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    pub name: String,
    pub start_date: Option<chrono::NaiveDateTime>,
    pub end_date: Option<chrono::NaiveDateTime>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ValidateInviteRequest {
    pub invite_token: String,
}

#[utoipa::path(
    post,
    path = "/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created; the invite token is shown only in this response", body = EventCreated),
        (status = 400, description = "Invalid event name")
    ),
    tag = "Events"
)]
pub async fn create_event(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventCreated>), AppError> {
    let created =
        events::create_event(&db, &payload.name, payload.start_date, payload.end_date).await?;

    println!(
        "Events | POST /events | event={} name={} | res=201",
        created.event_id, created.name
    );
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/events/validate",
    request_body = ValidateInviteRequest,
    responses(
        (status = 200, description = "Invite accepted", body = EventAccess),
        (status = 401, description = "Unknown or inactive invite")
    ),
    tag = "Events"
)]
pub async fn validate_invite(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<ValidateInviteRequest>,
) -> Result<Json<EventAccess>, AppError> {
    let access = events::validate_invite(&db, &payload.invite_token).await?;

    println!(
        "Events | POST /events/validate | event={} | res=200",
        access.event_id
    );
    Ok(Json(access))
}

#[utoipa::path(
    get,
    path = "/events",
    responses(
        (status = 200, description = "All events with aggregate counts", body = [EventListItem])
    ),
    tag = "Events"
)]
pub async fn list_events(
    State(db): State<DatabaseConnection>,
) -> Result<Json<Vec<EventListItem>>, AppError> {
    let items = events::list_events(&db).await?;

    println!("Events | GET /events | count={} | res=200", items.len());
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event detail with aggregate counts", body = EventDetail),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
)]
pub async fn get_event(
    Path(id): Path<Uuid>,
    State(db): State<DatabaseConnection>,
) -> Result<Json<EventDetail>, AppError> {
    let detail = events::get_event_detail(&db, id)
        .await?
        .ok_or(AppError::NotFound("Event not found".to_string()))?;

    println!("Events | GET /events/{} | res=200", id);
    Ok(Json(detail))
}

#[utoipa::path(
    patch,
    path = "/events/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deactivated (idempotent)"),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
)]
pub async fn deactivate_event(
    Path(id): Path<Uuid>,
    State(db): State<DatabaseConnection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let found = events::deactivate_event(&db, id).await?;
    if !found {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    println!("Events | PATCH /events/{}/deactivate | res=200", id);
    Ok(Json(serde_json::json!({
        "message": "Event deactivated"
    })))
}
