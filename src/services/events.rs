use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{event, guest, like, media};
use crate::error::AppError;
use crate::utils::token::{generate_invite_token, hash_token};

pub const MAX_EVENT_NAME_LEN: usize = 255;

/// Returned exactly once, with the plaintext invite token. Only the hash is
/// persisted; the token is unrecoverable after this.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EventCreated {
    pub event_id: Uuid,
    pub name: String,
    pub invite_token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EventAccess {
    pub event_id: Uuid,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EventDetail {
    pub event_id: Uuid,
    pub name: String,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub media_count: u64,
    pub guest_count: u64,
    pub total_likes: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EventListItem {
    pub event_id: Uuid,
    pub name: String,
    pub start_date: Option<NaiveDateTime>,
    pub is_active: bool,
    pub media_count: u64,
    pub guest_count: u64,
}

pub async fn create_event<C: ConnectionTrait>(
    db: &C,
    name: &str,
    start_date: Option<NaiveDateTime>,
    end_date: Option<NaiveDateTime>,
) -> Result<EventCreated, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Event name is required".to_string()));
    }
    if name.len() > MAX_EVENT_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Event name exceeds {} characters",
            MAX_EVENT_NAME_LEN
        )));
    }

    let invite_token = generate_invite_token();
    let event_id = Uuid::new_v4();

    let evt = event::ActiveModel {
        event_id: Set(event_id),
        name: Set(name.to_string()),
        invite_token_hash: Set(hash_token(&invite_token)),
        start_date: Set(start_date),
        end_date: Set(end_date),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };

    evt.insert(db).await?;

    Ok(EventCreated {
        event_id,
        name: name.to_string(),
        invite_token,
    })
}

/// Hash the presented token and look the event up by digest. Inactive events
/// answer exactly like unknown tokens so invites cannot be enumerated.
pub async fn validate_invite<C: ConnectionTrait>(
    db: &C,
    invite_token: &str,
) -> Result<EventAccess, AppError> {
    let token_hash = hash_token(invite_token.trim());

    let evt = event::Entity::find()
        .filter(event::Column::InviteTokenHash.eq(&token_hash))
        .one(db)
        .await?;

    match evt {
        Some(evt) if evt.is_active => Ok(EventAccess {
            event_id: evt.event_id,
            name: evt.name,
            is_active: evt.is_active,
        }),
        _ => Err(AppError::Unauthorized("Invalid invite token".to_string())),
    }
}

/// Set `is_active = false`. Deactivation is one-way; repeating it on an
/// already inactive event still reports success.
pub async fn deactivate_event<C: ConnectionTrait>(db: &C, event_id: Uuid) -> Result<bool, AppError> {
    let evt = event::Entity::find_by_id(event_id).one(db).await?;

    let Some(evt) = evt else {
        return Ok(false);
    };

    let mut active: event::ActiveModel = evt.into();
    active.is_active = Set(false);
    active.update(db).await?;

    Ok(true)
}

pub async fn get_event_detail<C: ConnectionTrait>(
    db: &C,
    event_id: Uuid,
) -> Result<Option<EventDetail>, AppError> {
    let evt = event::Entity::find_by_id(event_id).one(db).await?;
    let Some(evt) = evt else {
        return Ok(None);
    };

    let media_count = media::Entity::find()
        .filter(media::Column::EventId.eq(event_id))
        .count(db)
        .await?;
    let guest_count = guest::Entity::find()
        .filter(guest::Column::EventId.eq(event_id))
        .count(db)
        .await?;

    let media_ids: Vec<Uuid> = media::Entity::find()
        .filter(media::Column::EventId.eq(event_id))
        .select_only()
        .column(media::Column::MediaId)
        .into_tuple()
        .all(db)
        .await?;

    let total_likes = if media_ids.is_empty() {
        0
    } else {
        like::Entity::find()
            .filter(like::Column::MediaId.is_in(media_ids))
            .count(db)
            .await?
    };

    Ok(Some(EventDetail {
        event_id: evt.event_id,
        name: evt.name,
        start_date: evt.start_date,
        end_date: evt.end_date,
        is_active: evt.is_active,
        created_at: evt.created_at,
        media_count,
        guest_count,
        total_likes,
    }))
}

pub async fn list_events<C: ConnectionTrait>(db: &C) -> Result<Vec<EventListItem>, AppError> {
    let events = event::Entity::find()
        .order_by_desc(event::Column::CreatedAt)
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(events.len());
    for evt in events {
        let media_count = media::Entity::find()
            .filter(media::Column::EventId.eq(evt.event_id))
            .count(db)
            .await?;
        let guest_count = guest::Entity::find()
            .filter(guest::Column::EventId.eq(evt.event_id))
            .count(db)
            .await?;

        result.push(EventListItem {
            event_id: evt.event_id,
            name: evt.name,
            start_date: evt.start_date,
            is_active: evt.is_active,
            media_count,
            guest_count,
        });
    }

    Ok(result)
}
