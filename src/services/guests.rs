use chrono::NaiveDateTime;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{event, guest, like, media};
use crate::error::AppError;
use crate::session::GuestSession;

pub const ANONYMOUS_NICKNAME: &str = "Anonymous";
pub const MAX_NICKNAME_LEN: usize = 100;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GuestCreated {
    pub guest_id: Uuid,
    pub nickname: Option<String>,
    pub event_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GuestDetail {
    pub guest_id: Uuid,
    pub event_id: Uuid,
    pub nickname: Option<String>,
    pub created_at: NaiveDateTime,
    pub media_count: u64,
    pub likes_given: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GuestListItem {
    pub guest_id: Uuid,
    pub nickname: Option<String>,
    pub media_count: u64,
}

/// Resolve the caller to at most one guest per event.
///
/// Order matters: the stored session is cheapest, the fingerprint costs a
/// lookup, creation is last. A session id whose event matches is returned at
/// face value with no existence check, trading staleness for latency; a
/// cleared-cookie guest on the same device re-resolves through step 2.
pub async fn resolve_guest<C: ConnectionTrait>(
    db: &C,
    event_id: Uuid,
    session: Option<&GuestSession>,
    fingerprint: Option<&str>,
    nickname: Option<&str>,
) -> Result<GuestCreated, AppError> {
    // 1. Stored session, if it belongs to this event.
    if let Some(session) = session {
        if session.event_id == event_id {
            return Ok(GuestCreated {
                guest_id: session.guest_id,
                nickname: None,
                event_id,
            });
        }
    }

    // 2. Device fingerprint fallback.
    if let Some(fp) = fingerprint.filter(|fp| !fp.is_empty()) {
        if let Some(existing) = find_by_fingerprint(db, event_id, fp).await? {
            return Ok(existing);
        }
    }

    // 3. First contact from this browser: register a new guest.
    create_guest(db, event_id, nickname, fingerprint).await
}

/// Insert a guest. When a fingerprint is supplied the write goes through the
/// `(event_id, fingerprint)` unique index, so two racing first contacts from
/// one device converge on a single row.
pub async fn create_guest<C: ConnectionTrait>(
    db: &C,
    event_id: Uuid,
    nickname: Option<&str>,
    fingerprint: Option<&str>,
) -> Result<GuestCreated, AppError> {
    let nickname = nickname.map(str::trim).filter(|n| !n.is_empty());
    if let Some(n) = nickname {
        if n.len() > MAX_NICKNAME_LEN {
            return Err(AppError::BadRequest(format!(
                "Nickname exceeds {} characters",
                MAX_NICKNAME_LEN
            )));
        }
    }

    let exists = event::Entity::find_by_id(event_id).one(db).await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    let fingerprint = fingerprint.map(str::trim).filter(|fp| !fp.is_empty());
    let guest_id = Uuid::new_v4();

    let model = guest::ActiveModel {
        guest_id: Set(guest_id),
        event_id: Set(event_id),
        nickname: Set(nickname.map(str::to_string)),
        fingerprint: Set(fingerprint.map(str::to_string)),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };

    let Some(fp) = fingerprint else {
        model.insert(db).await?;
        return Ok(GuestCreated {
            guest_id,
            nickname: nickname.map(str::to_string),
            event_id,
        });
    };

    let insert = guest::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([guest::Column::EventId, guest::Column::Fingerprint])
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;

    match insert {
        Ok(_) => Ok(GuestCreated {
            guest_id,
            nickname: nickname.map(str::to_string),
            event_id,
        }),
        Err(DbErr::RecordNotInserted) => {
            // Lost the race: another request registered this device first.
            let existing = find_by_fingerprint(db, event_id, fp).await?.ok_or_else(|| {
                AppError::InternalServerError("Guest missing after fingerprint conflict".to_string())
            })?;
            Ok(existing)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_fingerprint<C: ConnectionTrait>(
    db: &C,
    event_id: Uuid,
    fingerprint: &str,
) -> Result<Option<GuestCreated>, AppError> {
    let found = guest::Entity::find()
        .filter(guest::Column::EventId.eq(event_id))
        .filter(guest::Column::Fingerprint.eq(fingerprint))
        .one(db)
        .await?;

    Ok(found.map(|g| GuestCreated {
        guest_id: g.guest_id,
        nickname: g.nickname,
        event_id: g.event_id,
    }))
}

pub async fn get_guest_detail<C: ConnectionTrait>(
    db: &C,
    guest_id: Uuid,
) -> Result<Option<GuestDetail>, AppError> {
    let found = guest::Entity::find_by_id(guest_id).one(db).await?;
    let Some(g) = found else {
        return Ok(None);
    };

    let media_count = media::Entity::find()
        .filter(media::Column::GuestId.eq(guest_id))
        .count(db)
        .await?;
    let likes_given = like::Entity::find()
        .filter(like::Column::GuestId.eq(guest_id))
        .count(db)
        .await?;

    Ok(Some(GuestDetail {
        guest_id: g.guest_id,
        event_id: g.event_id,
        nickname: g.nickname,
        created_at: g.created_at,
        media_count,
        likes_given,
    }))
}

/// Guests of an event, most prolific uploaders first.
pub async fn list_guests_by_event<C: ConnectionTrait>(
    db: &C,
    event_id: Uuid,
) -> Result<Vec<GuestListItem>, AppError> {
    let guests = guest::Entity::find()
        .filter(guest::Column::EventId.eq(event_id))
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(guests.len());
    for g in guests {
        let media_count = media::Entity::find()
            .filter(media::Column::GuestId.eq(g.guest_id))
            .count(db)
            .await?;
        result.push(GuestListItem {
            guest_id: g.guest_id,
            nickname: g.nickname,
            media_count,
        });
    }
    result.sort_by(|a, b| b.media_count.cmp(&a.media_count));

    Ok(result)
}
