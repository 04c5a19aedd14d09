use chrono::NaiveDateTime;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{guest, like, media};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ToggleResult {
    pub action: ToggleAction,
    pub media_id: Uuid,
    pub new_count: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LikeDetail {
    pub like_id: Uuid,
    pub nickname: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Flip the like state for `(media_id, guest_id)`.
///
/// Delete-first, then a constraint-checked insert: the unique index on the
/// pair absorbs racing toggles instead of letting read-then-act double-add.
pub async fn toggle_like<C: ConnectionTrait>(
    db: &C,
    media_id: Uuid,
    guest_id: Uuid,
) -> Result<ToggleResult, AppError> {
    let exists = media::Entity::find_by_id(media_id).one(db).await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Media not found".to_string()));
    }

    let deleted = like::Entity::delete_many()
        .filter(like::Column::MediaId.eq(media_id))
        .filter(like::Column::GuestId.eq(guest_id))
        .exec(db)
        .await?;

    let action = if deleted.rows_affected > 0 {
        ToggleAction::Removed
    } else {
        let model = like::ActiveModel {
            like_id: Set(Uuid::new_v4()),
            media_id: Set(media_id),
            guest_id: Set(guest_id),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };

        let insert = like::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([like::Column::MediaId, like::Column::GuestId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;

        match insert {
            Ok(_) => ToggleAction::Added,
            // A concurrent double-tap already inserted the row.
            Err(DbErr::RecordNotInserted) => ToggleAction::Added,
            Err(e) => match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    return Err(AppError::BadRequest("Unknown guest".to_string()));
                }
                _ => return Err(e.into()),
            },
        }
    };

    let new_count = like::Entity::find()
        .filter(like::Column::MediaId.eq(media_id))
        .count(db)
        .await?;

    Ok(ToggleResult {
        action,
        media_id,
        new_count,
    })
}

pub async fn list_media_likes<C: ConnectionTrait>(
    db: &C,
    media_id: Uuid,
) -> Result<Vec<LikeDetail>, AppError> {
    let likes = like::Entity::find()
        .filter(like::Column::MediaId.eq(media_id))
        .find_also_related(guest::Entity)
        .all(db)
        .await?;

    Ok(likes
        .into_iter()
        .map(|(l, g)| LikeDetail {
            like_id: l.like_id,
            nickname: g.and_then(|g| g.nickname),
            created_at: l.created_at,
        })
        .collect())
}
