//! Event lifecycle: invite issuance, validation, deactivation, aggregates.

mod common;

use snapvite::entities::media::MediaType;
use snapvite::error::AppError;
use snapvite::services::{events, guests, likes, media};
use snapvite::utils::token::INVITE_TOKEN_LEN;

#[tokio::test]
async fn created_invite_validates_immediately() {
    let db = common::setup_db().await;

    let created = events::create_event(&db, "Wedding", None, None)
        .await
        .unwrap();
    assert_eq!(created.invite_token.len(), INVITE_TOKEN_LEN);
    assert!(created
        .invite_token
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    let access = events::validate_invite(&db, &created.invite_token)
        .await
        .unwrap();
    assert_eq!(access.event_id, created.event_id);
    assert_eq!(access.name, "Wedding");
    assert!(access.is_active);
}

#[tokio::test]
async fn empty_or_oversized_name_is_rejected() {
    let db = common::setup_db().await;

    let empty = events::create_event(&db, "   ", None, None).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let oversized = "x".repeat(events::MAX_EVENT_NAME_LEN + 1);
    let too_long = events::create_event(&db, &oversized, None, None).await;
    assert!(matches!(too_long, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn deactivated_event_looks_like_an_unknown_token() {
    let db = common::setup_db().await;

    let created = events::create_event(&db, "Wedding", None, None)
        .await
        .unwrap();
    assert!(events::deactivate_event(&db, created.event_id)
        .await
        .unwrap());

    let stale = events::validate_invite(&db, &created.invite_token)
        .await
        .unwrap_err();
    let unknown = events::validate_invite(&db, "ZZZZZZZZZZZZ")
        .await
        .unwrap_err();

    // Same variant, same message: a revoked invite must not be
    // distinguishable from one that never existed.
    assert!(matches!(stale, AppError::Unauthorized(_)));
    assert!(matches!(unknown, AppError::Unauthorized(_)));
    assert_eq!(stale.to_string(), unknown.to_string());
}

#[tokio::test]
async fn deactivation_is_idempotent_and_missing_events_fail() {
    let db = common::setup_db().await;

    let created = events::create_event(&db, "Birthday", None, None)
        .await
        .unwrap();
    assert!(events::deactivate_event(&db, created.event_id)
        .await
        .unwrap());
    // Already inactive still reports success.
    assert!(events::deactivate_event(&db, created.event_id)
        .await
        .unwrap());
    // Only a genuinely missing event is a failure.
    assert!(!events::deactivate_event(&db, uuid::Uuid::new_v4())
        .await
        .unwrap());
}

#[tokio::test]
async fn distinct_events_get_distinct_tokens() {
    let db = common::setup_db().await;

    let a = events::create_event(&db, "Wedding", None, None).await.unwrap();
    let b = events::create_event(&db, "Reception", None, None)
        .await
        .unwrap();
    assert_ne!(a.invite_token, b.invite_token);

    // Each token resolves to its own event.
    let access_a = events::validate_invite(&db, &a.invite_token).await.unwrap();
    let access_b = events::validate_invite(&db, &b.invite_token).await.unwrap();
    assert_eq!(access_a.event_id, a.event_id);
    assert_eq!(access_b.event_id, b.event_id);
}

#[tokio::test]
async fn event_detail_aggregates_guests_media_and_likes() {
    let db = common::setup_db().await;

    let evt = events::create_event(&db, "Wedding", None, None).await.unwrap();
    let guest = guests::create_guest(&db, evt.event_id, Some("Dana"), Some("fp-1"))
        .await
        .unwrap();

    let saved = media::save_media_metadata(
        &db,
        &media::SaveMediaMetadata {
            event_id: evt.event_id,
            guest_id: Some(guest.guest_id),
            storage_key: "image/original/a.jpg".to_string(),
            thumbnail_key: None,
            media_type: MediaType::Image,
            mime_type: Some("image/jpeg".to_string()),
            file_size_bytes: Some(1024),
        },
    )
    .await
    .unwrap();

    likes::toggle_like(&db, saved.media_id, guest.guest_id)
        .await
        .unwrap();

    let detail = events::get_event_detail(&db, evt.event_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.media_count, 1);
    assert_eq!(detail.guest_count, 1);
    assert_eq!(detail.total_likes, 1);

    assert!(events::get_event_detail(&db, uuid::Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}
