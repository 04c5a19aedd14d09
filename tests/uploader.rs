//! Upload coordinator scenarios against mock backends: rollback on commit
//! failure, no rollback on transfer failure, best-effort thumbnails, and the
//! concurrency ceiling.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use snapvite::services::media::{self, SaveMediaMetadata, UploadSlot};
use snapvite::services::uploader::{
    BlobStore, DirectApi, SlotApi, UploadCoordinator, UploadError, UploadFile, UploadState,
};
use snapvite::services::{events, guests};
use uuid::Uuid;

#[derive(Default)]
struct MockApi {
    fail_slot: bool,
    fail_commit: bool,
    commits: Mutex<Vec<SaveMediaMetadata>>,
}

#[async_trait]
impl SlotApi for MockApi {
    async fn request_slot(
        &self,
        guest_id: Uuid,
        file_name: &str,
        mime_type: Option<&str>,
    ) -> Result<UploadSlot, String> {
        if self.fail_slot {
            return Err("backend unavailable".to_string());
        }
        media::allocate_slot(guest_id, file_name, mime_type).map_err(|e| e.to_string())
    }

    async fn commit_metadata(&self, req: &SaveMediaMetadata) -> Result<Uuid, String> {
        if self.fail_commit {
            return Err("backend rejected metadata".to_string());
        }
        self.commits.lock().unwrap().push(req.clone());
        Ok(Uuid::new_v4())
    }
}

#[derive(Default)]
struct MockStore {
    delay: Duration,
    // Fail the first N put calls, then succeed.
    fail_first_puts: usize,
    attempted_puts: AtomicUsize,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl BlobStore for MockStore {
    async fn put(&self, key: &str, _data: Vec<u8>, _content_type: &str) -> Result<(), String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let attempt = self.attempted_puts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first_puts {
            return Err("storage rejected the object".to_string());
        }
        self.puts.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

fn coordinator(api: Arc<MockApi>, store: Arc<MockStore>) -> UploadCoordinator {
    UploadCoordinator::new(api, store, Uuid::new_v4(), Uuid::new_v4())
}

fn png_bytes() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        64,
        48,
        image::Rgb([20, 120, 220]),
    ));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn image_file(name: &str) -> UploadFile {
    UploadFile {
        file_name: name.to_string(),
        mime_type: Some("image/png".to_string()),
        data: png_bytes(),
    }
}

fn video_file(name: &str) -> UploadFile {
    UploadFile {
        file_name: name.to_string(),
        mime_type: Some("video/mp4".to_string()),
        data: vec![0u8; 256],
    }
}

#[tokio::test]
async fn success_path_uploads_thumbnail_and_commits() {
    let api = Arc::new(MockApi::default());
    let store = Arc::new(MockStore::default());

    let outcome = coordinator(api.clone(), store.clone())
        .upload_one(image_file("photo.png"))
        .await;

    assert_eq!(outcome.state, UploadState::Success);
    assert!(outcome.media_id.is_some());
    assert!(outcome.error.is_none());

    // Original plus thumbnail were stored, nothing was deleted.
    let puts = store.puts.lock().unwrap().clone();
    assert_eq!(puts.len(), 2);
    assert!(store.deletes.lock().unwrap().is_empty());

    let commits = api.commits.lock().unwrap();
    assert_eq!(commits.len(), 1);
    assert!(commits[0].storage_key.ends_with(".png"));
    assert!(commits[0]
        .thumbnail_key
        .as_deref()
        .is_some_and(|k| k.ends_with("-thumb.jpg")));
    assert_eq!(commits[0].file_size_bytes, Some(png_bytes().len() as i64));
}

#[tokio::test]
async fn commit_failure_rolls_back_the_uploaded_object() {
    let api = Arc::new(MockApi {
        fail_commit: true,
        ..Default::default()
    });
    let store = Arc::new(MockStore::default());

    let outcome = coordinator(api.clone(), store.clone())
        .upload_one(video_file("clip.mp4"))
        .await;

    assert_eq!(outcome.state, UploadState::Failed);
    assert!(matches!(outcome.error, Some(UploadError::Commit(_))));

    // Exactly one compensating delete, for exactly the key that was uploaded.
    let storage_key = outcome.storage_key.expect("slot was issued");
    let deletes = store.deletes.lock().unwrap().clone();
    assert_eq!(deletes, vec![storage_key]);
    assert!(api.commits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn commit_failure_also_rolls_back_the_thumbnail() {
    let api = Arc::new(MockApi {
        fail_commit: true,
        ..Default::default()
    });
    let store = Arc::new(MockStore::default());

    let outcome = coordinator(api, store.clone())
        .upload_one(image_file("photo.png"))
        .await;

    assert_eq!(outcome.state, UploadState::Failed);
    let deletes = store.deletes.lock().unwrap().clone();
    assert_eq!(deletes.len(), 2);
    assert!(deletes.iter().any(|k| k.contains("/original/")));
    assert!(deletes.iter().any(|k| k.contains("/thumbnail/")));
}

#[tokio::test]
async fn transfer_failure_never_triggers_a_delete() {
    let api = Arc::new(MockApi::default());
    let store = Arc::new(MockStore {
        fail_first_puts: usize::MAX,
        ..Default::default()
    });

    let outcome = coordinator(api.clone(), store.clone())
        .upload_one(video_file("clip.mp4"))
        .await;

    assert_eq!(outcome.state, UploadState::Failed);
    assert!(matches!(outcome.error, Some(UploadError::Transfer(_))));
    // The object was never created, so there is nothing to roll back.
    assert!(store.deletes.lock().unwrap().is_empty());
    assert!(api.commits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn slot_failure_touches_nothing() {
    let api = Arc::new(MockApi {
        fail_slot: true,
        ..Default::default()
    });
    let store = Arc::new(MockStore::default());

    let outcome = coordinator(api, store.clone())
        .upload_one(video_file("clip.mp4"))
        .await;

    assert_eq!(outcome.state, UploadState::Failed);
    assert!(matches!(outcome.error, Some(UploadError::Slot(_))));
    assert!(outcome.storage_key.is_none());
    assert!(store.puts.lock().unwrap().is_empty());
    assert!(store.deletes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn thumbnail_failure_degrades_instead_of_failing() {
    let api = Arc::new(MockApi::default());
    let store = Arc::new(MockStore::default());

    // Claims to be an image, but the bytes will not decode.
    let broken = UploadFile {
        file_name: "photo.jpg".to_string(),
        mime_type: Some("image/jpeg".to_string()),
        data: b"not really a jpeg".to_vec(),
    };
    let outcome = coordinator(api.clone(), store.clone())
        .upload_one(broken)
        .await;

    assert_eq!(outcome.state, UploadState::Success);
    assert!(outcome.thumbnail_key.is_none());

    // Only the original was stored; the commit carries no thumbnail key.
    assert_eq!(store.puts.lock().unwrap().len(), 1);
    let commits = api.commits.lock().unwrap();
    assert_eq!(commits[0].thumbnail_key, None);
}

#[tokio::test]
async fn concurrency_stays_within_the_ceiling() {
    let api = Arc::new(MockApi::default());
    let store = Arc::new(MockStore {
        delay: Duration::from_millis(25),
        ..Default::default()
    });

    let files: Vec<UploadFile> = (0..10)
        .map(|i| video_file(&format!("clip-{}.mp4", i)))
        .collect();
    let expected_names: Vec<String> = files.iter().map(|f| f.file_name.clone()).collect();

    let outcomes = coordinator(api, store.clone())
        .with_max_concurrent(3)
        .upload_all(files)
        .await;

    assert_eq!(outcomes.len(), 10);
    assert!(outcomes.iter().all(|o| o.state == UploadState::Success));
    // Outcomes come back in input order regardless of completion order.
    let names: Vec<String> = outcomes.iter().map(|o| o.file_name.clone()).collect();
    assert_eq!(names, expected_names);

    // Never more than three transfers in flight at once.
    assert!(store.max_in_flight.load(Ordering::SeqCst) <= 3);
    assert!(store.max_in_flight.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn full_flow_from_invite_to_gallery_over_the_real_backend() {
    let db = common::setup_db().await;

    // Invite round-trip, then guest resolution by fingerprint.
    let created = events::create_event(&db, "Wedding", None, None).await.unwrap();
    let access = events::validate_invite(&db, &created.invite_token)
        .await
        .unwrap();
    assert!(access.is_active);

    let guest = guests::resolve_guest(&db, access.event_id, None, Some("abc"), Some("Dana"))
        .await
        .unwrap();
    let again = guests::resolve_guest(&db, access.event_id, None, Some("abc"), None)
        .await
        .unwrap();
    assert_eq!(guest.guest_id, again.guest_id);

    // Upload through the in-process API; only the blob store is mocked.
    let store = Arc::new(MockStore::default());
    let coordinator = UploadCoordinator::new(
        Arc::new(DirectApi::new(db.clone())),
        store.clone(),
        access.event_id,
        guest.guest_id,
    );

    let outcome = coordinator.upload_one(image_file("photo.png")).await;
    assert_eq!(outcome.state, UploadState::Success);

    // The gallery now serves the thumbnail for the committed row.
    let (items, total, _) = media::list_media_by_event(&db, access.event_id, 1, 50)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].media_id, outcome.media_id.unwrap());
    assert!(items[0].display_key.contains("/thumbnail/"));
}

#[tokio::test]
async fn one_files_failure_never_blocks_its_siblings() {
    let api = Arc::new(MockApi::default());
    let store = Arc::new(MockStore {
        fail_first_puts: 1,
        ..Default::default()
    });

    let files = vec![
        video_file("first.mp4"),
        video_file("second.mp4"),
        video_file("third.mp4"),
    ];

    // Ceiling of one makes put order deterministic: the first file fails its
    // transfer, the rest go through untouched.
    let outcomes = coordinator(api.clone(), store.clone())
        .with_max_concurrent(1)
        .upload_all(files)
        .await;

    assert_eq!(outcomes[0].state, UploadState::Failed);
    assert!(matches!(outcomes[0].error, Some(UploadError::Transfer(_))));
    assert_eq!(outcomes[1].state, UploadState::Success);
    assert_eq!(outcomes[2].state, UploadState::Success);
    assert_eq!(api.commits.lock().unwrap().len(), 2);
}
