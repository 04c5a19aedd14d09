use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use uuid::Uuid;

use snapvite::services::events;
use snapvite::services::guests;
use snapvite::services::s3::StorageService;
use snapvite::services::uploader::{DirectApi, UploadCoordinator, UploadFile, UploadState};

#[derive(Parser)]
#[command(name = "admin", about = "Organizer utilities for the Snapvite backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an event and print its invite token (shown exactly once)
    CreateEvent {
        name: String,
        /// Event start, YYYY-MM-DD
        #[arg(long)]
        start_date: Option<String>,
        /// Event end, YYYY-MM-DD
        #[arg(long)]
        end_date: Option<String>,
    },
    /// Deactivate an event; its invite link stops working
    DeactivateEvent { event_id: Uuid },
    /// List events with guest and media counts
    ListEvents,
    /// Bulk-upload a directory of files into an event as the organizer
    Import {
        event_id: Uuid,
        dir: PathBuf,
        #[arg(long, default_value = "Organizer")]
        nickname: String,
    },
}

fn parse_date(s: &str) -> chrono::NaiveDateTime {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .expect("Dates must be YYYY-MM-DD")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
}

fn mime_for(path: &PathBuf) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime.to_string())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let db = Database::connect(database_url)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let cli = Cli::parse();

    match cli.command {
        Command::CreateEvent {
            name,
            start_date,
            end_date,
        } => {
            let created = events::create_event(
                &db,
                &name,
                start_date.as_deref().map(parse_date),
                end_date.as_deref().map(parse_date),
            )
            .await
            .expect("Failed to create event");

            println!("Event created: {} ({})", created.name, created.event_id);
            println!("Invite token (shown once, store it now): {}", created.invite_token);
        }
        Command::DeactivateEvent { event_id } => {
            let found = events::deactivate_event(&db, event_id)
                .await
                .expect("Failed to deactivate event");
            if found {
                println!("Event {} deactivated", event_id);
            } else {
                println!("Event {} not found", event_id);
            }
        }
        Command::ListEvents => {
            let items = events::list_events(&db).await.expect("Failed to list events");
            for item in items {
                println!(
                    "{} | {} | active={} | guests={} media={}",
                    item.event_id, item.name, item.is_active, item.guest_count, item.media_count
                );
            }
        }
        Command::Import {
            event_id,
            dir,
            nickname,
        } => {
            // A stable pseudo-fingerprint keeps repeated imports on one guest.
            let organizer = guests::resolve_guest(
                &db,
                event_id,
                None,
                Some("organizer-import"),
                Some(nickname.as_str()),
            )
            .await
            .expect("Failed to resolve organizer guest");

            let mut files = Vec::new();
            for entry in std::fs::read_dir(&dir).expect("Failed to read directory") {
                let path = entry.expect("Failed to read directory entry").path();
                if !path.is_file() {
                    continue;
                }
                let Some(mime_type) = mime_for(&path) else {
                    println!("Skipping {} (unsupported type)", path.display());
                    continue;
                };
                let data = std::fs::read(&path).expect("Failed to read file");
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("upload.bin")
                    .to_string();
                files.push(UploadFile {
                    file_name,
                    mime_type: Some(mime_type),
                    data,
                });
            }

            if files.is_empty() {
                println!("Nothing to import from {}", dir.display());
                return;
            }

            let coordinator = UploadCoordinator::new(
                Arc::new(DirectApi::new(db.clone())),
                Arc::new(StorageService::new().await),
                event_id,
                organizer.guest_id,
            );

            let outcomes = coordinator.upload_all(files).await;
            let ok = outcomes
                .iter()
                .filter(|o| o.state == UploadState::Success)
                .count();
            for outcome in &outcomes {
                match &outcome.error {
                    None => println!("{} -> ok", outcome.file_name),
                    Some(e) => println!("{} -> {}", outcome.file_name, e),
                }
            }
            println!("Imported {}/{} files", ok, outcomes.len());
        }
    }
}
