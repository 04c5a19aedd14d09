mod events;
mod guests;
mod home;
mod likes;
mod media;

use axum::{
    routing::{get, patch, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Define the OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // General endpoints
        home::root,
        // Event endpoints
        events::create_event,
        events::validate_invite,
        events::list_events,
        events::get_event,
        events::deactivate_event,
        // Guest endpoints
        guests::create_guest,
        guests::find_guest,
        guests::get_guest,
        guests::list_event_guests,
        // Media endpoints
        media::create_upload_slot,
        media::save_metadata,
        media::list_event_media,
        media::get_media_detail,
        media::delete_media,
        // Like endpoints
        likes::toggle_like,
        likes::list_media_likes,
    ),
    components(
        schemas(
            // Event schemas
            events::CreateEventRequest,
            events::ValidateInviteRequest,
            crate::services::events::EventCreated,
            crate::services::events::EventAccess,
            crate::services::events::EventDetail,
            crate::services::events::EventListItem,
            // Guest schemas
            guests::CreateGuestRequest,
            crate::services::guests::GuestCreated,
            crate::services::guests::GuestDetail,
            crate::services::guests::GuestListItem,
            // Media schemas
            media::UploadSlotRequest,
            media::MediaCreated,
            media::GalleryItem,
            crate::services::media::UploadSlot,
            crate::services::media::SaveMediaMetadata,
            crate::services::media::MediaDetail,
            crate::entities::media::MediaType,
            crate::entities::media::ProcessingStatus,
            // Like schemas
            likes::ToggleLikeRequest,
            crate::services::likes::ToggleResult,
            crate::services::likes::ToggleAction,
            crate::services::likes::LikeDetail,
        )
    ),
    tags(
        (name = "General", description = "General API information"),
        (name = "Events", description = "Event creation, invite validation, and lifecycle"),
        (name = "Guests", description = "Guest registration and identity resolution"),
        (name = "Media", description = "Upload slots, metadata commits, and the shared gallery"),
        (name = "Likes", description = "Like toggling and listings")
    ),
    info(
        title = "Snapvite API",
        version = "0.1.0",
        description = "Backend for event guest photo and video sharing: invite-token access, anonymous guest identity, direct-to-storage uploads, and a shared gallery with likes",
    )
)]
struct ApiDoc;

pub fn create_routes(db: DatabaseConnection) -> Router {
    // Swagger UI (stateless)
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    // Guests hit the API straight from the invite page, so CORS stays open.
    let app_routes = Router::new()
        .route("/", get(home::root))
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/validate", post(events::validate_invite))
        .route("/events/{id}", get(events::get_event))
        .route("/events/{id}/deactivate", patch(events::deactivate_event))
        .route("/guests", post(guests::create_guest))
        .route("/guests/find", get(guests::find_guest))
        .route("/guests/{id}", get(guests::get_guest))
        .route("/guests/event/{event_id}", get(guests::list_event_guests))
        .route("/media/upload-slot", post(media::create_upload_slot))
        .route("/media/metadata", post(media::save_metadata))
        .route("/media/event/{event_id}", get(media::list_event_media))
        .route(
            "/media/{id}",
            get(media::get_media_detail).delete(media::delete_media),
        )
        .route("/likes/toggle", post(likes::toggle_like))
        .route("/likes/media/{media_id}", get(likes::list_media_likes))
        .layer(CorsLayer::permissive())
        .with_state(db);

    // Merge Swagger UI (which has no state) with the rest
    Router::new().merge(swagger_router).merge(app_routes)
}
