use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

/// Fresh in-memory database with the real migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("sqlite in-memory connection");
    Migrator::up(&db, None)
        .await
        .expect("migrations apply cleanly");
    db
}
