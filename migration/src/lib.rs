pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_events_table;
mod m20250601_000002_create_guests_table;
mod m20250601_000003_create_media_table;
mod m20250601_000004_create_likes_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_events_table::Migration),
            Box::new(m20250601_000002_create_guests_table::Migration),
            Box::new(m20250601_000003_create_media_table::Migration),
            Box::new(m20250601_000004_create_likes_table::Migration),
        ]
    }
}
