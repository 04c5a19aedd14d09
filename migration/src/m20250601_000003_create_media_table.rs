use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Media::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Media::MediaId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Media::EventId).uuid().not_null())
                    .col(ColumnDef::new(Media::GuestId).uuid())
                    .col(ColumnDef::new(Media::MediaType).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Media::StorageKey)
                            .string_len(512)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Media::ThumbnailKey).string_len(512))
                    .col(ColumnDef::new(Media::MimeType).string_len(100))
                    .col(ColumnDef::new(Media::FileSizeBytes).big_integer())
                    .col(
                        ColumnDef::new(Media::ProcessingStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Media::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_media_event_id")
                            .from(Media::Table, Media::EventId)
                            .to(Events::Table, Events::EventId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_media_guest_id")
                            .from(Media::Table, Media::GuestId)
                            .to(Guests::Table, Guests::GuestId)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Media::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Media {
    Table,
    MediaId,
    EventId,
    GuestId,
    MediaType,
    StorageKey,
    ThumbnailKey,
    MimeType,
    FileSizeBytes,
    ProcessingStatus,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    EventId,
}

#[derive(DeriveIden)]
enum Guests {
    Table,
    GuestId,
}
