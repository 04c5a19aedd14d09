use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Likes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Likes::LikeId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Likes::MediaId).uuid().not_null())
                    .col(ColumnDef::new(Likes::GuestId).uuid().not_null())
                    .col(ColumnDef::new(Likes::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_media_id")
                            .from(Likes::Table, Likes::MediaId)
                            .to(Media::Table, Media::MediaId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_guest_id")
                            .from(Likes::Table, Likes::GuestId)
                            .to(Guests::Table, Guests::GuestId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A guest likes a media item at most once; the toggle leans on this.
        manager
            .create_index(
                Index::create()
                    .name("idx_likes_media_guest")
                    .table(Likes::Table)
                    .col(Likes::MediaId)
                    .col(Likes::GuestId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Likes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Likes {
    Table,
    LikeId,
    MediaId,
    GuestId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Media {
    Table,
    MediaId,
}

#[derive(DeriveIden)]
enum Guests {
    Table,
    GuestId,
}
