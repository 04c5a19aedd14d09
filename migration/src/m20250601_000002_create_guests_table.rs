use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Guests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Guests::GuestId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Guests::EventId).uuid().not_null())
                    .col(ColumnDef::new(Guests::Nickname).string())
                    .col(ColumnDef::new(Guests::Fingerprint).string())
                    .col(ColumnDef::new(Guests::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_guests_event_id")
                            .from(Guests::Table, Guests::EventId)
                            .to(Events::Table, Events::EventId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One guest per (event, fingerprint). NULL fingerprints stay distinct,
        // so fingerprint-less guests are unaffected.
        manager
            .create_index(
                Index::create()
                    .name("idx_guests_event_fingerprint")
                    .table(Guests::Table)
                    .col(Guests::EventId)
                    .col(Guests::Fingerprint)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Guests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Guests {
    Table,
    GuestId,
    EventId,
    Nickname,
    Fingerprint,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    EventId,
}
