use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // pk_auto renders AUTOINCREMENT on SQLite, so ids of deleted films are never handed out again.
        manager
            .create_table(
                Table::create()
                    .table(Films::Table)
                    .if_not_exists()
                    .col(pk_auto(Films::Id))
                    .col(string_len(Films::Title, 160))
                    .col(boolean(Films::Favorite))
                    .col(string_null(Films::WatchDate))
                    .col(integer(Films::Rating))
                    .col(integer(Films::Owner))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_films_owner")
                            .from(Films::Table, Films::Owner)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_films_owner")
                    .table(Films::Table)
                    .col(Films::Owner)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Films::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Films {
    Table,
    Id,
    Title,
    Favorite,
    WatchDate,
    Rating,
    Owner,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
