use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string_len(Movies::Title, 255))
                    .col(integer_null(Movies::ReleaseYear))
                    .col(integer_null(Movies::Duration))
                    .col(string_len_null(Movies::Tagline, 255))
                    .col(text_null(Movies::Description))
                    .col(double_null(Movies::Rating))
                    .col(string_len_null(Movies::MpaaRating, 10))
                    .col(text_null(Movies::PosterUrl))
                    .col(text_null(Movies::PageImgUrl))
                    .col(text_null(Movies::TrailerUrl))
                    .col(string_len_uniq(Movies::Slug, 255))
                    .col(big_integer(Movies::CreatedAt))
                    .col(big_integer(Movies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_release_year")
                    .table(Movies::Table)
                    .col(Movies::ReleaseYear)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actors::Table)
                    .if_not_exists()
                    .col(pk_auto(Actors::Id))
                    .col(string_len(Actors::Name, 255))
                    .col(text_null(Actors::Biography))
                    .col(text_null(Actors::PhotoUrl))
                    .col(text_null(Actors::ImdbId))
                    .col(string_len_uniq(Actors::Slug, 255))
                    .col(big_integer(Actors::CreatedAt))
                    .col(big_integer(Actors::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Directors::Table)
                    .if_not_exists()
                    .col(pk_auto(Directors::Id))
                    .col(string_len(Directors::Name, 255))
                    .col(text_null(Directors::Biography))
                    .col(text_null(Directors::PhotoUrl))
                    .col(text_null(Directors::ImdbId))
                    .col(string_len_uniq(Directors::Slug, 255))
                    .col(big_integer(Directors::CreatedAt))
                    .col(big_integer(Directors::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string_len(Genres::Name, 255))
                    .col(string_len_uniq(Genres::Slug, 255))
                    .col(big_integer(Genres::CreatedAt))
                    .col(big_integer(Genres::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Directors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(Clone, Copy, DeriveIden)]
pub(crate) enum Movies {
    Table,
    Id,
    Title,
    ReleaseYear,
    Duration,
    Tagline,
    Description,
    Rating,
    MpaaRating,
    PosterUrl,
    PageImgUrl,
    TrailerUrl,
    Slug,
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, DeriveIden)]
pub(crate) enum Actors {
    Table,
    Id,
    Name,
    Biography,
    PhotoUrl,
    ImdbId,
    Slug,
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, DeriveIden)]
pub(crate) enum Directors {
    Table,
    Id,
    Name,
    Biography,
    PhotoUrl,
    ImdbId,
    Slug,
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, DeriveIden)]
pub(crate) enum Genres {
    Table,
    Id,
    Name,
    Slug,
    CreatedAt,
    UpdatedAt,
}
