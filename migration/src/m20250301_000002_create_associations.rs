use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000001_create_catalog::{Actors, Directors, Genres, Movies};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Builds a `movie_<right>` link table keyed on both foreign ids.
fn link_table<T, R>(table: T, movie_id: T, right_id: T, right_table: R, right_pk: R) -> TableCreateStatement
where
    T: IntoIden + Copy + 'static,
    R: IntoIden + Copy + 'static,
{
    Table::create()
        .table(table)
        .if_not_exists()
        .col(integer(movie_id))
        .col(integer(right_id))
        .col(big_integer(Link::CreatedAt))
        .col(big_integer(Link::UpdatedAt))
        .primary_key(Index::create().col(movie_id).col(right_id))
        .foreign_key(
            ForeignKey::create()
                .from(table, movie_id)
                .to(Movies::Table, Movies::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .from(table, right_id)
                .to(right_table, right_pk)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(link_table(
                MovieGenres::Table,
                MovieGenres::MovieId,
                MovieGenres::GenreId,
                Genres::Table,
                Genres::Id,
            ))
            .await?;

        manager
            .create_table(link_table(
                MovieActors::Table,
                MovieActors::MovieId,
                MovieActors::ActorId,
                Actors::Table,
                Actors::Id,
            ))
            .await?;

        manager
            .create_table(link_table(
                MovieDirectors::Table,
                MovieDirectors::MovieId,
                MovieDirectors::DirectorId,
                Directors::Table,
                Directors::Id,
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_actors_actor_id")
                    .table(MovieActors::Table)
                    .col(MovieActors::ActorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_directors_director_id")
                    .table(MovieDirectors::Table)
                    .col(MovieDirectors::DirectorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_genres_genre_id")
                    .table(MovieGenres::Table)
                    .col(MovieGenres::GenreId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MovieDirectors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieActors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieGenres::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Link {
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, DeriveIden)]
enum MovieGenres {
    Table,
    MovieId,
    GenreId,
}

#[derive(Clone, Copy, DeriveIden)]
enum MovieActors {
    Table,
    MovieId,
    ActorId,
}

#[derive(Clone, Copy, DeriveIden)]
enum MovieDirectors {
    Table,
    MovieId,
    DirectorId,
}
