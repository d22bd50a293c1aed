use std::{fmt, str::FromStr};

use async_trait::async_trait;
use sea_orm::{
    DatabaseConnection, DbErr, EntityName, EntityTrait, ModelTrait, PrimaryKeyTrait, QueryOrder,
};
use serde::Serialize;

use crate::{
    entities::{actor, director, genre, movie},
    error::{AppError, AppResult},
    models::{GenreSummary, MovieSummary, PersonSummary},
};

pub fn parse_id(raw: &str) -> AppResult<i32> {
    raw.trim().parse().map_err(|_| AppError::InvalidId)
}

/// Resolves a single row by its numeric primary key.
pub async fn find_one<E>(db: &DatabaseConnection, raw_id: &str) -> AppResult<E::Model>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    let id = parse_id(raw_id)?;
    E::find_by_id(id).one(db).await?.ok_or(AppError::NotFound)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelationName {
    Actors,
    Directors,
    Genres,
    Movies,
}

impl RelationName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Actors => "actors",
            Self::Directors => "directors",
            Self::Genres => "genres",
            Self::Movies => "movies",
        }
    }
}

impl fmt::Display for RelationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "actors" => Ok(Self::Actors),
            "directors" => Ok(Self::Directors),
            "genres" => Ok(Self::Genres),
            "movies" => Ok(Self::Movies),
            other => Err(format!("unknown relation {other:?}")),
        }
    }
}

/// Related rows, serialized under the relation name: `{"actors": [...]}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedRows {
    Actors(Vec<PersonSummary>),
    Directors(Vec<PersonSummary>),
    Genres(Vec<GenreSummary>),
    Movies(Vec<MovieSummary>),
}

impl RelatedRows {
    pub fn len(&self) -> usize {
        match self {
            Self::Actors(rows) | Self::Directors(rows) => rows.len(),
            Self::Genres(rows) => rows.len(),
            Self::Movies(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entities exposing to-many relations by name.
///
/// `Ok(None)` means the entity has no relation of that name.
#[async_trait]
pub trait HasRelations: EntityTrait {
    async fn load_related(
        db: &DatabaseConnection,
        model: &Self::Model,
        relation: RelationName,
    ) -> Result<Option<RelatedRows>, DbErr>;
}

#[async_trait]
impl HasRelations for movie::Entity {
    async fn load_related(
        db: &DatabaseConnection,
        model: &movie::Model,
        relation: RelationName,
    ) -> Result<Option<RelatedRows>, DbErr> {
        let rows = match relation {
            RelationName::Actors => RelatedRows::Actors(
                summaries(model.find_related(actor::Entity).order_by_asc(actor::Column::Id).all(db).await?),
            ),
            RelationName::Directors => RelatedRows::Directors(summaries(
                model.find_related(director::Entity).order_by_asc(director::Column::Id).all(db).await?,
            )),
            RelationName::Genres => RelatedRows::Genres(
                summaries(model.find_related(genre::Entity).order_by_asc(genre::Column::Id).all(db).await?),
            ),
            RelationName::Movies => return Ok(None),
        };
        Ok(Some(rows))
    }
}

#[async_trait]
impl HasRelations for actor::Entity {
    async fn load_related(
        db: &DatabaseConnection,
        model: &actor::Model,
        relation: RelationName,
    ) -> Result<Option<RelatedRows>, DbErr> {
        if relation != RelationName::Movies {
            return Ok(None);
        }
        let movies = model.find_related(movie::Entity).order_by_asc(movie::Column::Id).all(db).await?;
        Ok(Some(RelatedRows::Movies(summaries(movies))))
    }
}

#[async_trait]
impl HasRelations for director::Entity {
    async fn load_related(
        db: &DatabaseConnection,
        model: &director::Model,
        relation: RelationName,
    ) -> Result<Option<RelatedRows>, DbErr> {
        if relation != RelationName::Movies {
            return Ok(None);
        }
        let movies = model.find_related(movie::Entity).order_by_asc(movie::Column::Id).all(db).await?;
        Ok(Some(RelatedRows::Movies(summaries(movies))))
    }
}

#[async_trait]
impl HasRelations for genre::Entity {
    async fn load_related(
        db: &DatabaseConnection,
        model: &genre::Model,
        relation: RelationName,
    ) -> Result<Option<RelatedRows>, DbErr> {
        if relation != RelationName::Movies {
            return Ok(None);
        }
        let movies = model.find_related(movie::Entity).order_by_asc(movie::Column::Id).all(db).await?;
        Ok(Some(RelatedRows::Movies(summaries(movies))))
    }
}

fn summaries<M, S: From<M>>(rows: Vec<M>) -> Vec<S> {
    rows.into_iter().map(S::from).collect()
}

/// Resolves the entity by id, then reads the named relation.
///
/// Id errors surface as `InvalidId`/`NotFound`; anything that goes wrong
/// with the relation itself is a `RelationFetch`.
pub async fn fetch_relation<E>(db: &DatabaseConnection, raw_id: &str, name: &str) -> AppResult<RelatedRows>
where
    E: HasRelations,
    E::Model: Sync,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    let model = find_one::<E>(db, raw_id).await?;
    let relation: RelationName = name.parse().map_err(AppError::RelationFetch)?;
    match E::load_related(db, &model, relation).await {
        Ok(Some(rows)) => Ok(rows),
        Ok(None) => Err(AppError::RelationFetch(format!(
            "{} has no relation {relation}",
            E::default().table_name()
        ))),
        Err(err) => Err(AppError::RelationFetch(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id(" 42 ").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(AppError::InvalidId)));
        assert!(matches!(parse_id("4.2"), Err(AppError::InvalidId)));
    }

    #[test]
    fn relation_names_round_trip() {
        for name in ["actors", "directors", "genres", "movies"] {
            assert_eq!(name.parse::<RelationName>().unwrap().as_str(), name);
        }
        assert!("reviews".parse::<RelationName>().is_err());
    }

    #[test]
    fn related_rows_are_keyed_by_relation() {
        let rows = RelatedRows::Genres(vec![GenreSummary { id: 1, name: "Action".into(), slug: "action".into() }]);
        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            json!({"genres": [{"id": 1, "name": "Action", "slug": "action"}]})
        );
    }
}
