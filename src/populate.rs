//! Batch import of the JSON files produced by the harvester.
//!
//! Entities are matched on slug, never on id, so re-running an import over
//! the same files inserts nothing.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use anyhow::Context;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QuerySelect,
    TransactionTrait,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::{
    entities::{actor, director, genre, movie, movie_actor, movie_director, movie_genre},
    slug::{movie_slug, slugify},
};

/// Rows per multi-row INSERT, well under SQLite's bind-parameter limit.
const INSERT_BATCH: usize = 50;

pub fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ImportReport {
    pub inserted: u64,
    pub skipped: u64,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: &'static str,
    pub report: ImportReport,
}

/// A record from one of the entity import files.
pub trait SlugRecord: DeserializeOwned + Serialize + Send {
    type Entity: EntityTrait;
    const FILE: &'static str;

    fn slug(&self) -> String;
    fn slug_column() -> <Self::Entity as EntityTrait>::Column;
    fn into_active_model(self, now: i64) -> <Self::Entity as EntityTrait>::ActiveModel;
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MovieRecord {
    pub title: String,
    pub release_year: Option<i32>,
    pub duration: Option<i32>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub mpaa_rating: Option<String>,
    pub poster_url: Option<String>,
    pub page_img_url: Option<String>,
    pub trailer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl SlugRecord for MovieRecord {
    type Entity = movie::Entity;
    const FILE: &'static str = "movies.json";

    fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| movie_slug(&self.title, self.release_year))
    }

    fn slug_column() -> movie::Column {
        movie::Column::Slug
    }

    fn into_active_model(self, now: i64) -> movie::ActiveModel {
        movie::ActiveModel {
            id: NotSet,
            slug: Set(self.slug()),
            title: Set(self.title),
            release_year: Set(self.release_year),
            duration: Set(self.duration),
            tagline: Set(self.tagline),
            description: Set(self.description),
            rating: Set(self.rating),
            mpaa_rating: Set(self.mpaa_rating),
            poster_url: Set(self.poster_url),
            page_img_url: Set(self.page_img_url),
            trailer_url: Set(self.trailer_url),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GenreRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl SlugRecord for GenreRecord {
    type Entity = genre::Entity;
    const FILE: &'static str = "genres.json";

    fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.name))
    }

    fn slug_column() -> genre::Column {
        genre::Column::Slug
    }

    fn into_active_model(self, now: i64) -> genre::ActiveModel {
        genre::ActiveModel {
            id: NotSet,
            slug: Set(self.slug()),
            name: Set(self.name),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

/// Shared shape of actor and director records.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PersonRecord {
    pub name: String,
    pub biography: Option<String>,
    pub photo_url: Option<String>,
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl PersonRecord {
    fn resolved_slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.name))
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ActorRecord(pub PersonRecord);

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DirectorRecord(pub PersonRecord);

impl SlugRecord for ActorRecord {
    type Entity = actor::Entity;
    const FILE: &'static str = "actors.json";

    fn slug(&self) -> String {
        self.0.resolved_slug()
    }

    fn slug_column() -> actor::Column {
        actor::Column::Slug
    }

    fn into_active_model(self, now: i64) -> actor::ActiveModel {
        let slug = self.slug();
        let p = self.0;
        actor::ActiveModel {
            id: NotSet,
            name: Set(p.name),
            biography: Set(p.biography),
            photo_url: Set(p.photo_url),
            imdb_id: Set(p.imdb_id),
            slug: Set(slug),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

impl SlugRecord for DirectorRecord {
    type Entity = director::Entity;
    const FILE: &'static str = "directors.json";

    fn slug(&self) -> String {
        self.0.resolved_slug()
    }

    fn slug_column() -> director::Column {
        director::Column::Slug
    }

    fn into_active_model(self, now: i64) -> director::ActiveModel {
        let slug = self.slug();
        let p = self.0;
        director::ActiveModel {
            id: NotSet,
            name: Set(p.name),
            biography: Set(p.biography),
            photo_url: Set(p.photo_url),
            imdb_id: Set(p.imdb_id),
            slug: Set(slug),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

/// Inserts every record whose slug is not stored yet, in one transaction.
/// Slugs repeated inside `records` are inserted once.
pub async fn import_entities<R>(db: &DatabaseConnection, records: Vec<R>) -> Result<ImportReport, DbErr>
where
    R: SlugRecord,
    <R::Entity as EntityTrait>::Model: IntoActiveModel<<R::Entity as EntityTrait>::ActiveModel>,
{
    let txn = db.begin().await?;
    let mut seen: HashSet<String> = R::Entity::find()
        .select_only()
        .column(R::slug_column())
        .into_tuple::<String>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();

    let now = now_sec();
    let mut report = ImportReport::default();
    let mut fresh = Vec::new();
    for record in records {
        let slug = record.slug();
        if !seen.insert(slug.clone()) {
            tracing::debug!(file = R::FILE, %slug, "already present, skipping");
            report.skipped += 1;
            continue;
        }
        fresh.push(record.into_active_model(now));
    }
    report.inserted = fresh.len() as u64;

    let mut rows = fresh.into_iter().peekable();
    while rows.peek().is_some() {
        let batch: Vec<_> = rows.by_ref().take(INSERT_BATCH).collect();
        R::Entity::insert_many(batch).exec_without_returning(&txn).await?;
    }

    txn.commit().await?;
    Ok(report)
}

/// The three movie association tables.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Link {
    Genres,
    Actors,
    Directors,
}

impl Link {
    pub const ALL: [Link; 3] = [Link::Genres, Link::Actors, Link::Directors];

    pub fn file(self) -> &'static str {
        match self {
            Link::Genres => "movie_genres.json",
            Link::Actors => "movie_actors.json",
            Link::Directors => "movie_directors.json",
        }
    }

    fn single_key(self) -> &'static str {
        match self {
            Link::Genres => "genre_slug",
            Link::Actors => "actor_slug",
            Link::Directors => "director_slug",
        }
    }

    fn many_key(self) -> &'static str {
        match self {
            Link::Genres => "genre_slugs",
            Link::Actors => "actor_slugs",
            Link::Directors => "director_slugs",
        }
    }

    async fn slug_ids<C: ConnectionTrait>(self, conn: &C) -> Result<HashMap<String, i32>, DbErr> {
        match self {
            Link::Genres => slug_ids::<genre::Entity, _>(conn, genre::Column::Slug, genre::Column::Id).await,
            Link::Actors => slug_ids::<actor::Entity, _>(conn, actor::Column::Slug, actor::Column::Id).await,
            Link::Directors => {
                slug_ids::<director::Entity, _>(conn, director::Column::Slug, director::Column::Id).await
            }
        }
    }

    async fn existing_pairs<C: ConnectionTrait>(self, conn: &C) -> Result<HashSet<(i32, i32)>, DbErr> {
        match self {
            Link::Genres => {
                pairs::<movie_genre::Entity, _>(conn, movie_genre::Column::MovieId, movie_genre::Column::GenreId)
                    .await
            }
            Link::Actors => {
                pairs::<movie_actor::Entity, _>(conn, movie_actor::Column::MovieId, movie_actor::Column::ActorId)
                    .await
            }
            Link::Directors => {
                pairs::<movie_director::Entity, _>(
                    conn,
                    movie_director::Column::MovieId,
                    movie_director::Column::DirectorId,
                )
                .await
            }
        }
    }

    async fn insert_pair<C: ConnectionTrait>(
        self,
        conn: &C,
        movie_id: i32,
        other_id: i32,
        now: i64,
    ) -> Result<(), DbErr> {
        match self {
            Link::Genres => {
                let row = movie_genre::ActiveModel {
                    movie_id: Set(movie_id),
                    genre_id: Set(other_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                movie_genre::Entity::insert(row).exec_without_returning(conn).await?;
            }
            Link::Actors => {
                let row = movie_actor::ActiveModel {
                    movie_id: Set(movie_id),
                    actor_id: Set(other_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                movie_actor::Entity::insert(row).exec_without_returning(conn).await?;
            }
            Link::Directors => {
                let row = movie_director::ActiveModel {
                    movie_id: Set(movie_id),
                    director_id: Set(other_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                movie_director::Entity::insert(row).exec_without_returning(conn).await?;
            }
        }
        Ok(())
    }
}

async fn slug_ids<E, C>(conn: &C, slug: E::Column, id: E::Column) -> Result<HashMap<String, i32>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let rows = E::find().select_only().column(slug).column(id).into_tuple::<(String, i32)>().all(conn).await?;
    Ok(rows.into_iter().collect())
}

async fn pairs<E, C>(conn: &C, left: E::Column, right: E::Column) -> Result<HashSet<(i32, i32)>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let rows = E::find().select_only().column(left).column(right).into_tuple::<(i32, i32)>().all(conn).await?;
    Ok(rows.into_iter().collect())
}

/// `{movie_slug, <right>_slugs: [...]}`; the single `<right>_slug` form is
/// folded into `slugs` as well.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkRecord {
    pub movie_slug: String,
    pub slugs: Vec<String>,
}

impl LinkRecord {
    pub fn from_value(link: Link, value: &Value) -> Option<Self> {
        let movie_slug = value.get("movie_slug")?.as_str()?.to_string();
        let mut slugs: Vec<String> = value
            .get(link.many_key())
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();
        if let Some(one) = value.get(link.single_key()).and_then(Value::as_str) {
            slugs.push(one.to_string());
        }
        Some(Self { movie_slug, slugs })
    }

    pub fn to_value(&self, link: Link) -> Value {
        let mut value = json!({ "movie_slug": self.movie_slug });
        value[link.many_key()] = json!(self.slugs);
        value
    }
}

/// Resolves slugs to ids and inserts the pairs not stored yet.
pub async fn import_links(
    db: &DatabaseConnection,
    link: Link,
    records: Vec<LinkRecord>,
) -> Result<ImportReport, DbErr> {
    let txn = db.begin().await?;
    let movies = slug_ids::<movie::Entity, _>(&txn, movie::Column::Slug, movie::Column::Id).await?;
    let others = link.slug_ids(&txn).await?;
    let mut existing = link.existing_pairs(&txn).await?;

    let now = now_sec();
    let mut report = ImportReport::default();
    for record in records {
        let Some(&movie_id) = movies.get(&record.movie_slug) else {
            tracing::warn!(file = link.file(), movie_slug = %record.movie_slug, "unknown movie, skipping");
            report.skipped += record.slugs.len() as u64;
            continue;
        };
        for slug in record.slugs {
            let Some(&other_id) = others.get(&slug) else {
                tracing::warn!(file = link.file(), %slug, "unknown slug, skipping");
                report.skipped += 1;
                continue;
            };
            if !existing.insert((movie_id, other_id)) {
                report.skipped += 1;
                continue;
            }
            link.insert_pair(&txn, movie_id, other_id, now).await?;
            report.inserted += 1;
        }
    }

    txn.commit().await?;
    Ok(report)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<R> {
    Many(Vec<R>),
    One(R),
}

impl<R> OneOrMany<R> {
    fn into_vec(self) -> Vec<R> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Accepts one JSON document (array or object) or newline-delimited JSON
/// where each line is an object or an array of objects.
pub fn parse_records<R: DeserializeOwned>(text: &str) -> anyhow::Result<Vec<R>> {
    let whole = match serde_json::from_str::<OneOrMany<R>>(text) {
        Ok(doc) => return Ok(doc.into_vec()),
        Err(err) => err,
    };
    let mut records = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<OneOrMany<R>>(line) {
            Ok(doc) => records.extend(doc.into_vec()),
            Err(_) => return Err(whole).context("neither a JSON document nor newline-delimited JSON"),
        }
    }
    Ok(records)
}

async fn read_file(dir: &Path, file: &str) -> anyhow::Result<Option<String>> {
    let path = dir.join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "import file missing, skipping");
            Ok(None)
        }
        Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
    }
}

async fn import_file<R>(db: &DatabaseConnection, dir: &Path) -> anyhow::Result<Option<FileReport>>
where
    R: SlugRecord,
    <R::Entity as EntityTrait>::Model: IntoActiveModel<<R::Entity as EntityTrait>::ActiveModel>,
{
    let Some(text) = read_file(dir, R::FILE).await? else {
        return Ok(None);
    };
    let records: Vec<R> = parse_records(&text).with_context(|| format!("parsing {}", R::FILE))?;
    let report = import_entities(db, records).await.with_context(|| format!("importing {}", R::FILE))?;
    tracing::info!(file = R::FILE, inserted = report.inserted, skipped = report.skipped, "imported");
    Ok(Some(FileReport { file: R::FILE, report }))
}

/// Imports every file found in `dir`: entities first, then associations.
pub async fn populate(db: &DatabaseConnection, dir: &Path) -> anyhow::Result<Vec<FileReport>> {
    let mut reports = Vec::new();
    reports.extend(import_file::<GenreRecord>(db, dir).await?);
    reports.extend(import_file::<MovieRecord>(db, dir).await?);
    reports.extend(import_file::<ActorRecord>(db, dir).await?);
    reports.extend(import_file::<DirectorRecord>(db, dir).await?);

    for link in Link::ALL {
        let Some(text) = read_file(dir, link.file()).await? else {
            continue;
        };
        let values: Vec<Value> = parse_records(&text).with_context(|| format!("parsing {}", link.file()))?;
        let records = values
            .iter()
            .filter_map(|v| {
                let record = LinkRecord::from_value(link, v);
                if record.is_none() {
                    tracing::warn!(file = link.file(), record = %v, "record without movie_slug, skipping");
                }
                record
            })
            .collect();
        let report =
            import_links(db, link, records).await.with_context(|| format!("importing {}", link.file()))?;
        tracing::info!(file = link.file(), inserted = report.inserted, skipped = report.skipped, "imported");
        reports.push(FileReport { file: link.file(), report });
    }

    Ok(reports)
}

pub fn write_records<T: Serialize>(dir: &Path, file: &str, records: &[T]) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(file);
    let body = serde_json::to_string_pretty(records)?;
    std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), records = records.len(), "wrote import file");
    Ok(())
}
