//! Aggregate statistics served by `GET /stats`.
//!
//! Each section is computed independently. A failing section is logged and
//! left out of the response; only when every section fails does the endpoint
//! report an error.

use std::collections::BTreeMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationDef,
    RelationTrait, Select, Statement,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};
use serde::Serialize;

use crate::{
    entities::{actor, director, genre, movie, movie_actor, movie_director, movie_genre},
    error::{AppError, AppResult},
};

const TOP_LIMIT: u64 = 10;
const TOP_GENRES: u64 = 5;
const MIN_RATED_FOR_DIRECTOR_AVG: i64 = 3;
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Default, Serialize)]
pub struct Statistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_stats: Option<MovieStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_stats: Option<ActorStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director_stats: Option<DirectorStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_stats: Option<GenreStats>,
}

impl Statistics {
    pub fn is_empty(&self) -> bool {
        self.movie_stats.is_none()
            && self.actor_stats.is_none()
            && self.director_stats.is_none()
            && self.genre_stats.is_none()
    }
}

pub async fn collect(db: &DatabaseConnection) -> AppResult<Statistics> {
    let stats = Statistics {
        movie_stats: section("movie", movie_stats(db).await),
        actor_stats: section("actor", actor_stats(db).await),
        director_stats: section("director", director_stats(db).await),
        genre_stats: section("genre", genre_stats(db).await),
    };
    if stats.is_empty() {
        return Err(AppError::StatisticsUnavailable);
    }
    Ok(stats)
}

fn section<T>(name: &str, result: Result<T, DbErr>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(section = name, error = %err, "statistics section failed");
            None
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieStats {
    pub total: u64,
    pub movies_by_year: BTreeMap<String, i64>,
    pub oldest_movie: Option<MovieBrief>,
    pub newest_movie: Option<MovieBrief>,
    pub average_duration: f64,
    pub median_duration: f64,
    pub longest_movie: Option<MovieBrief>,
    pub shortest_movie: Option<MovieBrief>,
    pub mpaa_distribution: BTreeMap<String, i64>,
    pub top_rated_movies: Vec<RatedMovie>,
    /// Keyed by bracket label, e.g. `"90-120 min"`. Empty brackets are absent.
    pub length_brackets: BTreeMap<String, i64>,
    pub average_rating_by_year: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieBrief {
    pub title: String,
    pub year: Option<i32>,
    pub id: i32,
    pub slug: String,
    pub poster_url: Option<String>,
}

impl From<movie::Model> for MovieBrief {
    fn from(m: movie::Model) -> Self {
        Self { title: m.title, year: m.release_year, id: m.id, slug: m.slug, poster_url: m.poster_url }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatedMovie {
    pub title: String,
    pub rating: f64,
    pub id: i32,
    pub slug: String,
    pub poster_url: Option<String>,
}

async fn movie_stats(db: &DatabaseConnection) -> Result<MovieStats, DbErr> {
    let total = movie::Entity::find().count(db).await?;

    let movies_by_year = movie::Entity::find()
        .select_only()
        .column(movie::Column::ReleaseYear)
        .column_as(count_of(movie_col(movie::Column::Id)), "count")
        .group_by(movie::Column::ReleaseYear)
        .into_tuple::<(Option<i32>, i64)>()
        .all(db)
        .await?
        .into_iter()
        .map(|(year, count)| (year_key(year), count))
        .collect();

    let average_duration: Option<Option<f64>> = movie::Entity::find()
        .select_only()
        .column_as(avg_as_double(movie_col(movie::Column::Duration)), "average")
        .into_tuple()
        .one(db)
        .await?;

    let mpaa_distribution = movie::Entity::find()
        .select_only()
        .column(movie::Column::MpaaRating)
        .column_as(count_of(movie_col(movie::Column::Id)), "count")
        .group_by(movie::Column::MpaaRating)
        .into_tuple::<(Option<String>, i64)>()
        .all(db)
        .await?
        .into_iter()
        .map(|(code, count)| (code.unwrap_or_else(|| UNKNOWN.to_string()), count))
        .collect();

    let top_rated_movies = movie::Entity::find()
        .filter(movie::Column::Rating.is_not_null())
        .order_by_desc(movie::Column::Rating)
        .order_by_asc(movie::Column::Id)
        .limit(TOP_LIMIT)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|m| {
            Some(RatedMovie {
                rating: round2(m.rating?),
                title: m.title,
                id: m.id,
                slug: m.slug,
                poster_url: m.poster_url,
            })
        })
        .collect();

    let average_rating_by_year = movie::Entity::find()
        .select_only()
        .column(movie::Column::ReleaseYear)
        .column_as(avg_as_double(movie_col(movie::Column::Rating)), "average")
        .filter(movie::Column::Rating.is_not_null())
        .group_by(movie::Column::ReleaseYear)
        .into_tuple::<(Option<i32>, Option<f64>)>()
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(year, avg)| Some((year_key(year), round2(avg?))))
        .collect();

    Ok(MovieStats {
        total,
        movies_by_year,
        oldest_movie: movie_by(db, movie::Column::ReleaseYear, true).await?,
        newest_movie: movie_by(db, movie::Column::ReleaseYear, false).await?,
        average_duration: round2(average_duration.flatten().unwrap_or(0.0)),
        median_duration: median_duration(db).await?.unwrap_or(0.0),
        longest_movie: movie_by(db, movie::Column::Duration, false).await?,
        shortest_movie: movie_by(db, movie::Column::Duration, true).await?,
        mpaa_distribution,
        top_rated_movies,
        length_brackets: length_brackets(db).await?,
        average_rating_by_year,
    })
}

/// First movie ordered by `column`, skipping rows where it is unknown.
/// Ties go to the lowest id.
async fn movie_by(
    db: &DatabaseConnection,
    column: movie::Column,
    ascending: bool,
) -> Result<Option<MovieBrief>, DbErr> {
    let select = movie::Entity::find().filter(column.is_not_null());
    let select = if ascending { select.order_by_asc(column) } else { select.order_by_desc(column) };
    let found = select.order_by_asc(movie::Column::Id).one(db).await?;
    Ok(found.map(MovieBrief::from))
}

async fn median_duration(db: &DatabaseConnection) -> Result<Option<f64>, DbErr> {
    if db.get_database_backend() == DbBackend::Postgres {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "SELECT PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY duration) AS median FROM movies",
        );
        let Some(row) = db.query_one(stmt).await? else {
            return Ok(None);
        };
        return row.try_get::<Option<f64>>("", "median");
    }

    let durations: Vec<f64> = movie::Entity::find()
        .select_only()
        .column(movie::Column::Duration)
        .filter(movie::Column::Duration.is_not_null())
        .order_by_asc(movie::Column::Duration)
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .map(f64::from)
        .collect();
    Ok(percentile_cont(&durations, 0.5))
}

async fn length_brackets(db: &DatabaseConnection) -> Result<BTreeMap<String, i64>, DbErr> {
    let duration = || Expr::col((movie::Entity, movie::Column::Duration));
    let bracket: SimpleExpr = Expr::case(duration().lt(90), Expr::val("< 90 min"))
        .case(duration().between(90, 120), Expr::val("90-120 min"))
        .case(duration().between(120, 150), Expr::val("120-150 min"))
        .case(duration().gt(150), Expr::val("> 150 min"))
        .finally(Expr::val(UNKNOWN))
        .into();

    let rows = movie::Entity::find()
        .select_only()
        .column_as(bracket, "length_group")
        .column_as(count_of(movie_col(movie::Column::Id)), "count")
        .group_by(Expr::col(Alias::new("length_group")))
        .into_tuple::<(String, i64)>()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

/// Actors and directors: entities credited on movies through a link table.
trait Credited: EntityTrait {
    const ID: Self::Column;
    const NAME: Self::Column;
    const SLUG: Self::Column;
    const PHOTO_URL: Self::Column;

    /// Person to link table.
    fn credits() -> RelationDef;
    /// Link table to movie.
    fn credited_movie() -> RelationDef;
}

impl Credited for actor::Entity {
    const ID: actor::Column = actor::Column::Id;
    const NAME: actor::Column = actor::Column::Name;
    const SLUG: actor::Column = actor::Column::Slug;
    const PHOTO_URL: actor::Column = actor::Column::PhotoUrl;

    fn credits() -> RelationDef {
        actor::Relation::MovieActor.def()
    }

    fn credited_movie() -> RelationDef {
        movie_actor::Relation::Movie.def()
    }
}

impl Credited for director::Entity {
    const ID: director::Column = director::Column::Id;
    const NAME: director::Column = director::Column::Name;
    const SLUG: director::Column = director::Column::Slug;
    const PHOTO_URL: director::Column = director::Column::PhotoUrl;

    fn credits() -> RelationDef {
        director::Relation::MovieDirector.def()
    }

    fn credited_movie() -> RelationDef {
        movie_director::Relation::Movie.def()
    }
}

/// Person identity columns joined to their movies, grouped per person.
fn credited_movies<P: Credited>() -> Select<P> {
    P::find()
        .select_only()
        .column(P::ID)
        .column(P::NAME)
        .column(P::SLUG)
        .column(P::PHOTO_URL)
        .join(JoinType::InnerJoin, P::credits())
        .join(JoinType::InnerJoin, P::credited_movie())
        .group_by(P::ID)
        .group_by(P::NAME)
        .group_by(P::SLUG)
        .group_by(P::PHOTO_URL)
}

#[derive(Clone, Debug, PartialEq, Serialize, FromQueryResult)]
pub struct PersonCount {
    pub name: String,
    pub movie_count: i64,
    pub id: i32,
    pub slug: String,
    pub photo_url: Option<String>,
}

async fn most_credited<P: Credited>(db: &DatabaseConnection) -> Result<Vec<PersonCount>, DbErr> {
    credited_movies::<P>()
        .column_as(count_of(movie_col(movie::Column::Id)), "movie_count")
        .order_by_desc(count_of(movie_col(movie::Column::Id)))
        .order_by_asc(P::ID)
        .limit(TOP_LIMIT)
        .into_model::<PersonCount>()
        .all(db)
        .await
}

#[derive(Debug, Serialize)]
pub struct ActorStats {
    pub total: u64,
    pub most_frequent_actors: Vec<PersonCount>,
    pub longest_career_actor: Option<CareerSpan>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CareerSpan {
    pub name: String,
    pub career_span: i32,
    pub from: Option<i32>,
    pub to: Option<i32>,
    pub id: i32,
    pub slug: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct CareerRow {
    id: i32,
    name: String,
    slug: String,
    photo_url: Option<String>,
    first_year: Option<i32>,
    last_year: Option<i32>,
}

impl CareerRow {
    fn span(&self) -> i32 {
        self.last_year.unwrap_or(0) - self.first_year.unwrap_or(0)
    }
}

async fn actor_stats(db: &DatabaseConnection) -> Result<ActorStats, DbErr> {
    let careers = credited_movies::<actor::Entity>()
        .column_as(Expr::col((movie::Entity, movie::Column::ReleaseYear)).min(), "first_year")
        .column_as(Expr::col((movie::Entity, movie::Column::ReleaseYear)).max(), "last_year")
        .having(Expr::expr(count_of(movie_col(movie::Column::Id))).gt(1))
        .order_by_asc(actor::Column::Id)
        .into_model::<CareerRow>()
        .all(db)
        .await?;

    Ok(ActorStats {
        total: actor::Entity::find().count(db).await?,
        most_frequent_actors: most_credited::<actor::Entity>(db).await?,
        longest_career_actor: longest_career(careers),
    })
}

/// The widest span wins; on a tie the earliest row is kept.
fn longest_career(rows: Vec<CareerRow>) -> Option<CareerSpan> {
    let mut best: Option<CareerRow> = None;
    for row in rows {
        if best.as_ref().is_none_or(|b| row.span() > b.span()) {
            best = Some(row);
        }
    }
    best.map(|row| CareerSpan {
        career_span: row.span(),
        name: row.name,
        from: row.first_year,
        to: row.last_year,
        id: row.id,
        slug: row.slug,
        photo_url: row.photo_url,
    })
}

#[derive(Debug, Serialize)]
pub struct DirectorStats {
    pub total: u64,
    pub most_prolific: Vec<PersonCount>,
    pub highest_avg_rated: Vec<RatedDirector>,
}

#[derive(Clone, Debug, PartialEq, Serialize, FromQueryResult)]
pub struct RatedDirector {
    pub name: String,
    pub avg_rating: f64,
    pub movie_count: i64,
    pub id: i32,
    pub slug: String,
    pub photo_url: Option<String>,
}

async fn director_stats(db: &DatabaseConnection) -> Result<DirectorStats, DbErr> {
    let average = || avg_as_double(movie_col(movie::Column::Rating));
    let mut highest_avg_rated = credited_movies::<director::Entity>()
        .column_as(average(), "avg_rating")
        .column_as(count_of(movie_col(movie::Column::Id)), "movie_count")
        .filter(movie::Column::Rating.is_not_null())
        .having(Expr::expr(count_of(movie_col(movie::Column::Id))).gte(MIN_RATED_FOR_DIRECTOR_AVG))
        .order_by_desc(average())
        .order_by_asc(director::Column::Id)
        .limit(TOP_LIMIT)
        .into_model::<RatedDirector>()
        .all(db)
        .await?;
    for d in &mut highest_avg_rated {
        d.avg_rating = round2(d.avg_rating);
    }

    Ok(DirectorStats {
        total: director::Entity::find().count(db).await?,
        most_prolific: most_credited::<director::Entity>(db).await?,
        highest_avg_rated,
    })
}

#[derive(Debug, Serialize)]
pub struct GenreStats {
    /// Genres with at least one movie.
    pub total: u64,
    pub most_common: Vec<GenreCount>,
    /// Genre name to release year to movie count.
    pub popularity_over_time: BTreeMap<String, BTreeMap<String, i64>>,
    pub average_rating: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct GenreCount {
    pub name: String,
    pub count: i64,
}

fn genre_movies() -> Select<genre::Entity> {
    genre::Entity::find()
        .select_only()
        .join(JoinType::InnerJoin, genre::Relation::MovieGenre.def())
        .join(JoinType::InnerJoin, movie_genre::Relation::Movie.def())
}

async fn genre_stats(db: &DatabaseConnection) -> Result<GenreStats, DbErr> {
    let total = genre_movies().column(genre::Column::Id).distinct().count(db).await?;

    let most_common = genre_movies()
        .column(genre::Column::Name)
        .column_as(count_of(movie_col(movie::Column::Id)), "count")
        .group_by(genre::Column::Id)
        .group_by(genre::Column::Name)
        .order_by_desc(count_of(movie_col(movie::Column::Id)))
        .order_by_asc(genre::Column::Id)
        .limit(TOP_GENRES)
        .into_model::<GenreCount>()
        .all(db)
        .await?;

    let mut popularity_over_time: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
    let rows = genre_movies()
        .column(genre::Column::Name)
        .column(movie::Column::ReleaseYear)
        .column_as(count_of(movie_col(movie::Column::Id)), "count")
        .group_by(genre::Column::Name)
        .group_by(movie::Column::ReleaseYear)
        .into_tuple::<(String, Option<i32>, i64)>()
        .all(db)
        .await?;
    for (name, year, count) in rows {
        popularity_over_time.entry(name).or_default().insert(year_key(year), count);
    }

    let average_rating = genre_movies()
        .column(genre::Column::Name)
        .column_as(avg_as_double(movie_col(movie::Column::Rating)), "average")
        .filter(movie::Column::Rating.is_not_null())
        .group_by(genre::Column::Name)
        .into_tuple::<(String, Option<f64>)>()
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(name, avg)| Some((name, round2(avg?))))
        .collect();

    Ok(GenreStats { total, most_common, popularity_over_time, average_rating })
}

fn movie_col(column: movie::Column) -> Expr {
    Expr::col((movie::Entity, column))
}

fn count_of(expr: Expr) -> SimpleExpr {
    expr.count()
}

/// Postgres averages integers as NUMERIC; the cast keeps every backend on f64.
fn avg_as_double(expr: Expr) -> SimpleExpr {
    Expr::expr(Func::avg(expr)).cast_as(Alias::new("DOUBLE PRECISION"))
}

fn year_key(year: Option<i32>) -> String {
    year.map_or_else(|| UNKNOWN.to_string(), |y| y.to_string())
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Continuous percentile over an ascending slice, interpolating between
/// neighbours the way `PERCENTILE_CONT` does. `None` for an empty slice.
pub fn percentile_cont(sorted: &[f64], fraction: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = fraction.clamp(0.0, 1.0) * last as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}
