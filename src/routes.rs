use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRequestParts, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::{EntityName, EntityTrait};

use crate::{
    AppState,
    entities::{actor, director, genre, movie},
    envelope::Envelope,
    error::{AppError, AppResult},
    lookup::{self, HasRelations, RelatedRows},
    models::{
        ActorPage, DirectorPage, GenrePage, GenreSummary, MoviePage, MovieSummary, PersonSummary,
        SingleActor, SingleDirector, SingleGenre, SingleMovie,
    },
    query::{self, FieldSet, ListQuery, Page, QueryParams},
    stats::{self, Statistics},
};

const MOVIE_FIELDS: FieldSet<movie::Column> = FieldSet {
    id: movie::Column::Id,
    sortable: &[
        ("title", movie::Column::Title),
        ("release_year", movie::Column::ReleaseYear),
        ("duration", movie::Column::Duration),
        ("rating", movie::Column::Rating),
    ],
    exact: &[("release_year", movie::Column::ReleaseYear), ("mpaa_rating", movie::Column::MpaaRating)],
    range: &[
        ("duration", movie::Column::Duration),
        ("release_year", movie::Column::ReleaseYear),
        ("rating", movie::Column::Rating),
    ],
    search: &[movie::Column::Title],
};

const ACTOR_FIELDS: FieldSet<actor::Column> = FieldSet {
    id: actor::Column::Id,
    sortable: &[("name", actor::Column::Name)],
    exact: &[],
    range: &[],
    search: &[actor::Column::Name],
};

const DIRECTOR_FIELDS: FieldSet<director::Column> = FieldSet {
    id: director::Column::Id,
    sortable: &[("name", director::Column::Name)],
    exact: &[],
    range: &[],
    search: &[director::Column::Name],
};

const GENRE_FIELDS: FieldSet<genre::Column> = FieldSet {
    id: genre::Column::Id,
    sortable: &[("name", genre::Column::Name)],
    exact: &[],
    range: &[],
    search: &[genre::Column::Name],
};

/// `Query` whose rejection renders through the envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
struct Query<T>(T);

/// `Path` whose rejection renders through the envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
struct Path<T>(T);

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/{id}", get(get_movie))
        .route("/movies/{id}/{relation}", get(related::<movie::Entity>))
        .route("/actors", get(list_actors))
        .route("/actors/{id}", get(get_actor))
        .route("/actors/{id}/{relation}", get(related::<actor::Entity>))
        .route("/directors", get(list_directors))
        .route("/directors/{id}", get(get_director))
        .route("/directors/{id}/{relation}", get(related::<director::Entity>))
        .route("/genres", get(list_genres))
        .route("/genres/{id}", get(get_genre))
        .route("/genres/{id}/{relation}", get(related::<genre::Entity>))
        .route("/stats", get(get_stats))
        .method_not_allowed_fallback(method_not_allowed);

    Router::new()
        .route("/", get(index))
        .nest("/api/v1", api)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
}

pub async fn index(State(state): State<Arc<AppState>>) -> String {
    format!("Welcome to {} Backend!\n", state.config.name)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed() -> Envelope<()> {
    Envelope::failure(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

/// Parses, filters and pages one collection.
async fn list<E>(
    state: &AppState,
    params: &QueryParams,
    fields: &FieldSet<E::Column>,
) -> AppResult<(Page<E::Model>, ListQuery<E::Column>)>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let list_query = ListQuery::parse(params, fields, state.config.max_per_page)?;
    let select = query::apply(E::find(), &list_query, fields);
    let page = query::fetch_page(&state.db, select, list_query.pagination).await?;
    tracing::debug!(
        table = %E::default().table_name(),
        total = page.total,
        returned = page.items.len(),
        "listed"
    );
    Ok((page, list_query))
}

fn convert<M, S: From<M>>(items: Vec<M>) -> Vec<S> {
    items.into_iter().map(S::from).collect()
}

async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> AppResult<Envelope<MoviePage>> {
    let (page, q) = list::<movie::Entity>(&state, &params, &MOVIE_FIELDS).await?;
    Ok(Envelope::success(MoviePage {
        movies: convert::<_, MovieSummary>(page.items),
        total: page.total,
        page: q.pagination.page,
        per_page: q.pagination.per_page,
    }))
}

async fn list_actors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> AppResult<Envelope<ActorPage>> {
    let (page, q) = list::<actor::Entity>(&state, &params, &ACTOR_FIELDS).await?;
    Ok(Envelope::success(ActorPage {
        actors: convert::<_, PersonSummary>(page.items),
        total: page.total,
        page: q.pagination.page,
        per_page: q.pagination.per_page,
    }))
}

async fn list_directors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> AppResult<Envelope<DirectorPage>> {
    let (page, q) = list::<director::Entity>(&state, &params, &DIRECTOR_FIELDS).await?;
    Ok(Envelope::success(DirectorPage {
        directors: convert::<_, PersonSummary>(page.items),
        total: page.total,
        page: q.pagination.page,
        per_page: q.pagination.per_page,
    }))
}

async fn list_genres(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> AppResult<Envelope<GenrePage>> {
    let (page, q) = list::<genre::Entity>(&state, &params, &GENRE_FIELDS).await?;
    Ok(Envelope::success(GenrePage {
        genres: convert::<_, GenreSummary>(page.items),
        total: page.total,
        page: q.pagination.page,
        per_page: q.pagination.per_page,
    }))
}

async fn get_movie(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> AppResult<Envelope<SingleMovie>> {
    let movie = lookup::find_one::<movie::Entity>(&state.db, &id).await?;
    Ok(Envelope::success(SingleMovie { movie: movie.into() }))
}

async fn get_actor(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> AppResult<Envelope<SingleActor>> {
    let actor = lookup::find_one::<actor::Entity>(&state.db, &id).await?;
    Ok(Envelope::success(SingleActor { actor: actor.into() }))
}

async fn get_director(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Envelope<SingleDirector>> {
    let director = lookup::find_one::<director::Entity>(&state.db, &id).await?;
    Ok(Envelope::success(SingleDirector { director: director.into() }))
}

async fn get_genre(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> AppResult<Envelope<SingleGenre>> {
    let genre = lookup::find_one::<genre::Entity>(&state.db, &id).await?;
    Ok(Envelope::success(SingleGenre { genre: genre.into() }))
}

async fn related<E>(
    State(state): State<Arc<AppState>>,
    Path((id, relation)): Path<(String, String)>,
) -> AppResult<Envelope<RelatedRows>>
where
    E: HasRelations,
    E::Model: Sync,
    <E::PrimaryKey as sea_orm::PrimaryKeyTrait>::ValueType: From<i32>,
{
    let rows = lookup::fetch_relation::<E>(&state.db, &id, &relation).await?;
    tracing::debug!(%id, %relation, count = rows.len(), "relation loaded");
    Ok(Envelope::success(rows))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> AppResult<Envelope<Statistics>> {
    Ok(Envelope::success(stats::collect(&state.db).await?))
}
