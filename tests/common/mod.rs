#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use riksflix::{
    AppState,
    config::Config,
    db,
    populate::{
        ActorRecord, DirectorRecord, GenreRecord, Link, LinkRecord, MovieRecord, PersonRecord,
        import_entities, import_links,
    },
    routes,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;

pub async fn setup_test_db() -> DatabaseConnection {
    db::connect_and_migrate("sqlite::memory:").await.expect("Failed to setup test database")
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let state = AppState { config: Arc::new(Config::default()), db };
    routes::router(Arc::new(state))
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

pub fn ids(items: &Value) -> Vec<i64> {
    items.as_array().unwrap().iter().map(|m| m["id"].as_i64().unwrap()).collect()
}

pub fn movie(
    title: &str,
    year: Option<i32>,
    duration: Option<i32>,
    rating: Option<f64>,
    mpaa: Option<&str>,
) -> MovieRecord {
    MovieRecord {
        title: title.to_string(),
        release_year: year,
        duration,
        rating,
        mpaa_rating: mpaa.map(String::from),
        ..Default::default()
    }
}

pub fn person(name: &str) -> PersonRecord {
    PersonRecord { name: name.to_string(), ..Default::default() }
}

pub fn genre(name: &str) -> GenreRecord {
    GenreRecord { name: name.to_string(), slug: None }
}

pub fn link(movie_slug: &str, slugs: &[&str]) -> LinkRecord {
    LinkRecord { movie_slug: movie_slug.to_string(), slugs: slugs.iter().map(|s| s.to_string()).collect() }
}

/// Ids follow insertion order.
///
/// | id | title            | year | min | rating | mpaa  |
/// |----|------------------|------|-----|--------|-------|
/// | 1  | Heat             | 1995 | 170 | 8.3    | R     |
/// | 2  | The Matrix       | 1999 | 136 | 8.7    | R     |
/// | 3  | Toy Story        | 1995 | 81  | 8.3    | G     |
/// | 4  | Speed            | 1994 | 116 | 7.2    | R     |
/// | 5  | Jurassic Park    | 1993 | 127 | 8.2    | PG-13 |
/// | 6  | Forrest Gump     | 1994 | 142 | 8.8    | PG-13 |
/// | 7  | Titanic          | 1997 | 194 | 8.2    | PG-13 |
/// | 8  | Untitled Project | -    | -   | -      | -     |
/// | 9  | Men in Black     | 1997 | 98  | 7.3    | PG-13 |
/// | 10 | Apollo 13        | 1995 | 140 | 7.7    | PG    |
pub fn catalog() -> Vec<MovieRecord> {
    vec![
        movie("Heat", Some(1995), Some(170), Some(8.3), Some("R")),
        movie("The Matrix", Some(1999), Some(136), Some(8.7), Some("R")),
        movie("Toy Story", Some(1995), Some(81), Some(8.3), Some("G")),
        movie("Speed", Some(1994), Some(116), Some(7.2), Some("R")),
        movie("Jurassic Park", Some(1993), Some(127), Some(8.2), Some("PG-13")),
        movie("Forrest Gump", Some(1994), Some(142), Some(8.8), Some("PG-13")),
        movie("Titanic", Some(1997), Some(194), Some(8.2), Some("PG-13")),
        movie("Untitled Project", None, None, None, None),
        movie("Men in Black", Some(1997), Some(98), Some(7.3), Some("PG-13")),
        movie("Apollo 13", Some(1995), Some(140), Some(7.7), Some("PG")),
    ]
}

pub fn genres() -> Vec<GenreRecord> {
    ["Action", "Drama", "Comedy", "Horror"].into_iter().map(genre).collect()
}

pub fn actors() -> Vec<ActorRecord> {
    [
        "Al Pacino",
        "Robert De Niro",
        "Keanu Reeves",
        "Tom Hanks",
        "Leonardo DiCaprio",
        "Will Smith",
        "Sandra Bullock",
    ]
    .into_iter()
    .map(|n| ActorRecord(person(n)))
    .collect()
}

pub fn directors() -> Vec<DirectorRecord> {
    ["Michael Mann", "Lana Wachowski", "Steven Spielberg", "Robert Zemeckis", "James Cameron", "Jan de Bont"]
        .into_iter()
        .map(|n| DirectorRecord(person(n)))
        .collect()
}

pub fn movie_genres() -> Vec<LinkRecord> {
    vec![
        link("heat-1995", &["action", "drama"]),
        link("the-matrix-1999", &["action"]),
        link("toy-story-1995", &["comedy"]),
        link("speed-1994", &["action"]),
        link("jurassic-park-1993", &["action"]),
        link("forrest-gump-1994", &["drama", "comedy"]),
        link("titanic-1997", &["drama", "action"]),
        link("men-in-black-1997", &["action", "comedy"]),
        link("apollo-13-1995", &["drama"]),
    ]
}

pub fn movie_actors() -> Vec<LinkRecord> {
    vec![
        link("heat-1995", &["al-pacino", "robert-de-niro"]),
        link("the-matrix-1999", &["keanu-reeves"]),
        link("speed-1994", &["keanu-reeves", "sandra-bullock"]),
        link("toy-story-1995", &["tom-hanks"]),
        link("forrest-gump-1994", &["tom-hanks"]),
        link("apollo-13-1995", &["tom-hanks"]),
        link("titanic-1997", &["leonardo-dicaprio"]),
        link("men-in-black-1997", &["will-smith"]),
    ]
}

pub fn movie_directors() -> Vec<LinkRecord> {
    vec![
        link("heat-1995", &["michael-mann"]),
        link("the-matrix-1999", &["lana-wachowski"]),
        link("jurassic-park-1993", &["steven-spielberg"]),
        link("men-in-black-1997", &["steven-spielberg"]),
        link("untitled-project", &["steven-spielberg"]),
        link("forrest-gump-1994", &["robert-zemeckis"]),
        link("toy-story-1995", &["robert-zemeckis"]),
        link("apollo-13-1995", &["robert-zemeckis"]),
        link("titanic-1997", &["james-cameron"]),
        link("speed-1994", &["jan-de-bont"]),
    ]
}

pub async fn seed(db: &DatabaseConnection) {
    import_entities(db, genres()).await.unwrap();
    import_entities(db, catalog()).await.unwrap();
    import_entities(db, actors()).await.unwrap();
    import_entities(db, directors()).await.unwrap();
    import_links(db, Link::Genres, movie_genres()).await.unwrap();
    import_links(db, Link::Actors, movie_actors()).await.unwrap();
    import_links(db, Link::Directors, movie_directors()).await.unwrap();
}

pub async fn seeded_app() -> Router {
    let db = setup_test_db().await;
    seed(&db).await;
    setup_test_app(db)
}
