use serde::Serialize;

use crate::entities::{actor, director, genre, movie};

/// Row shape used by `/movies` listings and relation lookups.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    pub release_year: Option<i32>,
    pub duration: Option<i32>,
    pub rating: Option<f64>,
    pub mpaa_rating: Option<String>,
    pub poster_url: Option<String>,
    pub slug: String,
}

impl From<movie::Model> for MovieSummary {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            release_year: m.release_year,
            duration: m.duration,
            rating: m.rating,
            mpaa_rating: m.mpaa_rating,
            poster_url: m.poster_url,
            slug: m.slug,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieDetail {
    pub id: i32,
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
    pub slug: String,
}

impl From<movie::Model> for MovieDetail {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            release_year: m.release_year,
            duration: m.duration,
            tagline: m.tagline,
            description: m.description,
            rating: m.rating,
            mpaa_rating: m.mpaa_rating,
            poster_url: m.poster_url,
            page_img_url: m.page_img_url,
            trailer_url: m.trailer_url,
            slug: m.slug,
        }
    }
}

/// Actors and directors share the same public shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersonSummary {
    pub id: i32,
    pub name: String,
    pub photo_url: Option<String>,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersonDetail {
    pub id: i32,
    pub name: String,
    pub biography: Option<String>,
    pub photo_url: Option<String>,
    pub imdb_id: Option<String>,
    pub slug: String,
}

macro_rules! person_conversions {
    ($($entity:ident),+) => {$(
        impl From<$entity::Model> for PersonSummary {
            fn from(p: $entity::Model) -> Self {
                Self { id: p.id, name: p.name, photo_url: p.photo_url, slug: p.slug }
            }
        }

        impl From<$entity::Model> for PersonDetail {
            fn from(p: $entity::Model) -> Self {
                Self {
                    id: p.id,
                    name: p.name,
                    biography: p.biography,
                    photo_url: p.photo_url,
                    imdb_id: p.imdb_id,
                    slug: p.slug,
                }
            }
        }
    )+};
}

person_conversions!(actor, director);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenreSummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl From<genre::Model> for GenreSummary {
    fn from(g: genre::Model) -> Self {
        Self { id: g.id, name: g.name, slug: g.slug }
    }
}

/// `{<items>: [...], total, page, per_page}` for each collection endpoint.
#[derive(Debug, Serialize)]
pub struct MoviePage {
    pub movies: Vec<MovieSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize)]
pub struct ActorPage {
    pub actors: Vec<PersonSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize)]
pub struct DirectorPage {
    pub directors: Vec<PersonSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize)]
pub struct GenrePage {
    pub genres: Vec<GenreSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize)]
pub struct SingleMovie {
    pub movie: MovieDetail,
}

#[derive(Debug, Serialize)]
pub struct SingleActor {
    pub actor: PersonDetail,
}

#[derive(Debug, Serialize)]
pub struct SingleDirector {
    pub director: PersonDetail,
}

#[derive(Debug, Serialize)]
pub struct SingleGenre {
    pub genre: GenreSummary,
}
