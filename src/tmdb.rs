use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, de::DeserializeOwned};

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String, rps: u32) -> anyhow::Result<Self> {
        anyhow::ensure!(!access_token.trim().is_empty(), "TMDB_ACCESS_TOKEN is not set");

        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Ok(Self { client, access_token, base_url, limiter })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<T> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        tracing::debug!(%url, "tmdb request");
        let body = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("language", "en-US")])
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }

    /// Prefers a case-insensitive exact title match, else the first hit.
    pub async fn search_movie(&self, title: &str, year: Option<i32>) -> anyhow::Result<Option<SearchMovie>> {
        let mut query = vec![("query", title.to_string())];
        if let Some(year) = year {
            query.push(("year", year.to_string()));
        }
        let resp: Paged<SearchMovie> = self.get("search/movie", &query).await?;
        let wanted = title.to_lowercase();
        Ok(pick_exact(resp.results, |m| m.title.to_lowercase() == wanted))
    }

    pub async fn movie_details(&self, id: i64) -> anyhow::Result<MovieDetails> {
        let query = [("append_to_response", "credits,images,videos,release_dates".to_string())];
        self.get(&format!("movie/{id}"), &query).await
    }

    /// Prefers an exact name match known for `department`, else the first hit.
    pub async fn search_person(&self, name: &str, department: &str) -> anyhow::Result<Option<SearchPerson>> {
        let query = [
            ("query", name.to_string()),
            ("include_adult", "true".to_string()),
            ("page", "1".to_string()),
        ];
        let resp: Paged<SearchPerson> = self.get("search/person", &query).await?;
        let wanted = name.to_lowercase();
        Ok(pick_exact(resp.results, |p| {
            p.name.to_lowercase() == wanted && p.known_for_department.as_deref() == Some(department)
        }))
    }

    pub async fn person_details(&self, id: i64) -> anyhow::Result<PersonDetails> {
        self.get(&format!("person/{id}"), &[]).await
    }

    pub async fn genres(&self) -> anyhow::Result<Vec<TmdbGenre>> {
        let resp: GenreList = self.get("genre/movie/list", &[]).await?;
        Ok(resp.genres)
    }
}

fn pick_exact<T>(results: Vec<T>, exact: impl Fn(&T) -> bool) -> Option<T> {
    let index = results.iter().position(exact).unwrap_or(0);
    results.into_iter().nth(index)
}

#[derive(Debug, Deserialize)]
struct Paged<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SearchMovie {
    pub id: i64,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SearchPerson {
    pub id: i64,
    pub name: String,
    pub known_for_department: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub genres: Vec<TmdbGenre>,
    pub credits: Credits,
    pub videos: Results<Video>,
    pub release_dates: Results<CountryReleases>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Results<T> {
    pub results: Vec<T>,
}

impl<T> Default for Results<T> {
    fn default() -> Self {
        Self { results: Vec::new() }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credits {
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CastMember {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Video {
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CountryReleases {
    pub iso_3166_1: String,
    pub release_dates: Vec<ReleaseEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReleaseEntry {
    #[serde(default)]
    pub certification: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PersonDetails {
    pub name: String,
    pub biography: Option<String>,
    pub profile_path: Option<String>,
    pub imdb_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Vec<TmdbGenre>,
}
