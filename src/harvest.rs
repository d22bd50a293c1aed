//! Builds the import files from TMDB lookups.

use std::{collections::BTreeMap, path::Path};

use crate::{
    populate::{
        ActorRecord, DirectorRecord, GenreRecord, Link, LinkRecord, MovieRecord, PersonRecord,
        SlugRecord, write_records,
    },
    slug::{movie_slug, slugify},
    tmdb::{MovieDetails, PersonDetails, TmdbClient},
};

const TOP_BILLED: usize = 5;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MovieQuery {
    pub title: String,
    pub year: Option<i32>,
}

/// `Title` or `Title@Year`. Blank lines and unparsable years yield `None`.
pub fn parse_query(line: &str) -> Option<MovieQuery> {
    let line = line.trim();
    let (title, year) = match line.split_once('@') {
        Some((title, year)) => (title.trim(), Some(year.trim().parse().ok()?)),
        None => (line, None),
    };
    (!title.is_empty()).then(|| MovieQuery { title: title.to_string(), year })
}

/// Everything one harvest run writes, keyed by slug so people are stored once.
#[derive(Debug, Default)]
pub struct Harvest {
    pub movies: Vec<MovieRecord>,
    pub actors: BTreeMap<String, PersonRecord>,
    pub directors: BTreeMap<String, PersonRecord>,
    pub movie_genres: Vec<LinkRecord>,
    pub movie_actors: Vec<LinkRecord>,
    pub movie_directors: Vec<LinkRecord>,
}

impl Harvest {
    pub fn write_to(&self, dir: &Path) -> anyhow::Result<()> {
        write_records(dir, MovieRecord::FILE, &self.movies)?;
        let actors: Vec<ActorRecord> = self.actors.values().cloned().map(ActorRecord).collect();
        write_records(dir, ActorRecord::FILE, &actors)?;
        let directors: Vec<DirectorRecord> = self.directors.values().cloned().map(DirectorRecord).collect();
        write_records(dir, DirectorRecord::FILE, &directors)?;

        for (link, records) in [
            (Link::Genres, &self.movie_genres),
            (Link::Actors, &self.movie_actors),
            (Link::Directors, &self.movie_directors),
        ] {
            let values: Vec<_> = records.iter().map(|r| r.to_value(link)).collect();
            write_records(dir, link.file(), &values)?;
        }
        Ok(())
    }
}

pub async fn harvest(tmdb: &TmdbClient, lines: &[String]) -> anyhow::Result<Harvest> {
    let mut out = Harvest::default();
    for line in lines {
        let Some(query) = parse_query(line) else {
            tracing::warn!(%line, "unparsable query, skipping");
            continue;
        };
        let Some(hit) = tmdb.search_movie(&query.title, query.year).await? else {
            tracing::warn!(title = %query.title, year = ?query.year, "movie not found, skipping");
            continue;
        };
        let details = tmdb.movie_details(hit.id).await?;
        let movie = movie_record(&details);
        let slug = movie.slug();
        tracing::info!(%slug, "harvested movie");

        out.movie_genres.push(LinkRecord {
            movie_slug: slug.clone(),
            slugs: details.genres.iter().map(|g| slugify(&g.name)).collect(),
        });

        let directors = details.credits.crew.iter().filter(|c| c.job == "Director").map(|c| c.name.as_str());
        let director_slugs = collect_people(tmdb, &mut out.directors, directors, "Directing").await?;
        out.movie_directors.push(LinkRecord { movie_slug: slug.clone(), slugs: director_slugs });

        let cast = details.credits.cast.iter().take(TOP_BILLED).map(|c| c.name.as_str());
        let actor_slugs = collect_people(tmdb, &mut out.actors, cast, "Acting").await?;
        out.movie_actors.push(LinkRecord { movie_slug: slug, slugs: actor_slugs });

        out.movies.push(movie);
    }
    Ok(out)
}

/// Looks up each person not seen yet; returns the slugs that resolved.
async fn collect_people<'a>(
    tmdb: &TmdbClient,
    known: &mut BTreeMap<String, PersonRecord>,
    names: impl Iterator<Item = &'a str>,
    department: &str,
) -> anyhow::Result<Vec<String>> {
    let mut slugs = Vec::new();
    for name in names {
        let slug = slugify(name);
        if !known.contains_key(&slug) {
            let Some(person) = tmdb.search_person(name, department).await? else {
                tracing::warn!(%name, department, "person not found, skipping");
                continue;
            };
            let details = tmdb.person_details(person.id).await?;
            known.insert(slug.clone(), person_record(details, name));
        }
        slugs.push(slug);
    }
    Ok(slugs)
}

pub async fn harvest_genres(tmdb: &TmdbClient) -> anyhow::Result<Vec<GenreRecord>> {
    let genres = tmdb.genres().await?;
    Ok(genres
        .into_iter()
        .map(|g| GenreRecord { slug: Some(slugify(&g.name)), name: g.name })
        .collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

pub fn release_year(release_date: Option<&str>) -> Option<i32> {
    release_date?.split('-').next()?.parse().ok()
}

/// Key of the first YouTube trailer.
pub fn trailer_key(details: &MovieDetails) -> Option<String> {
    details
        .videos
        .results
        .iter()
        .find(|v| v.site == "YouTube" && v.kind == "Trailer")
        .map(|v| v.key.clone())
}

/// First non-empty certification among the US releases.
pub fn us_certification(details: &MovieDetails) -> Option<String> {
    details
        .release_dates
        .results
        .iter()
        .find(|c| c.iso_3166_1 == "US")?
        .release_dates
        .iter()
        .find(|r| !r.certification.is_empty())
        .map(|r| r.certification.clone())
}

pub fn movie_record(details: &MovieDetails) -> MovieRecord {
    let year = release_year(details.release_date.as_deref());
    MovieRecord {
        title: details.title.clone(),
        release_year: year,
        duration: details.runtime,
        tagline: non_empty(details.tagline.clone()),
        description: non_empty(details.overview.clone()),
        rating: details.vote_average,
        mpaa_rating: us_certification(details),
        poster_url: non_empty(details.poster_path.clone()),
        page_img_url: non_empty(details.backdrop_path.clone()),
        trailer_url: trailer_key(details),
        slug: Some(movie_slug(&details.title, year)),
    }
}

/// The credited name keys the record, so its slug matches the link files.
pub fn person_record(details: PersonDetails, credited_as: &str) -> PersonRecord {
    PersonRecord {
        slug: Some(slugify(credited_as)),
        name: if details.name.is_empty() { credited_as.to_string() } else { details.name },
        biography: non_empty(details.biography),
        photo_url: non_empty(details.profile_path),
        imdb_id: non_empty(details.imdb_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> MovieDetails {
        serde_json::from_value(serde_json::json!({
            "id": 949,
            "title": "Heat",
            "release_date": "1995-12-15",
            "runtime": 170,
            "tagline": "",
            "overview": "Obsessive master thief Neil McCauley...",
            "vote_average": 7.9,
            "poster_path": "/heat.jpg",
            "backdrop_path": null,
            "genres": [{"id": 28, "name": "Action"}, {"id": 80, "name": "Crime"}],
            "credits": {"cast": [], "crew": []},
            "videos": {"results": [
                {"site": "Vimeo", "type": "Trailer", "key": "v1"},
                {"site": "YouTube", "type": "Teaser", "key": "y0"},
                {"site": "YouTube", "type": "Trailer", "key": "y1"},
                {"site": "YouTube", "type": "Trailer", "key": "y2"}
            ]},
            "release_dates": {"results": [
                {"iso_3166_1": "GB", "release_dates": [{"certification": "15"}]},
                {"iso_3166_1": "US", "release_dates": [{"certification": ""}, {"certification": "R"}]}
            ]}
        }))
        .unwrap()
    }

    #[test]
    fn parses_title_and_optional_year() {
        assert_eq!(parse_query("Heat@1995"), Some(MovieQuery { title: "Heat".into(), year: Some(1995) }));
        assert_eq!(parse_query("  Alien  "), Some(MovieQuery { title: "Alien".into(), year: None }));
        assert_eq!(parse_query(""), None);
        assert_eq!(parse_query("Heat@soon"), None);
    }

    #[test]
    fn extracts_movie_fields() {
        let movie = movie_record(&details());
        assert_eq!(movie.slug.as_deref(), Some("heat-1995"));
        assert_eq!(movie.release_year, Some(1995));
        assert_eq!(movie.trailer_url.as_deref(), Some("y1"));
        assert_eq!(movie.mpaa_rating.as_deref(), Some("R"));
        assert_eq!(movie.tagline, None);
        assert_eq!(movie.page_img_url, None);
    }

    #[test]
    fn release_year_needs_a_date() {
        assert_eq!(release_year(None), None);
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(Some("2001-05-01")), Some(2001));
    }

    #[test]
    fn person_slug_follows_credit_name() {
        let details = PersonDetails { name: "Alfredo James Pacino".into(), ..Default::default() };
        let record = person_record(details, "Al Pacino");
        assert_eq!(record.slug.as_deref(), Some("al-pacino"));
        assert_eq!(record.name, "Alfredo James Pacino");
    }
}
