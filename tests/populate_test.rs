use std::path::PathBuf;

use riksflix::{
    entities::{movie, movie_actor},
    populate::{self, GenreRecord, ImportReport, Link, MovieRecord, SlugRecord, import_entities},
};
use sea_orm::{EntityTrait, PaginatorTrait};

mod common;
use common::{catalog, genres, setup_test_db};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("riksflix-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn reimport_adds_nothing() {
    let db = setup_test_db().await;

    let first = import_entities(&db, catalog()).await.unwrap();
    assert_eq!(first, ImportReport { inserted: 10, skipped: 0 });

    let second = import_entities(&db, catalog()).await.unwrap();
    assert_eq!(second, ImportReport { inserted: 0, skipped: 10 });
    assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 10);
}

#[tokio::test]
async fn duplicate_slugs_in_one_file_insert_once() {
    let db = setup_test_db().await;
    let mut records = genres();
    records.push(GenreRecord { name: "Action".into(), slug: None });

    let report = import_entities(&db, records).await.unwrap();
    assert_eq!(report, ImportReport { inserted: 4, skipped: 1 });
}

#[tokio::test]
async fn populate_reads_files_and_is_idempotent() {
    let db = setup_test_db().await;
    let dir = scratch_dir("populate");

    populate::write_records(&dir, MovieRecord::FILE, &catalog()[..2]).unwrap();
    // Newline-delimited actors, one per line.
    std::fs::write(dir.join("actors.json"), "{\"name\": \"Al Pacino\"}\n{\"name\": \"Keanu Reeves\"}\n").unwrap();
    std::fs::write(
        dir.join(Link::Actors.file()),
        r#"[
            {"movie_slug": "heat-1995", "actor_slugs": ["al-pacino", "nobody"]},
            {"movie_slug": "the-matrix-1999", "actor_slug": "keanu-reeves"},
            {"movie_slug": "missing-movie", "actor_slugs": ["al-pacino"]}
        ]"#,
    )
    .unwrap();

    let reports = populate::populate(&db, &dir).await.unwrap();
    let files: Vec<_> = reports.iter().map(|r| r.file).collect();
    assert_eq!(files, ["movies.json", "actors.json", "movie_actors.json"]);
    assert_eq!(reports[2].report, ImportReport { inserted: 2, skipped: 2 });

    let again = populate::populate(&db, &dir).await.unwrap();
    assert!(again.iter().all(|r| r.report.inserted == 0), "{again:?}");
    assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 2);
    assert_eq!(movie_actor::Entity::find().count(&db).await.unwrap(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}
