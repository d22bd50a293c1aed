use axum::http::StatusCode;
use sea_orm::ConnectionTrait;
use serde_json::json;

mod common;
use common::{get, ids, seed, seeded_app, setup_test_app, setup_test_db};

#[tokio::test]
async fn movie_statistics() {
    let app = seeded_app().await;
    let (status, body) = get(&app, "/api/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let movies = &body["data"]["movie_stats"];

    assert_eq!(movies["total"], 10);
    assert_eq!(
        movies["movies_by_year"],
        json!({"1993": 1, "1994": 2, "1995": 3, "1997": 2, "1999": 1, "Unknown": 1})
    );
    assert_eq!(movies["oldest_movie"]["id"], 5);
    assert_eq!(movies["oldest_movie"]["year"], 1993);
    assert_eq!(movies["newest_movie"]["slug"], "the-matrix-1999");
    assert_eq!(movies["longest_movie"]["title"], "Titanic");
    assert_eq!(movies["shortest_movie"]["title"], "Toy Story");
    assert_eq!(movies["average_duration"].as_f64(), Some(133.78));
    assert_eq!(movies["median_duration"].as_f64(), Some(136.0));
    assert_eq!(movies["mpaa_distribution"], json!({"G": 1, "PG": 1, "PG-13": 4, "R": 3, "Unknown": 1}));
    assert_eq!(
        movies["length_brackets"],
        json!({"< 90 min": 1, "90-120 min": 2, "120-150 min": 4, "> 150 min": 2, "Unknown": 1})
    );
    assert_eq!(
        movies["average_rating_by_year"],
        json!({"1993": 8.2, "1994": 8.0, "1995": 8.1, "1997": 7.75, "1999": 8.7})
    );
}

#[tokio::test]
async fn top_rated_skips_unrated_and_breaks_ties_by_id() {
    let app = seeded_app().await;
    let (_, body) = get(&app, "/api/v1/stats").await;
    let top = &body["data"]["movie_stats"]["top_rated_movies"];
    assert_eq!(ids(top), [6, 2, 1, 3, 5, 7, 10, 9, 4]);
    assert_eq!(top[0]["rating"].as_f64(), Some(8.8));
}

#[tokio::test]
async fn actor_statistics() {
    let app = seeded_app().await;
    let (_, body) = get(&app, "/api/v1/stats").await;
    let actors = &body["data"]["actor_stats"];

    assert_eq!(actors["total"], 7);
    assert_eq!(ids(&actors["most_frequent_actors"]), [4, 3, 1, 2, 5, 6, 7]);
    assert_eq!(actors["most_frequent_actors"][0]["movie_count"], 3);
    assert_eq!(
        actors["longest_career_actor"],
        json!({
            "name": "Keanu Reeves",
            "career_span": 5,
            "from": 1994,
            "to": 1999,
            "id": 3,
            "slug": "keanu-reeves",
            "photo_url": null
        })
    );
}

#[tokio::test]
async fn director_statistics() {
    let app = seeded_app().await;
    let (_, body) = get(&app, "/api/v1/stats").await;
    let directors = &body["data"]["director_stats"];

    assert_eq!(directors["total"], 6);
    assert_eq!(ids(&directors["most_prolific"]), [3, 4, 1, 2, 5, 6]);
    // Spielberg has three movies but only two of them are rated.
    assert_eq!(ids(&directors["highest_avg_rated"]), [4]);
    assert_eq!(directors["highest_avg_rated"][0]["avg_rating"].as_f64(), Some(8.27));
    assert_eq!(directors["highest_avg_rated"][0]["movie_count"], 3);
}

#[tokio::test]
async fn genre_statistics() {
    let app = seeded_app().await;
    let (_, body) = get(&app, "/api/v1/stats").await;
    let genres = &body["data"]["genre_stats"];

    assert_eq!(genres["total"], 3, "unused genres are not counted");
    assert_eq!(
        genres["most_common"],
        json!([
            {"name": "Action", "count": 6},
            {"name": "Drama", "count": 4},
            {"name": "Comedy", "count": 3}
        ])
    );
    assert_eq!(
        genres["popularity_over_time"]["Action"],
        json!({"1993": 1, "1994": 1, "1995": 1, "1997": 2, "1999": 1})
    );
    assert_eq!(genres["popularity_over_time"]["Drama"], json!({"1994": 1, "1995": 2, "1997": 1}));
    assert_eq!(genres["average_rating"], json!({"Action": 7.98, "Comedy": 8.13, "Drama": 8.25}));
}

#[tokio::test]
async fn empty_catalog_yields_zeroes() {
    let app = setup_test_app(setup_test_db().await);
    let (status, body) = get(&app, "/api/v1/stats").await;
    assert_eq!(status, StatusCode::OK);

    let movies = &body["data"]["movie_stats"];
    assert_eq!(movies["total"], 0);
    assert_eq!(movies["median_duration"].as_f64(), Some(0.0));
    assert_eq!(movies["average_duration"].as_f64(), Some(0.0));
    assert_eq!(movies["oldest_movie"], json!(null));
    assert_eq!(movies["top_rated_movies"], json!([]));
    assert_eq!(body["data"]["actor_stats"]["longest_career_actor"], json!(null));
    assert_eq!(body["data"]["genre_stats"]["total"], 0);
}

#[tokio::test]
async fn failing_section_is_omitted() {
    let db = setup_test_db().await;
    seed(&db).await;
    let app = setup_test_app(db.clone());
    db.execute_unprepared("DROP TABLE movie_directors").await.unwrap();

    let (status, body) = get(&app, "/api/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    let mut sections: Vec<_> = body["data"].as_object().unwrap().keys().cloned().collect();
    sections.sort();
    assert_eq!(sections, ["actor_stats", "genre_stats", "movie_stats"]);
    assert_eq!(body["data"]["movie_stats"]["total"], 10);
}

#[tokio::test]
async fn every_section_failing_is_a_server_error() {
    let db = setup_test_db().await;
    seed(&db).await;
    let app = setup_test_app(db.clone());
    for table in ["movie_directors", "movie_genres", "movie_actors", "movies"] {
        db.execute_unprepared(&format!("DROP TABLE {table}")).await.unwrap();
    }

    let (status, body) = get(&app, "/api/v1/stats").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": "error", "code": 500, "message": "Failed to fetch statistics"}));
}
