//! Seeding helpers for tests that run against an in-memory SQLite store.

use sqlx::sqlite::SqlitePoolOptions;

use super::Database;

// A single connection that never idles out, so the in-memory database lives
// as long as the pool does
pub(crate) async fn memory_database() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool");
    Database::with_pool(pool).await.expect("schema bootstrap")
}

pub(crate) async fn insert_region(db: &Database, id: i64, name: &str, total_representatives: Option<i64>) {
    sqlx::query("INSERT INTO regions (id, name, total_stations, total_representatives) VALUES (?, ?, NULL, ?)")
        .bind(id)
        .bind(name)
        .bind(total_representatives)
        .execute(db.pool())
        .await
        .expect("insert region");
}

pub(crate) async fn insert_candidate(db: &Database, id: i64, name: &str, number: i64, region_id: i64) {
    sqlx::query("INSERT INTO candidates (id, name, number, region_id) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(number)
        .bind(region_id)
        .execute(db.pool())
        .await
        .expect("insert candidate");
}

pub(crate) async fn insert_station(db: &Database, id: i64, name: &str, region_id: i64) {
    sqlx::query("INSERT INTO stations (id, name, region_id) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(region_id)
        .execute(db.pool())
        .await
        .expect("insert station");
}

// Upsert the count for a (candidate, station) pair
pub(crate) async fn record_votes(db: &Database, candidate_id: i64, station_id: i64, vote_count: i64) {
    sqlx::query(
        r#"
        INSERT INTO votes (candidate_id, station_id, vote_count)
        VALUES (?, ?, ?)
        ON CONFLICT(candidate_id, station_id)
        DO UPDATE SET vote_count = excluded.vote_count
        "#,
    )
    .bind(candidate_id)
    .bind(station_id)
    .bind(vote_count)
    .execute(db.pool())
    .await
    .expect("record votes");
}
