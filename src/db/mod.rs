use async_trait::async_trait;
use log::info;
use sqlx::{migrate::MigrateDatabase, sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow}, Row, Sqlite};

use crate::config::Config;
use crate::error::Result;
use crate::models::{Candidate, CandidateTotal, Region, Station, StationVote};

#[cfg(test)]
pub(crate) mod fake;
#[cfg(test)]
pub(crate) mod fixtures;

/// Read-only query contract the result aggregator is built on.
///
/// Region ids with no matching rows yield empty results rather than errors;
/// any failure to execute a query surfaces as `Error::StoreUnavailable`.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// All regions, ordered by id.
    async fn find_all_regions(&self) -> Result<Vec<Region>>;

    async fn find_region_by_id(&self, region_id: i64) -> Result<Option<Region>>;

    /// Candidates of a region, ordered by ballot number.
    async fn find_candidates_by_region(&self, region_id: i64) -> Result<Vec<Candidate>>;

    /// Stations of a region, ordered by name.
    async fn find_stations_by_region(&self, region_id: i64) -> Result<Vec<Station>>;

    /// Every candidate of the region with its votes summed across stations.
    /// Candidates without vote rows are reported with a total of 0.
    async fn sum_votes_by_candidate_in_region(&self, region_id: i64) -> Result<Vec<CandidateTotal>>;

    async fn find_votes_by_station(&self, station_id: i64) -> Result<Vec<StationVote>>;
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self> {
        let db_url = &config.database_url;

        // Create database if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(db_url)
            .await?;
        info!("Connected to {}", db_url);

        Self::with_pool(pool).await
    }

    // Wrap an existing pool, bootstrapping the schema on it
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS regions (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                total_stations INTEGER,
                total_representatives INTEGER
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS candidates (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                number INTEGER NOT NULL,
                region_id INTEGER NOT NULL,
                FOREIGN KEY (region_id) REFERENCES regions(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stations (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                region_id INTEGER NOT NULL,
                FOREIGN KEY (region_id) REFERENCES regions(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                id INTEGER PRIMARY KEY,
                candidate_id INTEGER NOT NULL,
                station_id INTEGER NOT NULL,
                vote_count INTEGER NOT NULL DEFAULT 0 CHECK (vote_count >= 0),
                UNIQUE (candidate_id, station_id),
                FOREIGN KEY (candidate_id) REFERENCES candidates(id) ON DELETE CASCADE,
                FOREIGN KEY (station_id) REFERENCES stations(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        info!("Schema ready");
        Ok(())
    }
}

#[async_trait]
impl VoteStore for Database {
    async fn find_all_regions(&self) -> Result<Vec<Region>> {
        let regions = sqlx::query(
            r#"
            SELECT id, name, total_stations, total_representatives
            FROM regions
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(region_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(regions)
    }

    async fn find_region_by_id(&self, region_id: i64) -> Result<Option<Region>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, total_stations, total_representatives
            FROM regions
            WHERE id = ?
            "#,
        )
        .bind(region_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(region_from_row).transpose()?)
    }

    async fn find_candidates_by_region(&self, region_id: i64) -> Result<Vec<Candidate>> {
        let candidates = sqlx::query(
            r#"
            SELECT id, name, number, region_id
            FROM candidates
            WHERE region_id = ?
            ORDER BY number, id
            "#,
        )
        .bind(region_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(candidate_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(candidates)
    }

    async fn find_stations_by_region(&self, region_id: i64) -> Result<Vec<Station>> {
        let stations = sqlx::query(
            r#"
            SELECT id, name, region_id
            FROM stations
            WHERE region_id = ?
            ORDER BY name, id
            "#,
        )
        .bind(region_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(station_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(stations)
    }

    async fn sum_votes_by_candidate_in_region(&self, region_id: i64) -> Result<Vec<CandidateTotal>> {
        // Left join so candidates without any vote rows still come back with 0
        let totals = sqlx::query(
            r#"
            SELECT c.id AS candidate_id,
                   c.name AS candidate_name,
                   c.number AS candidate_number,
                   COALESCE(SUM(v.vote_count), 0) AS total_votes
            FROM candidates c
            LEFT JOIN votes v ON v.candidate_id = c.id
            WHERE c.region_id = ?
            GROUP BY c.id, c.name, c.number
            ORDER BY total_votes DESC, c.number ASC, c.id ASC
            "#,
        )
        .bind(region_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(candidate_total_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(totals)
    }

    async fn find_votes_by_station(&self, station_id: i64) -> Result<Vec<StationVote>> {
        let votes = sqlx::query(
            r#"
            SELECT candidate_id, vote_count
            FROM votes
            WHERE station_id = ?
            "#,
        )
        .bind(station_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(station_vote_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(votes)
    }
}

fn region_from_row(row: &SqliteRow) -> std::result::Result<Region, sqlx::Error> {
    Ok(Region {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        total_stations: row.try_get("total_stations")?,
        total_representatives: row.try_get("total_representatives")?,
    })
}

fn candidate_from_row(row: &SqliteRow) -> std::result::Result<Candidate, sqlx::Error> {
    Ok(Candidate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        number: row.try_get("number")?,
        region_id: row.try_get("region_id")?,
    })
}

fn station_from_row(row: &SqliteRow) -> std::result::Result<Station, sqlx::Error> {
    Ok(Station {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        region_id: row.try_get("region_id")?,
    })
}

fn candidate_total_from_row(row: &SqliteRow) -> std::result::Result<CandidateTotal, sqlx::Error> {
    Ok(CandidateTotal {
        candidate_id: row.try_get("candidate_id")?,
        candidate_name: row.try_get("candidate_name")?,
        candidate_number: row.try_get("candidate_number")?,
        total_votes: row.try_get("total_votes")?,
    })
}

fn station_vote_from_row(row: &SqliteRow) -> std::result::Result<StationVote, sqlx::Error> {
    Ok(StationVote {
        candidate_id: row.try_get("candidate_id")?,
        vote_count: row.try_get("vote_count")?,
    })
}
