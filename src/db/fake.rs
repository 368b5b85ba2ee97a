//! In-process `VoteStore` for tests that need to count queries or inject failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::VoteStore;
use crate::error::{Error, Result};
use crate::models::{Candidate, CandidateTotal, Region, Station, StationVote, Vote};

#[derive(Default)]
pub(crate) struct FakeStore {
    pub regions: Vec<Region>,
    pub candidates: Vec<Candidate>,
    pub stations: Vec<Station>,
    pub votes: Vec<Vote>,
    queries: AtomicUsize,
    failing: AtomicBool,
}

impl FakeStore {
    pub fn with_region(mut self, id: i64, name: &str, total_representatives: Option<i64>) -> Self {
        self.regions.push(Region {
            id,
            name: name.to_string(),
            total_stations: None,
            total_representatives,
        });
        self
    }

    pub fn with_candidate(mut self, id: i64, name: &str, number: i64, region_id: i64) -> Self {
        self.candidates.push(Candidate {
            id,
            name: name.to_string(),
            number,
            region_id,
        });
        self
    }

    pub fn with_station(mut self, id: i64, name: &str, region_id: i64) -> Self {
        self.stations.push(Station {
            id,
            name: name.to_string(),
            region_id,
        });
        self
    }

    pub fn with_votes(mut self, candidate_id: i64, station_id: i64, vote_count: i64) -> Self {
        let id = self.votes.len() as i64 + 1;
        self.votes.push(Vote {
            id,
            candidate_id,
            station_id,
            vote_count,
        });
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn begin_query(&self) -> Result<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl VoteStore for FakeStore {
    async fn find_all_regions(&self) -> Result<Vec<Region>> {
        self.begin_query()?;
        let mut regions = self.regions.clone();
        regions.sort_by_key(|r| r.id);
        Ok(regions)
    }

    async fn find_region_by_id(&self, region_id: i64) -> Result<Option<Region>> {
        self.begin_query()?;
        Ok(self.regions.iter().find(|r| r.id == region_id).cloned())
    }

    async fn find_candidates_by_region(&self, region_id: i64) -> Result<Vec<Candidate>> {
        self.begin_query()?;
        let mut candidates: Vec<Candidate> = self
            .candidates
            .iter()
            .filter(|c| c.region_id == region_id)
            .cloned()
            .collect();
        candidates.sort_by_key(|c| (c.number, c.id));
        Ok(candidates)
    }

    async fn find_stations_by_region(&self, region_id: i64) -> Result<Vec<Station>> {
        self.begin_query()?;
        let mut stations: Vec<Station> = self
            .stations
            .iter()
            .filter(|s| s.region_id == region_id)
            .cloned()
            .collect();
        stations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(stations)
    }

    // Insertion order, unsorted
    async fn sum_votes_by_candidate_in_region(&self, region_id: i64) -> Result<Vec<CandidateTotal>> {
        self.begin_query()?;
        Ok(self
            .candidates
            .iter()
            .filter(|c| c.region_id == region_id)
            .map(|c| CandidateTotal {
                candidate_id: c.id,
                candidate_name: c.name.clone(),
                candidate_number: c.number,
                total_votes: self
                    .votes
                    .iter()
                    .filter(|v| v.candidate_id == c.id)
                    .map(|v| v.vote_count)
                    .sum(),
            })
            .collect())
    }

    async fn find_votes_by_station(&self, station_id: i64) -> Result<Vec<StationVote>> {
        self.begin_query()?;
        Ok(self
            .votes
            .iter()
            .filter(|v| v.station_id == station_id)
            .map(|v| StationVote {
                candidate_id: v.candidate_id,
                vote_count: v.vote_count,
            })
            .collect())
    }
}
