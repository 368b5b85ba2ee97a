//! Vote summarization per region, per candidate and per polling station.

pub mod standings;

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::db::VoteStore;
use crate::error::Result;
use crate::models::{representative_count, Candidate, CandidateTotal, Region, Station};
use standings::{percentage_of, rank_results, Standing};

// One cell of the station breakdown: a region candidate, its count at the
// station and its share of the station total
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateVotes {
    pub candidate: Candidate,
    pub vote_count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationResult {
    pub station: Station,
    pub total_votes: i64,
    pub votes: Vec<CandidateVotes>,
}

// Ranked results for a region, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStandings {
    pub region: Option<Region>,
    pub representative_count: usize,
    pub total_votes: i64,
    pub standings: Vec<Standing>,
}

impl RegionStandings {
    // Answer for a region id the store does not know
    pub fn empty() -> Self {
        Self {
            region: None,
            representative_count: representative_count(None),
            total_votes: 0,
            standings: Vec::new(),
        }
    }
}

pub struct ResultAggregator {
    store: Arc<dyn VoteStore>,
}

impl ResultAggregator {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn VoteStore> {
        &self.store
    }

    /// Candidate totals for a region, highest first.
    ///
    /// Ties on votes are ordered by candidate number, then candidate id, so
    /// the order does not depend on how the store breaks ties.
    pub async fn get_results_by_region(&self, region_id: i64) -> Result<Vec<CandidateTotal>> {
        let mut results = self.store.sum_votes_by_candidate_in_region(region_id).await?;

        results.sort_by(|a, b| {
            b.total_votes
                .cmp(&a.total_votes)
                .then(a.candidate_number.cmp(&b.candidate_number))
                .then(a.candidate_id.cmp(&b.candidate_id))
        });

        debug!("Region {} has {} candidate totals", region_id, results.len());
        Ok(results)
    }

    /// Station-by-station breakdown for a region, stations ordered by name.
    ///
    /// Every station lists every candidate of the region, with 0 where no vote
    /// row exists for the pair. One store round trip is made per station.
    pub async fn get_station_results_by_region(&self, region_id: i64) -> Result<Vec<StationResult>> {
        let stations = self.store.find_stations_by_region(region_id).await?;
        let candidates = self.store.find_candidates_by_region(region_id).await?;

        let mut station_results = Vec::with_capacity(stations.len());

        for station in stations {
            let station_votes = self.store.find_votes_by_station(station.id).await?;

            // Map candidate id -> count recorded at this station
            let counts: HashMap<i64, i64> = station_votes
                .iter()
                .map(|vote| (vote.candidate_id, vote.vote_count))
                .collect();

            let total_votes: i64 = counts.values().sum();

            let votes = candidates
                .iter()
                .map(|candidate| {
                    let vote_count = counts.get(&candidate.id).copied().unwrap_or(0);
                    CandidateVotes {
                        candidate: candidate.clone(),
                        vote_count,
                        percentage: percentage_of(vote_count, total_votes),
                    }
                })
                .collect();

            station_results.push(StationResult {
                station,
                total_votes,
                votes,
            });
        }

        debug!("Region {} has {} stations", region_id, station_results.len());
        Ok(station_results)
    }

    // Region row plus ranked totals, electing the region's representative count
    pub async fn get_region_standings(&self, region_id: i64) -> Result<RegionStandings> {
        let region = self.store.find_region_by_id(region_id).await?;
        let results = self.get_results_by_region(region_id).await?;

        let representative_count = representative_count(region.as_ref());
        let ranked = rank_results(&results, representative_count);

        Ok(RegionStandings {
            region,
            representative_count,
            total_votes: ranked.total_votes,
            standings: ranked.entries,
        })
    }
}
