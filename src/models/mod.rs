use serde::{Deserialize, Serialize};

// Seat count used when a region has no total_representatives configured
pub const DEFAULT_REPRESENTATIVES: i64 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub total_stations: Option<i64>,
    pub total_representatives: Option<i64>,
}

/// Representative slots for an optional region, falling back to the default
/// when the region is unknown or has no count configured.
pub fn representative_count(region: Option<&Region>) -> usize {
    let count = region
        .and_then(|region| region.total_representatives)
        .unwrap_or(DEFAULT_REPRESENTATIVES);
    usize::try_from(count).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub number: i64,
    pub region_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub region_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: i64,
    pub candidate_id: i64,
    pub station_id: i64,
    pub vote_count: i64,
}

// One row of the per-region tally: a candidate and its votes summed over every station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTotal {
    pub candidate_id: i64,
    pub candidate_name: String,
    pub candidate_number: i64,
    pub total_votes: i64,
}

// Recorded count for one candidate at a single station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationVote {
    pub candidate_id: i64,
    pub vote_count: i64,
}
