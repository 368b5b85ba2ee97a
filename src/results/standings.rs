use serde::Serialize;

use crate::models::CandidateTotal;

// A candidate's place in the region ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub rank: usize,
    pub candidate_id: i64,
    pub candidate_name: String,
    pub candidate_number: i64,
    pub total_votes: i64,
    pub percentage: f64,
    pub elected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standings {
    pub total_votes: i64,
    pub entries: Vec<Standing>,
}

/// Rank already-sorted region totals and mark the representative slots.
///
/// The first `representative_count` entries are elected. The cutoff is purely
/// positional, so candidates tied on votes across the boundary are separated
/// by the order of `results`, never by a vote threshold.
pub fn rank_results(results: &[CandidateTotal], representative_count: usize) -> Standings {
    let total_votes: i64 = results.iter().map(|r| r.total_votes).sum();

    let entries = results
        .iter()
        .enumerate()
        .map(|(index, result)| Standing {
            rank: index + 1,
            candidate_id: result.candidate_id,
            candidate_name: result.candidate_name.clone(),
            candidate_number: result.candidate_number,
            total_votes: result.total_votes,
            percentage: percentage_of(result.total_votes, total_votes),
            elected: index < representative_count,
        })
        .collect();

    Standings {
        total_votes,
        entries,
    }
}

// Share of the total in percent, rounded to two decimals
pub(crate) fn percentage_of(votes: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (votes as f64 * 10_000.0 / total as f64).round() / 100.0
}
