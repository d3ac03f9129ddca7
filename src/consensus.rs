use std::cmp::Ordering;

use crate::grades::GradeScale;
use crate::models::{ConsensusResult, GradePair, RatingSummary, Vote};

/// Most voted label on each scale, counted independently.
///
/// Ties go to the label seen first in `votes`. With no votes at all, both
/// scales fall back to `fallback` with a count of zero.
pub fn compute_consensus(votes: &[Vote], fallback: &GradePair) -> ConsensusResult {
    let (v_grade, v_count) = most_voted(&tally_votes(votes, GradeScale::VScale))
        .unwrap_or_else(|| (fallback.v_grade.clone(), 0));
    let (font_grade, font_count) = most_voted(&tally_votes(votes, GradeScale::FontScale))
        .unwrap_or_else(|| (fallback.font_grade.clone(), 0));

    ConsensusResult {
        v_grade,
        font_grade,
        v_count,
        font_count,
    }
}

/// Vote counts per label on one scale, in order of first appearance.
pub fn tally_votes(votes: &[Vote], scale: GradeScale) -> Vec<(String, usize)> {
    let mut tally: Vec<(String, usize)> = Vec::new();

    for vote in votes {
        let label = vote.grade.label(scale);
        match tally.iter_mut().find(|entry| entry.0 == label) {
            Some(entry) => entry.1 += 1,
            None => tally.push((label.to_string(), 1)),
        }
    }

    tally
}

fn most_voted(tally: &[(String, usize)]) -> Option<(String, usize)> {
    let mut best: Option<&(String, usize)> = None;

    for entry in tally {
        // strictly greater, so the earliest label keeps a tie
        if best.map_or(true, |current| entry.1 > current.1) {
            best = Some(entry);
        }
    }

    best.cloned()
}

pub fn summarize_ratings(votes: &[Vote], fallback: &GradePair) -> RatingSummary {
    let consensus = compute_consensus(votes, fallback);
    let total_votes = votes.len();

    let (average_rating, recommend_share) = if total_votes == 0 {
        (0.0, 0.0)
    } else {
        let rating_sum: u32 = votes.iter().map(|vote| vote.overall_rating as u32).sum();
        let recommended = votes.iter().filter(|vote| vote.recommend).count();
        (
            rating_sum as f64 / total_votes as f64,
            recommended as f64 / total_votes as f64,
        )
    };

    RatingSummary {
        consensus,
        average_rating,
        total_votes,
        recommend_share,
    }
}

/// Most helpful first; newer votes first among equals.
pub fn rank_by_helpfulness(votes: &[Vote]) -> Vec<&Vote> {
    let mut ranked: Vec<&Vote> = votes.iter().collect();
    ranked.sort_by(|a, b| compare_helpfulness(a, b));
    ranked
}

fn compare_helpfulness(a: &Vote, b: &Vote) -> Ordering {
    b.helpful_votes
        .cmp(&a.helpful_votes)
        .then_with(|| b.created_at.cmp(&a.created_at))
}
