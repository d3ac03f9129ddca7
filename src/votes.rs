use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::InvalidVote;
use crate::grades::{Grade, GradeScale};
use crate::models::{GradePair, Vote, VoteInput};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

pub fn submit_vote(input: VoteInput) -> Result<Vote, InvalidVote> {
    submit_vote_at(input, Utc::now())
}

pub fn submit_vote_at(input: VoteInput, created_at: DateTime<Utc>) -> Result<Vote, InvalidVote> {
    let overall_rating = validate_rating(input.overall_rating)?;
    let grade = reconcile_grades(
        input.v_grade.as_deref(),
        input.font_grade.as_deref(),
        input.last_selected,
    )?;
    let comment = input
        .comment
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    let vote = Vote {
        id: Uuid::new_v4(),
        route_id: input.route_id,
        voter_id: input.voter_id,
        voter_name: input.voter_name,
        grade,
        overall_rating,
        recommend: input.recommend,
        comment,
        created_at,
        helpful_votes: 0,
    };

    info!(
        vote_id = %vote.id,
        route = %vote.route_id,
        v_grade = %vote.grade.v_grade,
        font_grade = %vote.grade.font_grade,
        "vote submitted"
    );

    Ok(vote)
}

pub fn validate_rating(rating: i64) -> Result<u8, InvalidVote> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating as u8)
    } else {
        Err(InvalidVote::RatingOutOfRange(rating))
    }
}

/// Picks the label that wins and derives the other scale from it.
///
/// Blank labels count as missing. With both labels present, the scale selected
/// last wins, falling back to the V-scale.
pub fn reconcile_grades(
    v_grade: Option<&str>,
    font_grade: Option<&str>,
    last_selected: Option<GradeScale>,
) -> Result<GradePair, InvalidVote> {
    let v_grade = v_grade.map(str::trim).filter(|label| !label.is_empty());
    let font_grade = font_grade.map(str::trim).filter(|label| !label.is_empty());

    let source = match (v_grade, font_grade) {
        (None, None) => return Err(InvalidVote::MissingGrade),
        (Some(v), None) => Grade::v(v),
        (None, Some(font)) => Grade::font(font),
        (Some(v), Some(font)) => match last_selected {
            Some(GradeScale::FontScale) => Grade::font(font),
            _ => Grade::v(v),
        },
    };

    Ok(GradePair::from_grade(&source))
}

pub fn record_helpful_vote(vote: &Vote, voter_has_already_marked_helpful: bool) -> Vote {
    let mut updated = vote.clone();
    updated.helpful_votes = if voter_has_already_marked_helpful {
        vote.helpful_votes.saturating_sub(1)
    } else {
        vote.helpful_votes.saturating_add(1)
    };
    updated
}

#[derive(Debug, Clone, Default)]
pub struct HelpfulLedger {
    marked: HashSet<(String, Uuid)>,
}

impl HelpfulLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_marked(&self, voter_id: &str, vote_id: Uuid) -> bool {
        self.marked.contains(&(voter_id.to_string(), vote_id))
    }

    /// Flips `voter_id`'s mark on `vote` and returns the vote with its new counter.
    pub fn toggle(&mut self, voter_id: &str, vote: &Vote) -> Vote {
        let key = (voter_id.to_string(), vote.id);
        let already_marked = self.marked.contains(&key);
        let updated = record_helpful_vote(vote, already_marked);

        if already_marked {
            self.marked.remove(&key);
        } else {
            self.marked.insert(key);
        }

        debug!(
            voter = voter_id,
            vote_id = %vote.id,
            helpful_votes = updated.helpful_votes,
            "helpful mark toggled"
        );

        updated
    }

    pub fn mark(&mut self, voter_id: &str, vote_id: Uuid) {
        self.marked.insert((voter_id.to_string(), vote_id));
    }

    /// Every (voter, vote) mark, sorted.
    pub fn marks(&self) -> Vec<(&str, Uuid)> {
        let mut marks: Vec<(&str, Uuid)> = self
            .marked
            .iter()
            .map(|(voter_id, vote_id)| (voter_id.as_str(), *vote_id))
            .collect();
        marks.sort_unstable();
        marks
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_input(rating: i64) -> VoteInput {
        VoteInput {
            route_id: "la-marie-rose".to_string(),
            voter_id: "user-7".to_string(),
            voter_name: "Avery Lee".to_string(),
            v_grade: Some("V4".to_string()),
            font_grade: None,
            last_selected: Some(GradeScale::VScale),
            overall_rating: rating,
            recommend: true,
            comment: Some("  Sloper crux at the lip.  ".to_string()),
        }
    }

    #[test]
    fn rejects_ratings_outside_one_to_five() {
        assert_eq!(
            submit_vote(sample_input(0)),
            Err(InvalidVote::RatingOutOfRange(0))
        );
        assert_eq!(
            submit_vote(sample_input(6)),
            Err(InvalidVote::RatingOutOfRange(6))
        );
    }

    #[test]
    fn fills_in_font_grade_from_v_grade() {
        let vote = submit_vote(sample_input(3)).unwrap();
        assert_eq!(vote.grade, GradePair::new("V4", "6a"));
        assert_eq!(vote.overall_rating, 3);
        assert_eq!(vote.helpful_votes, 0);
        assert_eq!(vote.comment.as_deref(), Some("Sloper crux at the lip."));
        assert_eq!(vote.route_id, "la-marie-rose");
    }

    #[test]
    fn rejects_vote_without_any_grade() {
        let mut input = sample_input(4);
        input.v_grade = None;
        input.font_grade = Some("   ".to_string());
        assert_eq!(submit_vote(input), Err(InvalidVote::MissingGrade));
    }

    #[test]
    fn last_selected_scale_wins() {
        let pair = reconcile_grades(Some("V2"), Some("7a+"), Some(GradeScale::FontScale)).unwrap();
        assert_eq!(pair, GradePair::new("V7", "7a+"));

        let pair = reconcile_grades(Some("V2"), Some("7a+"), Some(GradeScale::VScale)).unwrap();
        assert_eq!(pair, GradePair::new("V2", "5a"));

        let pair = reconcile_grades(Some("V2"), Some("7a+"), None).unwrap();
        assert_eq!(pair, GradePair::new("V2", "5a"));
    }

    #[test]
    fn font_only_input_derives_v_grade() {
        let mut input = sample_input(5);
        input.v_grade = None;
        input.font_grade = Some("6c+".to_string());
        input.comment = Some("   ".to_string());

        let vote = submit_vote(input).unwrap();
        assert_eq!(vote.grade, GradePair::new("V6", "6c+"));
        assert_eq!(vote.comment, None);
    }

    #[test]
    fn selecting_a_grade_keeps_both_scales_in_sync() {
        let mut input = sample_input(4);
        input.select(&Grade::font("8a+"));
        assert_eq!(input.v_grade.as_deref(), Some("V11"));
        assert_eq!(input.font_grade.as_deref(), Some("8a+"));
        assert_eq!(input.last_selected, Some(GradeScale::FontScale));

        let vote = submit_vote(input).unwrap();
        assert_eq!(vote.grade, GradePair::new("V11", "8a+"));
    }

    #[test]
    fn submitted_votes_get_distinct_ids() {
        let first = submit_vote(sample_input(4)).unwrap();
        let second = submit_vote(sample_input(4)).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn helpful_mark_then_unmark_restores_counter() {
        let mut base = submit_vote(sample_input(4)).unwrap();
        base.helpful_votes = 12;

        let marked = record_helpful_vote(&base, false);
        assert_eq!(marked.helpful_votes, 13);

        let unmarked = record_helpful_vote(&marked, true);
        assert_eq!(unmarked.helpful_votes, 12);
    }

    #[test]
    fn helpful_counter_never_goes_negative() {
        let base = submit_vote(sample_input(4)).unwrap();
        let unmarked = record_helpful_vote(&base, true);
        assert_eq!(unmarked.helpful_votes, 0);
    }

    #[test]
    fn ledger_tracks_marks_per_voter() {
        let vote = submit_vote(sample_input(4)).unwrap();
        let mut ledger = HelpfulLedger::new();

        let after_jules = ledger.toggle("jules", &vote);
        let after_kiara = ledger.toggle("kiara", &after_jules);
        assert_eq!(after_kiara.helpful_votes, 2);
        assert!(ledger.has_marked("jules", vote.id));
        assert!(ledger.has_marked("kiara", vote.id));
        assert_eq!(ledger.len(), 2);

        let jules_again = ledger.toggle("jules", &after_kiara);
        assert_eq!(jules_again.helpful_votes, 1);
        assert!(!ledger.has_marked("jules", vote.id));
        assert!(ledger.has_marked("kiara", vote.id));
        assert_eq!(ledger.marks(), vec![("kiara", vote.id)]);

        ledger.mark("avery", vote.id);
        assert_eq!(ledger.marks(), vec![("avery", vote.id), ("kiara", vote.id)]);
    }
}
