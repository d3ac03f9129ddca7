use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{InvalidVote, StoreError};
use crate::grades::GradeConverter;
use crate::models::{GradePair, Vote};
use crate::votes::{self, HelpfulLedger};

pub const DEMO_ROUTE: &str = "demo-boulder";

/// Votes grouped by route, each route keeping insertion order.
#[derive(Debug, Clone, Default)]
pub struct VoteStore {
    routes: HashMap<String, Vec<Vote>>,
}

// Flat CSV shape of a vote.
#[derive(Debug, Serialize, Deserialize)]
struct VoteRow {
    id: Option<Uuid>,
    route_id: String,
    voter_id: String,
    voter_name: String,
    v_grade: Option<String>,
    font_grade: Option<String>,
    overall_rating: i64,
    recommend: bool,
    comment: Option<String>,
    created_at: Option<DateTime<Utc>>,
    helpful_votes: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HelpfulRow {
    voter_id: String,
    vote_id: Uuid,
}

impl From<&Vote> for VoteRow {
    fn from(vote: &Vote) -> Self {
        Self {
            id: Some(vote.id),
            route_id: vote.route_id.clone(),
            voter_id: vote.voter_id.clone(),
            voter_name: vote.voter_name.clone(),
            v_grade: Some(vote.grade.v_grade.clone()),
            font_grade: Some(vote.grade.font_grade.clone()),
            overall_rating: vote.overall_rating as i64,
            recommend: vote.recommend,
            comment: vote.comment.clone(),
            created_at: Some(vote.created_at),
            helpful_votes: Some(vote.helpful_votes),
        }
    }
}

impl VoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed() -> Self {
        let votes = vec![
            (
                Uuid::from_u128(0x0b6f_1c2e_4a8d_4e61_9f3a_2d5c_7e1b_0001),
                "user1",
                "ClimberPro",
                "V4",
                4,
                "Felt solid V4. The crux move to the sloper is definitely the hardest part.",
                Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0),
                12,
            ),
            (
                Uuid::from_u128(0x0b6f_1c2e_4a8d_4e61_9f3a_2d5c_7e1b_0002),
                "user2",
                "BoulderBeast",
                "V5",
                3,
                "I think this is more like V5. The holds are smaller than they appear in photos.",
                Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0),
                8,
            ),
            (
                Uuid::from_u128(0x0b6f_1c2e_4a8d_4e61_9f3a_2d5c_7e1b_0003),
                "user3",
                "SlopeMaster",
                "V4",
                5,
                "Classic V4. Perfect for warming up before harder projects.",
                Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0),
                15,
            ),
        ];

        let mut store = Self::new();
        for (id, voter_id, voter_name, v_grade, rating, comment, created_at, helpful_votes) in votes
        {
            store.insert(Vote {
                id,
                route_id: DEMO_ROUTE.to_string(),
                voter_id: voter_id.to_string(),
                voter_name: voter_name.to_string(),
                grade: GradePair::new(v_grade, crate::grades::to_font_scale(v_grade)),
                overall_rating: rating,
                recommend: true,
                comment: Some(comment.to_string()),
                created_at: created_at.single().unwrap_or_default(),
                helpful_votes,
            });
        }

        store
    }

    pub fn insert(&mut self, vote: Vote) {
        self.routes
            .entry(vote.route_id.clone())
            .or_default()
            .push(vote);
    }

    pub fn votes_for(&self, route_id: &str) -> &[Vote] {
        self.routes
            .get(route_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn get(&self, vote_id: Uuid) -> Option<&Vote> {
        self.routes
            .values()
            .flat_map(|votes| votes.iter())
            .find(|vote| vote.id == vote_id)
    }

    /// Replaces the stored vote carrying the same id.
    pub fn apply(&mut self, vote: Vote) -> Result<(), StoreError> {
        let slot = self
            .routes
            .get_mut(&vote.route_id)
            .and_then(|votes| votes.iter_mut().find(|stored| stored.id == vote.id))
            .ok_or(StoreError::UnknownVote(vote.id))?;

        *slot = vote;
        Ok(())
    }

    pub fn routes(&self) -> Vec<&str> {
        let mut routes: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        routes.sort_unstable();
        routes
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn load_csv(path: &Path) -> Result<Self, StoreError> {
        let reader = csv::Reader::from_path(path)?;
        let store = Self::read_rows(reader)?;
        info!(votes = store.len(), path = %path.display(), "votes loaded");
        Ok(store)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, StoreError> {
        Self::read_rows(csv::Reader::from_reader(reader))
    }

    fn read_rows<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, StoreError> {
        let mut store = Self::new();

        for (index, result) in reader.deserialize::<VoteRow>().enumerate() {
            let row = result?;
            let invalid = |source: InvalidVote| StoreError::InvalidRow {
                row: index + 1,
                source,
            };

            let overall_rating = votes::validate_rating(row.overall_rating).map_err(invalid)?;
            let grade = stored_grades(row.v_grade.as_deref(), row.font_grade.as_deref())
                .map_err(invalid)?;

            store.insert(Vote {
                id: row.id.unwrap_or_else(Uuid::new_v4),
                route_id: row.route_id,
                voter_id: row.voter_id,
                voter_name: row.voter_name,
                grade,
                overall_rating,
                recommend: row.recommend,
                comment: row.comment.filter(|text| !text.trim().is_empty()),
                created_at: row.created_at.unwrap_or_else(Utc::now),
                helpful_votes: row.helpful_votes.unwrap_or(0),
            });
        }

        Ok(store)
    }

    /// Flips `voter_id`'s helpful mark on a stored vote and stores the new counter.
    pub fn toggle_helpful(
        &mut self,
        ledger: &mut HelpfulLedger,
        voter_id: &str,
        vote_id: Uuid,
    ) -> Result<Vote, StoreError> {
        let vote = self.get(vote_id).ok_or(StoreError::UnknownVote(vote_id))?;
        let updated = ledger.toggle(voter_id, vote);
        self.apply(updated.clone())?;
        Ok(updated)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), StoreError> {
        let writer = csv::Writer::from_path(path)?;
        self.write_rows(writer)?;
        info!(votes = self.len(), path = %path.display(), "votes written");
        Ok(())
    }

    fn write_rows<W: io::Write>(&self, mut writer: csv::Writer<W>) -> Result<(), StoreError> {
        for route in self.routes() {
            for vote in self.votes_for(route) {
                writer.serialize(VoteRow::from(vote))?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

// A recognized, consistent pair is kept as stored, so Font sub-grades such as
// `6a+` survive; anything else is rebuilt from the V label.
fn stored_grades(
    v_grade: Option<&str>,
    font_grade: Option<&str>,
) -> Result<GradePair, InvalidVote> {
    let converter = GradeConverter::global();

    if let (Some(v), Some(font)) = (v_grade.map(str::trim), font_grade.map(str::trim)) {
        if converter.is_valid_v_grade(v)
            && converter.is_valid_font_grade(font)
            && converter.to_v_scale(font) == v
        {
            return Ok(GradePair::new(v, font));
        }
    }

    votes::reconcile_grades(v_grade, font_grade, None)
}

/// Helpful marks live next to the vote file: `votes.csv` -> `votes.helpful.csv`.
pub fn ledger_path(votes_path: &Path) -> PathBuf {
    votes_path.with_extension("helpful.csv")
}

pub fn load_ledger(path: &Path) -> Result<HelpfulLedger, StoreError> {
    let mut ledger = HelpfulLedger::new();
    if !path.exists() {
        return Ok(ledger);
    }

    let mut reader = csv::Reader::from_path(path)?;
    for result in reader.deserialize::<HelpfulRow>() {
        let row = result?;
        ledger.mark(&row.voter_id, row.vote_id);
    }

    Ok(ledger)
}

pub fn write_ledger(ledger: &HelpfulLedger, path: &Path) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path)?;
    for (voter_id, vote_id) in ledger.marks() {
        writer.serialize(HelpfulRow {
            voter_id: voter_id.to_string(),
            vote_id,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::votes::record_helpful_vote;
    use pretty_assertions::assert_eq;

    #[test]
    fn seed_has_three_demo_votes() {
        let store = VoteStore::seed();
        let votes = store.votes_for(DEMO_ROUTE);
        assert_eq!(votes.len(), 3);
        assert_eq!(votes[0].voter_name, "ClimberPro");
        assert_eq!(votes[1].grade, GradePair::new("V5", "6b"));
        assert_eq!(votes[2].helpful_votes, 15);
        assert_eq!(store.routes(), vec![DEMO_ROUTE]);
    }

    #[test]
    fn unknown_route_has_no_votes() {
        let store = VoteStore::seed();
        assert!(store.votes_for("nowhere").is_empty());
    }

    #[test]
    fn apply_replaces_vote_in_place() {
        let mut store = VoteStore::seed();
        let original = store.votes_for(DEMO_ROUTE)[1].clone();
        let updated = record_helpful_vote(&original, false);

        store.apply(updated).unwrap();
        assert_eq!(store.votes_for(DEMO_ROUTE)[1].helpful_votes, 9);
        assert_eq!(store.get(original.id).map(|vote| vote.helpful_votes), Some(9));
    }

    #[test]
    fn apply_rejects_unknown_vote() {
        let mut store = VoteStore::seed();
        let mut stray = store.votes_for(DEMO_ROUTE)[0].clone();
        stray.id = Uuid::new_v4();
        assert!(matches!(
            store.apply(stray),
            Err(StoreError::UnknownVote(_))
        ));
    }

    #[test]
    fn csv_survives_write_and_read() {
        let store = VoteStore::seed();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votes.csv");

        store.write_csv(&path).unwrap();
        let loaded = VoteStore::load_csv(&path).unwrap();

        assert_eq!(loaded.votes_for(DEMO_ROUTE), store.votes_for(DEMO_ROUTE));
    }

    #[test]
    fn csv_keeps_font_sub_grades() {
        let mut store = VoteStore::new();
        let vote = votes::submit_vote(crate::models::VoteInput {
            route_id: "cortomaltese".to_string(),
            voter_id: "user9".to_string(),
            voter_name: "Jules".to_string(),
            font_grade: Some("6a+".to_string()),
            last_selected: Some(crate::grades::GradeScale::FontScale),
            overall_rating: 4,
            recommend: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(vote.grade, GradePair::new("V4", "6a+"));
        store.insert(vote);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votes.csv");
        store.write_csv(&path).unwrap();
        let once = VoteStore::load_csv(&path).unwrap();
        once.write_csv(&path).unwrap();
        let twice = VoteStore::load_csv(&path).unwrap();

        assert_eq!(once.votes_for("cortomaltese"), store.votes_for("cortomaltese"));
        assert_eq!(twice.votes_for("cortomaltese"), store.votes_for("cortomaltese"));
    }

    #[test]
    fn second_toggle_by_same_voter_undoes_the_first() {
        let mut store = VoteStore::seed();
        let vote_id = store.votes_for(DEMO_ROUTE)[1].id;
        let dir = tempfile::tempdir().unwrap();
        let path = ledger_path(&dir.path().join("votes.csv"));
        assert_eq!(path, dir.path().join("votes.helpful.csv"));

        let mut ledger = load_ledger(&path).unwrap();
        let marked = store.toggle_helpful(&mut ledger, "kiara", vote_id).unwrap();
        assert_eq!(marked.helpful_votes, 9);
        write_ledger(&ledger, &path).unwrap();

        let mut ledger = load_ledger(&path).unwrap();
        assert!(ledger.has_marked("kiara", vote_id));
        let unmarked = store.toggle_helpful(&mut ledger, "kiara", vote_id).unwrap();
        assert_eq!(unmarked.helpful_votes, 8);
        assert!(!ledger.has_marked("kiara", vote_id));

        let other = store.toggle_helpful(&mut ledger, "jules", vote_id).unwrap();
        assert_eq!(other.helpful_votes, 9);
        assert_eq!(store.get(vote_id).map(|vote| vote.helpful_votes), Some(9));
    }

    #[test]
    fn toggle_on_unknown_vote_fails() {
        let mut store = VoteStore::seed();
        let mut ledger = HelpfulLedger::new();
        assert!(matches!(
            store.toggle_helpful(&mut ledger, "kiara", Uuid::new_v4()),
            Err(StoreError::UnknownVote(_))
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn import_fills_missing_fields() {
        let data = "\
id,route_id,voter_id,voter_name,v_grade,font_grade,overall_rating,recommend,comment,created_at,helpful_votes
,cortomaltese,user9,Jules,,7a+,4,true,,,
";
        let store = VoteStore::from_reader(data.as_bytes()).unwrap();
        let votes = store.votes_for("cortomaltese");
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].grade, GradePair::new("V7", "7a+"));
        assert_eq!(votes[0].helpful_votes, 0);
        assert_eq!(votes[0].comment, None);
    }

    #[test]
    fn import_reports_bad_rows() {
        let data = "\
id,route_id,voter_id,voter_name,v_grade,font_grade,overall_rating,recommend,comment,created_at,helpful_votes
,cortomaltese,user9,Jules,V7,7a+,4,true,,,
,cortomaltese,user10,Kiara,V7,7a+,9,true,,,
";
        let err = VoteStore::from_reader(data.as_bytes()).unwrap_err();
        match err {
            StoreError::InvalidRow { row, source } => {
                assert_eq!(row, 2);
                assert_eq!(source, InvalidVote::RatingOutOfRange(9));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn import_realigns_inconsistent_pairs_on_v_grade() {
        let data = "\
id,route_id,voter_id,voter_name,v_grade,font_grade,overall_rating,recommend,comment,created_at,helpful_votes
,cortomaltese,user9,Jules,V4,8a,3,false,steep,,2
";
        let store = VoteStore::from_reader(data.as_bytes()).unwrap();
        let vote = &store.votes_for("cortomaltese")[0];
        assert_eq!(vote.grade, GradePair::new("V4", "6a"));
        assert_eq!(vote.helpful_votes, 2);
        assert!(!vote.recommend);
    }
}
