//! Boulder grade conversion between the V-scale and the Font scale, and
//! community consensus over climbers' grade votes.

pub mod consensus;
pub mod error;
pub mod filter;
pub mod grades;
pub mod logging;
pub mod models;
pub mod report;
pub mod store;
pub mod votes;

pub use consensus::{compute_consensus, rank_by_helpfulness, summarize_ratings};
pub use error::{InvalidVote, StoreError};
pub use grades::{
    difficulty_ordinal, is_valid_font_grade, is_valid_v_grade, to_font_scale, to_v_scale,
    DifficultyOrdinal, Grade, GradeConverter, GradeScale, FONT_GRADES, V_GRADES,
};
pub use models::{ConsensusResult, GradePair, RatingSummary, Vote, VoteInput};
pub use store::VoteStore;
pub use votes::{record_helpful_vote, submit_vote, HelpfulLedger};
