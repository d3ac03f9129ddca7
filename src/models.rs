use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grades::{Grade, GradeScale};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GradePair {
    pub v_grade: String,
    pub font_grade: String,
}

impl GradePair {
    pub fn new(v_grade: impl Into<String>, font_grade: impl Into<String>) -> Self {
        Self {
            v_grade: v_grade.into(),
            font_grade: font_grade.into(),
        }
    }

    pub fn from_grade(grade: &Grade) -> Self {
        let other = grade.counterpart();
        match grade.scale {
            GradeScale::VScale => Self::new(grade.label.clone(), other.label),
            GradeScale::FontScale => Self::new(other.label, grade.label.clone()),
        }
    }

    pub fn label(&self, scale: GradeScale) -> &str {
        match scale {
            GradeScale::VScale => &self.v_grade,
            GradeScale::FontScale => &self.font_grade,
        }
    }

    pub fn grade(&self, scale: GradeScale) -> Grade {
        Grade::new(scale, self.label(scale))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub route_id: String,
    pub voter_id: String,
    pub voter_name: String,
    pub grade: GradePair,
    pub overall_rating: u8,
    pub recommend: bool,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub helpful_votes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteInput {
    pub route_id: String,
    pub voter_id: String,
    pub voter_name: String,
    pub v_grade: Option<String>,
    pub font_grade: Option<String>,
    /// Scale the climber picked most recently; decides which label wins when both are set.
    pub last_selected: Option<GradeScale>,
    pub overall_rating: i64,
    pub recommend: bool,
    pub comment: Option<String>,
}

impl VoteInput {
    pub fn select(&mut self, grade: &Grade) {
        let pair = GradePair::from_grade(grade);
        self.v_grade = Some(pair.v_grade);
        self.font_grade = Some(pair.font_grade);
        self.last_selected = Some(grade.scale);
    }
}

/// Most voted label per scale, with how many votes backed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub v_grade: String,
    pub font_grade: String,
    pub v_count: usize,
    pub font_count: usize,
}

impl ConsensusResult {
    pub fn label(&self, scale: GradeScale) -> &str {
        match scale {
            GradeScale::VScale => &self.v_grade,
            GradeScale::FontScale => &self.font_grade,
        }
    }

    /// Number shown as "N climbers agree".
    pub fn agreement(&self) -> usize {
        self.v_count.max(self.font_count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub consensus: ConsensusResult,
    pub average_rating: f64,
    pub total_votes: usize,
    pub recommend_share: f64,
}
