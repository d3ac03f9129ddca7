use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::grades::difficulty_ordinal;
use crate::models::Vote;

/// Inclusive difficulty window. Bounds may be labels of either scale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeRange {
    pub min: Option<String>,
    pub max: Option<String>,
}

impl GradeRange {
    pub fn new(min: Option<String>, max: Option<String>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, label: &str) -> bool {
        let ordinal = difficulty_ordinal(label);
        let above_min = self
            .min
            .as_deref()
            .map_or(true, |min| ordinal >= difficulty_ordinal(min));
        let below_max = self
            .max
            .as_deref()
            .map_or(true, |max| ordinal <= difficulty_ordinal(max));

        above_min && below_max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Grade,
    Rating,
    #[default]
    Recent,
    Helpful,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Grade => "grade",
            SortKey::Rating => "rating",
            SortKey::Recent => "recent",
            SortKey::Helpful => "helpful",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grade" => Ok(SortKey::Grade),
            "rating" => Ok(SortKey::Rating),
            "recent" => Ok(SortKey::Recent),
            "helpful" => Ok(SortKey::Helpful),
            other => Err(format!(
                "unknown sort key '{other}' (expected grade, rating, recent or helpful)"
            )),
        }
    }
}

pub fn filter_votes<'a>(votes: &'a [Vote], range: &GradeRange) -> Vec<&'a Vote> {
    votes
        .iter()
        .filter(|vote| range.contains(&vote.grade.v_grade))
        .collect()
}

pub fn sort_votes(votes: &mut [&Vote], key: SortKey) {
    match key {
        SortKey::Grade => votes.sort_by(|a, b| {
            compare_difficulty(&a.grade.v_grade, &b.grade.v_grade)
        }),
        SortKey::Rating => votes.sort_by(|a, b| b.overall_rating.cmp(&a.overall_rating)),
        SortKey::Recent => votes.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Helpful => votes.sort_by(|a, b| b.helpful_votes.cmp(&a.helpful_votes)),
    }
}

pub fn compare_difficulty(a: &str, b: &str) -> Ordering {
    difficulty_ordinal(a)
        .partial_cmp(&difficulty_ordinal(b))
        .unwrap_or(Ordering::Equal)
}
