use std::fmt::Write;

use crate::consensus;
use crate::filter::compare_difficulty;
use crate::grades::GradeScale;
use crate::models::{GradePair, Vote};

/// Markdown community-grade summary for one route.
///
/// `submitter` is the grade the route was first published with; it is also
/// what the consensus falls back to before anyone has voted.
pub fn build_report(
    route_id: &str,
    submitter: &GradePair,
    preferred: GradeScale,
    votes: &[Vote],
) -> String {
    let summary = consensus::summarize_ratings(votes, submitter);
    let other = preferred.other();

    let mut output = String::new();

    let _ = writeln!(output, "# Community Grade Report");
    let _ = writeln!(output, "Route: {route_id}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade");
    let _ = writeln!(
        output,
        "- Submitter grade: {} / {}",
        submitter.label(preferred),
        submitter.label(other)
    );
    let _ = writeln!(
        output,
        "- Community consensus: {} / {} ({} climbers agree)",
        summary.consensus.label(preferred),
        summary.consensus.label(other),
        summary.consensus.agreement()
    );
    let _ = writeln!(
        output,
        "- Average rating: {:.1}/5 across {} votes ({:.0}% recommend)",
        summary.average_rating,
        summary.total_votes,
        summary.recommend_share * 100.0
    );

    let mut distribution = consensus::tally_votes(votes, preferred);
    distribution.sort_by(|a, b| compare_difficulty(&a.0, &b.0));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Distribution");

    if distribution.is_empty() {
        let _ = writeln!(output, "No votes recorded for this route.");
    } else {
        for (label, count) in distribution.iter() {
            let _ = writeln!(output, "- {label}: {count}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Helpful Comments");

    let commented: Vec<&Vote> = consensus::rank_by_helpfulness(votes)
        .into_iter()
        .filter(|vote| vote.comment.is_some())
        .take(5)
        .collect();

    if commented.is_empty() {
        let _ = writeln!(output, "No comments yet.");
    } else {
        for vote in commented {
            let _ = writeln!(
                output,
                "- {} ({}, {}/5, {} helpful) on {}: {}",
                vote.voter_name,
                vote.grade.label(preferred),
                vote.overall_rating,
                vote.helpful_votes,
                vote.created_at.date_naive(),
                vote.comment.as_deref().unwrap_or_default()
            );
        }
    }

    output
}
