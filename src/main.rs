use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use uuid::Uuid;

use boulder_grades::filter::{self, GradeRange, SortKey};
use boulder_grades::{
    consensus, logging, report, store, votes, Grade, GradeConverter, GradePair, GradeScale,
    VoteInput, VoteStore, V_GRADES,
};

#[derive(Parser)]
#[command(name = "boulder-grades")]
#[command(about = "Boulder grade conversion and community grade consensus", long_about = None)]
struct Cli {
    /// CSV file holding the community votes
    #[arg(long, global = true, env = "BOULDER_VOTES_CSV", default_value = "votes.csv")]
    votes: PathBuf,
    /// Scale shown first in output
    #[arg(long, global = true, env = "BOULDER_GRADE_SCALE", default_value = "v-scale")]
    scale: GradeScale,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a grade to the other scale
    Convert {
        grade: String,
        /// Scale of GRADE; guessed from the label when omitted
        #[arg(long)]
        from: Option<GradeScale>,
    },
    /// Print the V-scale to Font conversion chart
    Chart,
    /// Write the demonstration votes
    Seed {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the community consensus for a route
    Consensus {
        #[arg(long)]
        route: String,
        /// Grade to show before anyone has voted
        #[arg(long)]
        fallback: Option<String>,
    },
    /// List the votes on a route
    Votes {
        #[arg(long)]
        route: String,
        #[arg(long)]
        min: Option<String>,
        #[arg(long)]
        max: Option<String>,
        #[arg(long, default_value = "recent")]
        sort: SortKey,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Submit a grade vote and rating
    #[command(group(
        ArgGroup::new("grade")
            .args(["v_grade", "font_grade"])
            .required(true)
            .multiple(true)
    ))]
    Submit {
        #[arg(long)]
        route: String,
        #[arg(long)]
        voter: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        v_grade: Option<String>,
        #[arg(long)]
        font_grade: Option<String>,
        /// Scale picked last when both grades are given
        #[arg(long)]
        last: Option<GradeScale>,
        #[arg(long)]
        rating: i64,
        #[arg(long)]
        no_recommend: bool,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Mark a vote as helpful, or take your mark back
    Helpful {
        #[arg(long)]
        vote_id: Uuid,
        /// Climber marking the vote; a second run by the same climber removes the mark
        #[arg(long)]
        voter: String,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        route: String,
        /// Grade the route was submitted with
        #[arg(long)]
        submitter: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert { grade, from } => {
            let scale = from.unwrap_or_else(|| GradeScale::of_label(&grade));
            let grade = Grade::new(scale, grade);
            let converted = grade.counterpart();

            if grade.is_recognized() {
                println!("{} ({}) = {} ({})", grade, grade.scale, converted, converted.scale);
            } else {
                println!("{} is not a known {} grade; left unchanged.", grade, grade.scale);
            }
        }
        Commands::Chart => {
            let converter = GradeConverter::global();
            println!("V-scale  Font  Ordinal");
            for v_grade in V_GRADES {
                println!(
                    "{:<8} {:<5} {}",
                    v_grade,
                    converter.to_font_scale(v_grade),
                    converter.difficulty_ordinal(v_grade)
                );
            }
        }
        Commands::Seed { out } => {
            let out = out.unwrap_or(cli.votes);
            let store = VoteStore::seed();
            store
                .write_csv(&out)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Seed votes written to {}.", out.display());
        }
        Commands::Consensus { route, fallback } => {
            let store = load_store(&cli.votes, false)?;
            let fallback = fallback_pair(fallback.as_deref());
            let summary = consensus::summarize_ratings(store.votes_for(&route), &fallback);
            let other = cli.scale.other();

            println!(
                "{}: {} / {} ({} climbers agree)",
                route,
                summary.consensus.label(cli.scale),
                summary.consensus.label(other),
                summary.consensus.agreement()
            );
            println!(
                "Average rating {:.1}/5 across {} votes, {:.0}% recommend.",
                summary.average_rating,
                summary.total_votes,
                summary.recommend_share * 100.0
            );
        }
        Commands::Votes {
            route,
            min,
            max,
            sort,
            limit,
        } => {
            let store = load_store(&cli.votes, false)?;
            let range = GradeRange::new(min, max);
            let mut listed = filter::filter_votes(store.votes_for(&route), &range);
            filter::sort_votes(&mut listed, sort);

            if listed.is_empty() {
                println!("No votes found for this route.");
                return Ok(());
            }

            println!("Votes on {route} by {sort}:");
            for vote in listed.iter().take(limit) {
                println!(
                    "- {} {} ({}) {}/5{} {} helpful [{}]",
                    vote.voter_name,
                    vote.grade.label(cli.scale),
                    vote.grade.label(cli.scale.other()),
                    vote.overall_rating,
                    if vote.recommend { ", recommends" } else { "" },
                    vote.helpful_votes,
                    vote.id
                );
            }
        }
        Commands::Submit {
            route,
            voter,
            name,
            v_grade,
            font_grade,
            last,
            rating,
            no_recommend,
            comment,
        } => {
            let mut store = load_store(&cli.votes, true)?;
            let input = VoteInput {
                route_id: route,
                voter_name: name.unwrap_or_else(|| voter.clone()),
                voter_id: voter,
                v_grade,
                font_grade,
                last_selected: last,
                overall_rating: rating,
                recommend: !no_recommend,
                comment,
            };

            let vote = votes::submit_vote(input).context("vote rejected")?;
            println!("{}", serde_json::to_string_pretty(&vote)?);

            store.insert(vote);
            store
                .write_csv(&cli.votes)
                .with_context(|| format!("failed to write {}", cli.votes.display()))?;
        }
        Commands::Helpful { vote_id, voter } => {
            let mut store = load_store(&cli.votes, false)?;
            let ledger_path = store::ledger_path(&cli.votes);
            let mut ledger = store::load_ledger(&ledger_path)
                .with_context(|| format!("failed to read {}", ledger_path.display()))?;

            let updated = store.toggle_helpful(&mut ledger, &voter, vote_id)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);

            store
                .write_csv(&cli.votes)
                .with_context(|| format!("failed to write {}", cli.votes.display()))?;
            store::write_ledger(&ledger, &ledger_path)
                .with_context(|| format!("failed to write {}", ledger_path.display()))?;
        }
        Commands::Report {
            route,
            submitter,
            out,
        } => {
            let store = load_store(&cli.votes, false)?;
            let submitter = fallback_pair(submitter.as_deref());
            let report =
                report::build_report(&route, &submitter, cli.scale, store.votes_for(&route));
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn load_store(path: &Path, allow_missing: bool) -> anyhow::Result<VoteStore> {
    if allow_missing && !path.exists() {
        return Ok(VoteStore::new());
    }

    VoteStore::load_csv(path)
        .with_context(|| format!("failed to read votes from {}", path.display()))
}

fn fallback_pair(label: Option<&str>) -> GradePair {
    match label {
        Some(label) => GradePair::from_grade(&Grade::new(GradeScale::of_label(label), label)),
        None => GradePair::new("N/A", "N/A"),
    }
}
