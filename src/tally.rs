use log::{debug, info, warn};

use poll_tally::*;
use snafu::{prelude::*, Snafu};

use chrono::{DateTime, Utc};
use std::fs;
use text_diff::print_diff;

pub mod poll_reader;

use crate::tally::poll_reader::*;

#[derive(Debug, Snafu)]
pub enum PollTallyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the snapshot"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Invalid poll: {source}"))]
    InvalidPoll { source: PollErrors },
    #[snafu(display("Invalid capture time {value:?} (expected RFC 3339)"))]
    ParsingTimestamp {
        source: chrono::ParseError,
        value: String,
    },
    #[snafu(display("Error writing the snapshot to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the computed snapshot and the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type PtResult<T> = Result<T, PollTallyError>;

/// What to tabulate and where to put the result.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct TallyRequest {
    pub input: String,
    pub out: Option<String>,
    pub reference: Option<String>,
    pub captured_at: Option<String>,
    pub vote_type: Option<String>,
}

fn parse_captured_at(value: &Option<String>) -> PtResult<DateTime<Utc>> {
    match value {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .context(ParsingTimestampSnafu { value: s }),
        None => Ok(Utc::now()),
    }
}

fn log_snapshot(snapshot: &FinalResultsSnapshot, poll: &Poll) {
    let label_of = |id: &str| -> String {
        poll.options
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| id.to_string())
    };
    match snapshot {
        FinalResultsSnapshot::RankedChoice(s) => {
            info!("Ranked-choice poll: {} voters", s.voter_count);
            for round in s.rounds.iter() {
                info!(
                    "Round {} ({} ballots counted, {} exhausted)",
                    round.round, round.non_exhausted, round.exhausted
                );
                for (id, count) in round.counts.iter() {
                    let status = if round.eliminated_ids.contains(id) && s.tied_ids.is_empty() {
                        " -> eliminated"
                    } else if s.winner_ids.contains(id) && round.eliminated_ids.is_empty() {
                        " -> elected"
                    } else {
                        ""
                    };
                    info!("{:>8} {}{}", count, label_of(id.as_str()), status);
                }
            }
            if !s.tied_ids.is_empty() {
                let labels: Vec<String> = s.tied_ids.iter().map(|id| label_of(id.as_str())).collect();
                info!("Tie between: {}", labels.join(", "));
            }
        }
        FinalResultsSnapshot::MultipleChoice(s) => {
            info!("Multiple-choice poll: {} voters", s.voter_count);
            for row in s.rows.iter() {
                info!("{:>8} {:>3}% {}", row.count, row.percentage, row.label);
            }
            if s.winner_ids.is_empty() {
                info!("No winner: no vote was cast");
            }
        }
    }
}

fn write_output(out: &Option<String>, pretty_js: &str) -> PtResult<()> {
    match out.as_deref() {
        None | Some("stdout") | Some("") => {
            println!("{}", pretty_js);
            Ok(())
        }
        Some(path) => {
            info!("Writing snapshot to {:?}", path);
            fs::write(path, pretty_js).context(WritingOutputSnafu { path })
        }
    }
}

fn check_reference(path: &str, snapshot: &FinalResultsSnapshot) -> PtResult<()> {
    let summary_ref = read_reference(path)?;
    let computed =
        without_capture_time(serde_json::to_value(snapshot).context(SerializingJsonSnafu {})?);
    let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    let pretty_computed = serde_json::to_string_pretty(&computed).context(SerializingJsonSnafu {})?;
    if pretty_ref != pretty_computed {
        warn!("Found differences with the reference snapshot");
        print_diff(pretty_ref.as_str(), pretty_computed.as_str(), "\n");
        return ReferenceMismatchSnafu { path }.fail();
    }
    info!("Snapshot matches the reference {:?}", path);
    Ok(())
}

/// Builds the final results snapshot of a poll export.
pub fn compute_snapshot(request: &TallyRequest) -> PtResult<FinalResultsSnapshot> {
    let export = read_poll_export(&request.input)?;
    let mut poll = export.poll;
    poll.validate().context(InvalidPollSnafu {})?;

    if let Some(vt) = &request.vote_type {
        let vote_type = vt.parse::<VoteType>().context(InvalidPollSnafu {})?;
        if vote_type != poll.settings.vote_type {
            warn!(
                "Counting a {} poll as {}",
                poll.settings.vote_type, vote_type
            );
        }
        poll.settings.vote_type = vote_type;
    }

    let captured_at = parse_captured_at(&request.captured_at)?;
    debug!("compute_snapshot: captured at {:?}", captured_at);
    let snapshot = build_final_results(&poll, &export.votes, captured_at);
    log_snapshot(&snapshot, &poll);
    Ok(snapshot)
}

pub fn run_poll(request: &TallyRequest) -> PtResult<()> {
    info!("Processing poll export {:?}", request.input);
    let snapshot = compute_snapshot(request)?;

    let pretty_js: String =
        serde_json::to_string_pretty(&snapshot).context(SerializingJsonSnafu {})?;
    write_output(&request.out, &pretty_js)?;

    // The reference snapshot, if provided for comparison
    if let Some(reference) = &request.reference {
        check_reference(reference, &snapshot)?;
    }
    Ok(())
}
