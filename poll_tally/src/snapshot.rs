use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{Poll, Round, TallyRow, VoteDocument, VoteType};
use crate::multiple_choice::tally_multiple_choice;
use crate::normalize::is_submitted;
use crate::tabulate_instant_runoff;

/// The frozen result of a ranked-choice poll.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankedChoiceSnapshot {
    pub rounds: Vec<Round>,
    #[serde(rename = "winnerIds")]
    pub winner_ids: Vec<String>,
    #[serde(rename = "tiedIds")]
    pub tied_ids: Vec<String>,
    #[serde(rename = "voterCount")]
    pub voter_count: u64,
    /// Exhausted ballots in the last round.
    #[serde(rename = "exhaustedCount")]
    pub exhausted_count: u64,
    #[serde(rename = "capturedAt")]
    pub captured_at: DateTime<Utc>,
}

/// A multiple-choice row as persisted. Voter ids are left out on purpose:
/// they only exist during tabulation.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub key: String,
    pub label: String,
    pub order: i64,
    pub count: u64,
    pub percentage: u32,
}

impl From<&TallyRow> for SnapshotRow {
    fn from(row: &TallyRow) -> SnapshotRow {
        SnapshotRow {
            key: row.key.clone(),
            label: row.label.clone(),
            order: row.order,
            count: row.count,
            percentage: row.percentage,
        }
    }
}

/// The frozen result of a multiple-choice poll.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MultipleChoiceSnapshot {
    pub rows: Vec<SnapshotRow>,
    #[serde(rename = "winnerIds")]
    pub winner_ids: Vec<String>,
    #[serde(rename = "voterCount")]
    pub voter_count: u64,
    #[serde(rename = "capturedAt")]
    pub captured_at: DateTime<Utc>,
}

/// The final results of a poll, captured when the poll is finalized.
///
/// The JSON form is tagged by `voteType` and is read by presentation code:
/// field names must stay stable.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "voteType")]
pub enum FinalResultsSnapshot {
    #[serde(rename = "ranked-choice")]
    RankedChoice(RankedChoiceSnapshot),
    #[serde(rename = "multiple-choice")]
    MultipleChoice(MultipleChoiceSnapshot),
}

impl FinalResultsSnapshot {
    pub fn vote_type(&self) -> VoteType {
        match self {
            FinalResultsSnapshot::RankedChoice(_) => VoteType::RankedChoice,
            FinalResultsSnapshot::MultipleChoice(_) => VoteType::MultipleChoice,
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        match self {
            FinalResultsSnapshot::RankedChoice(s) => s.captured_at,
            FinalResultsSnapshot::MultipleChoice(s) => s.captured_at,
        }
    }

    pub fn winner_ids(&self) -> &[String] {
        match self {
            FinalResultsSnapshot::RankedChoice(s) => &s.winner_ids,
            FinalResultsSnapshot::MultipleChoice(s) => &s.winner_ids,
        }
    }

    /// Whether both snapshots describe the same outcome, whenever they were
    /// captured.
    pub fn same_outcome(&self, other: &FinalResultsSnapshot) -> bool {
        match (self, other) {
            (FinalResultsSnapshot::RankedChoice(a), FinalResultsSnapshot::RankedChoice(b)) => {
                RankedChoiceSnapshot {
                    captured_at: b.captured_at,
                    ..a.clone()
                } == *b
            }
            (FinalResultsSnapshot::MultipleChoice(a), FinalResultsSnapshot::MultipleChoice(b)) => {
                MultipleChoiceSnapshot {
                    captured_at: b.captured_at,
                    ..a.clone()
                } == *b
            }
            _ => false,
        }
    }
}

/// Computes the final results of a poll from its vote documents.
///
/// Only submitted votes are counted (see [`is_submitted`]). The result only
/// depends on the poll and the votes, except for `captured_at` which is
/// copied as is.
pub fn build_final_results(
    poll: &Poll,
    votes: &[VoteDocument],
    captured_at: DateTime<Utc>,
) -> FinalResultsSnapshot {
    let allow_write_in = poll.settings.allow_write_in;
    let submitted: Vec<VoteDocument> = votes
        .iter()
        .filter(|v| is_submitted(v, allow_write_in))
        .cloned()
        .collect();
    info!(
        "build_final_results: {:?} poll, {:?} submitted votes out of {:?}",
        poll.settings.vote_type,
        submitted.len(),
        votes.len()
    );

    match poll.settings.vote_type {
        VoteType::RankedChoice => {
            let result = tabulate_instant_runoff(&poll.option_ids(), &submitted);
            let exhausted_count = result.rounds.last().map(|r| r.exhausted).unwrap_or(0);
            FinalResultsSnapshot::RankedChoice(RankedChoiceSnapshot {
                rounds: result.rounds,
                winner_ids: result.winner_ids,
                tied_ids: result.tied_ids,
                voter_count: result.total_ballots,
                exhausted_count,
                captured_at,
            })
        }
        VoteType::MultipleChoice => {
            let tally = tally_multiple_choice(&poll.options, &submitted, allow_write_in);
            let max_count = tally.rows.iter().map(|r| r.count).max().unwrap_or(0);
            let winner_ids: Vec<String> = if max_count == 0 {
                Vec::new()
            } else {
                tally
                    .rows
                    .iter()
                    .filter(|r| r.count == max_count)
                    .map(|r| r.key.clone())
                    .collect()
            };
            FinalResultsSnapshot::MultipleChoice(MultipleChoiceSnapshot {
                rows: tally.rows.iter().map(SnapshotRow::from).collect(),
                winner_ids,
                voter_count: tally.total_voters,
                captured_at,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PollOption, PollSettings};
    use chrono::TimeZone;

    fn poll(settings: PollSettings) -> Poll {
        Poll {
            id: Some("p1".to_string()),
            title: None,
            options: vec![PollOption::new("a", "A", 0), PollOption::new("b", "B", 1)],
            settings,
        }
    }

    #[test]
    fn placeholder_votes_do_not_count_as_voters() {
        let votes = vec![
            VoteDocument::ranked("v1", &["a"]),
            VoteDocument {
                voter_id: "v2".to_string(),
                ..VoteDocument::default()
            },
        ];
        let at = Utc.timestamp_opt(0, 0).unwrap();
        let snap = build_final_results(&poll(PollSettings::RANKED_CHOICE), &votes, at);
        match snap {
            FinalResultsSnapshot::RankedChoice(s) => {
                assert_eq!(s.voter_count, 1);
                assert_eq!(s.winner_ids, vec!["a".to_string()]);
                assert_eq!(s.exhausted_count, 0);
            }
            x => panic!("unexpected snapshot {:?}", x),
        }
    }

    #[test]
    fn multiple_choice_without_votes_has_no_winner() {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        let snap = build_final_results(&poll(PollSettings::MULTIPLE_CHOICE), &[], at);
        assert!(snap.winner_ids().is_empty());
        assert_eq!(snap.vote_type(), VoteType::MultipleChoice);
    }

    #[test]
    fn same_outcome_ignores_capture_time() {
        let votes = vec![VoteDocument::selection("v1", &["b"], None)];
        let p = poll(PollSettings::MULTIPLE_CHOICE);
        let s1 = build_final_results(&p, &votes, Utc.timestamp_opt(0, 0).unwrap());
        let s2 = build_final_results(&p, &votes, Utc.timestamp_opt(3600, 0).unwrap());
        assert_ne!(s1, s2);
        assert!(s1.same_outcome(&s2));

        let s3 = build_final_results(&p, &[], Utc.timestamp_opt(0, 0).unwrap());
        assert!(!s1.same_outcome(&s3));
    }
}
