use std::collections::HashSet;

use chrono::{DateTime, Utc};

pub use crate::config::*;
use crate::config::validate_options;
use crate::snapshot::{build_final_results, FinalResultsSnapshot};

/// A builder for assembling a poll and its votes.
///
/// The builder checks what the tabulation expects the caller to guarantee:
/// well-formed option ids and a single vote per voter. The content of the
/// ballots is not checked, it is cleaned during tabulation.
///
/// ```
/// use chrono::Utc;
/// use poll_tally::builder::Builder;
/// use poll_tally::{PollSettings, PollErrors};
///
/// let mut builder = Builder::new(&PollSettings::RANKED_CHOICE)?
///     .labels(&["Anna", "Bob"])?;
///
/// builder.add_ranked_vote("v1", &["Anna", "Clara", ""])?;
/// builder.add_ranked_vote("v2", &["Bob", "Anna"])?;
/// builder.add_ranked_vote("v3", &["Anna"])?;
///
/// let snapshot = builder.build_final_results(Utc::now());
/// assert_eq!(snapshot.winner_ids(), &["Anna".to_string()]);
///
/// # Ok::<(), PollErrors>(())
/// ```
pub struct Builder {
    settings: PollSettings,
    options: Vec<PollOption>,
    votes: Vec<VoteDocument>,
    voters: HashSet<String>,
}

impl Builder {
    pub fn new(settings: &PollSettings) -> Result<Builder, PollErrors> {
        Ok(Builder {
            settings: settings.clone(),
            options: Vec::new(),
            votes: Vec::new(),
            voters: HashSet::new(),
        })
    }

    /// Sets the options of the poll. Previously added votes are discarded.
    pub fn options(self, options: &[PollOption]) -> Result<Builder, PollErrors> {
        validate_options(options)?;
        Ok(Builder {
            settings: self.settings,
            options: options.to_vec(),
            votes: Vec::new(),
            voters: HashSet::new(),
        })
    }

    /// Sets the options from their labels. Each label is also the id of
    /// its option, and options are ordered as given.
    pub fn labels(self, labels: &[&str]) -> Result<Builder, PollErrors> {
        let options: Vec<PollOption> = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| PollOption::new(label, label, idx as i64))
            .collect();
        self.options(&options)
    }

    /// Adds a ranked vote, most preferred option first.
    ///
    /// Rankings do not need to be unique, known or non-empty.
    pub fn add_ranked_vote(&mut self, voter_id: &str, rankings: &[&str]) -> Result<(), PollErrors> {
        self.add_vote(&VoteDocument::ranked(voter_id, rankings))
    }

    /// Adds a multiple-choice vote, with an optional write-in.
    pub fn add_selection_vote(
        &mut self,
        voter_id: &str,
        option_ids: &[&str],
        other_text: Option<&str>,
    ) -> Result<(), PollErrors> {
        self.add_vote(&VoteDocument::selection(voter_id, option_ids, other_text))
    }

    pub fn add_vote(&mut self, vote: &VoteDocument) -> Result<(), PollErrors> {
        if !self.voters.insert(vote.voter_id.clone()) {
            return Err(PollErrors::DuplicateVoter(vote.voter_id.clone()));
        }
        self.votes.push(vote.clone());
        Ok(())
    }

    pub fn poll(&self) -> Poll {
        Poll {
            id: None,
            title: None,
            options: self.options.clone(),
            settings: self.settings.clone(),
        }
    }

    pub fn votes(&self) -> &[VoteDocument] {
        &self.votes
    }

    pub fn build_final_results(&self, captured_at: DateTime<Utc>) -> FinalResultsSnapshot {
        build_final_results(&self.poll(), &self.votes, captured_at)
    }
}
