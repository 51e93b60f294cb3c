// ********* Input data structures ***********

use std::collections::HashSet;
use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One of the predefined answers of a poll.
///
/// `order` is the display rank of the option. It is also used to break ties
/// when sorting multiple-choice rows, and does not need to be contiguous.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub order: i64,
}

impl PollOption {
    pub fn new(id: &str, label: &str, order: i64) -> PollOption {
        PollOption {
            id: id.to_string(),
            label: label.to_string(),
            order,
        }
    }
}

/// A vote document, as stored for one voter.
///
/// The content is untrusted: option ids may be stale, blank or repeated.
/// Ranked polls read `rankings` (most preferred first), multiple-choice polls
/// read `option_ids` and, when write-ins are allowed, `other_text`.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteDocument {
    #[serde(rename = "voterId")]
    pub voter_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rankings: Option<Vec<String>>,
    #[serde(rename = "optionIds", default, skip_serializing_if = "Option::is_none")]
    pub option_ids: Option<Vec<String>>,
    #[serde(rename = "otherText", default, skip_serializing_if = "Option::is_none")]
    pub other_text: Option<String>,
}

impl VoteDocument {
    pub fn ranked(voter_id: &str, rankings: &[&str]) -> VoteDocument {
        VoteDocument {
            voter_id: voter_id.to_string(),
            rankings: Some(rankings.iter().map(|s| s.to_string()).collect()),
            ..VoteDocument::default()
        }
    }

    pub fn selection(voter_id: &str, option_ids: &[&str], other_text: Option<&str>) -> VoteDocument {
        VoteDocument {
            voter_id: voter_id.to_string(),
            option_ids: Some(option_ids.iter().map(|s| s.to_string()).collect()),
            other_text: other_text.map(|s| s.to_string()),
            ..VoteDocument::default()
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum VoteType {
    #[serde(rename = "ranked-choice")]
    RankedChoice,
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
}

impl Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteType::RankedChoice => write!(f, "ranked-choice"),
            VoteType::MultipleChoice => write!(f, "multiple-choice"),
        }
    }
}

impl FromStr for VoteType {
    type Err = PollErrors;

    fn from_str(s: &str) -> Result<VoteType, PollErrors> {
        match s {
            "ranked-choice" => Ok(VoteType::RankedChoice),
            "multiple-choice" => Ok(VoteType::MultipleChoice),
            x => Err(PollErrors::UnknownVoteType(x.to_string())),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    #[serde(rename = "voteType")]
    pub vote_type: VoteType,
    #[serde(rename = "allowWriteIn", default)]
    pub allow_write_in: bool,
}

impl PollSettings {
    pub const RANKED_CHOICE: PollSettings = PollSettings {
        vote_type: VoteType::RankedChoice,
        allow_write_in: false,
    };

    pub const MULTIPLE_CHOICE: PollSettings = PollSettings {
        vote_type: VoteType::MultipleChoice,
        allow_write_in: false,
    };
}

/// The definition of a poll: its options and how its votes are counted.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub options: Vec<PollOption>,
    pub settings: PollSettings,
}

impl Poll {
    /// The option ids, in the order of definition.
    pub fn option_ids(&self) -> Vec<String> {
        self.options.iter().map(|o| o.id.clone()).collect()
    }

    /// Checks the preconditions that the caller is responsible for: every
    /// option has a non-blank id, and no id is used twice.
    pub fn validate(&self) -> Result<(), PollErrors> {
        validate_options(&self.options)
    }
}

pub(crate) fn validate_options(options: &[PollOption]) -> Result<(), PollErrors> {
    let mut seen: HashSet<&str> = HashSet::new();
    for o in options.iter() {
        if o.id.trim().is_empty() {
            return Err(PollErrors::EmptyOptionId);
        }
        if !seen.insert(o.id.as_str()) {
            return Err(PollErrors::DuplicateOptionId(o.id.clone()));
        }
    }
    Ok(())
}

// ******** Output data structures *********

/// Vote counts per option, in the order of the options that were active
/// when the counts were taken.
///
/// Serialized as a JSON object whose keys keep that order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct OptionCounts(pub Vec<(String, u64)>);

impl OptionCounts {
    pub fn get(&self, option_id: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(id, _)| id == option_id)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, u64)> {
        self.0.iter()
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, count)| *count).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for OptionCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, count) in self.0.iter() {
            map.serialize_entry(id, count)?;
        }
        map.end()
    }
}

struct OptionCountsVisitor;

impl<'de> Visitor<'de> for OptionCountsVisitor {
    type Value = OptionCounts;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a map from option id to vote count")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<OptionCounts, A::Error> {
        let mut counts: Vec<(String, u64)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((id, count)) = access.next_entry::<String, u64>()? {
            counts.push((id, count));
        }
        Ok(OptionCounts(counts))
    }
}

impl<'de> Deserialize<'de> for OptionCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<OptionCounts, D::Error> {
        deserializer.deserialize_map(OptionCountsVisitor)
    }
}

/// Statistics for one round of instant-runoff.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub round: u32,
    pub counts: OptionCounts,
    pub exhausted: u64,
    #[serde(rename = "nonExhausted")]
    pub non_exhausted: u64,
    #[serde(rename = "eliminatedIds")]
    pub eliminated_ids: Vec<String>,
}

/// The outcome of an instant-runoff tabulation.
///
/// At most one of `winner_ids` and `tied_ids` is non-empty. Both are empty
/// only when there was no option to count.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InstantRunoffResult {
    pub rounds: Vec<Round>,
    #[serde(rename = "winnerIds")]
    pub winner_ids: Vec<String>,
    #[serde(rename = "tiedIds")]
    pub tied_ids: Vec<String>,
    #[serde(rename = "totalBallots")]
    pub total_ballots: u64,
}

/// One line of a multiple-choice tally: a predefined option or a
/// consolidated write-in.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyRow {
    pub key: String,
    pub label: String,
    pub order: i64,
    pub count: u64,
    #[serde(rename = "voterIds")]
    pub voter_ids: Vec<String>,
    pub percentage: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyResult {
    pub rows: Vec<TallyRow>,
    #[serde(rename = "totalVoters")]
    pub total_voters: u64,
}

/// Errors for inputs that break the caller's preconditions.
///
/// The tabulation itself never fails on ballot content.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PollErrors {
    EmptyOptionId,
    DuplicateOptionId(String),
    DuplicateVoter(String),
    UnknownVoteType(String),
}

impl Error for PollErrors {}

impl Display for PollErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollErrors::EmptyOptionId => write!(f, "an option has an empty id"),
            PollErrors::DuplicateOptionId(id) => write!(f, "option id {:?} is used more than once", id),
            PollErrors::DuplicateVoter(id) => write!(f, "voter {:?} already has a vote", id),
            PollErrors::UnknownVoteType(s) => write!(
                f,
                "unknown vote type {:?} (expected ranked-choice or multiple-choice)",
                s
            ),
        }
    }
}
