//! Cleaning of raw ballots against the set of valid options.
//!
//! Ballots come from clients that may be stale or buggy. Nothing in here
//! fails: unknown, blank or repeated entries are dropped.

use std::collections::HashSet;

use log::debug;

use crate::config::VoteDocument;

/// Prefix of the keys synthesized for write-in rows.
pub const WRITE_IN_KEY_PREFIX: &str = "write-in:";

/// The option universe: non-empty ids, first occurrence kept, in the
/// original order.
pub fn option_universe(option_ids: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for id in option_ids.iter() {
        if !id.is_empty() && seen.insert(id.as_str()) {
            res.push(id.clone());
        }
    }
    res
}

fn clean_ids(raw: &[String], valid: &HashSet<&str>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for entry in raw.iter() {
        let id = entry.trim();
        if id.is_empty() || !valid.contains(id) {
            continue;
        }
        // Later mentions of the same option are dropped, not promoted.
        if seen.insert(id) {
            res.push(id.to_string());
        }
    }
    if res.len() != raw.len() {
        debug!("clean_ids: kept {:?} out of {:?}", res, raw);
    }
    res
}

/// Cleans a ranked ballot. The result keeps the voter's order of preference.
pub fn normalize_ranking(rankings: &[String], valid: &HashSet<&str>) -> Vec<String> {
    clean_ids(rankings, valid)
}

/// Cleans a multiple-choice selection. Each valid option appears at most once.
/// The order is the order of first mention, which is not meaningful for
/// tallying but keeps the output stable.
pub fn normalize_selection(option_ids: &[String], valid: &HashSet<&str>) -> Vec<String> {
    clean_ids(option_ids, valid)
}

/// A consolidated write-in: `key` groups equivalent texts regardless of case
/// and surrounding whitespace, `label` is the trimmed text as typed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WriteIn {
    pub key: String,
    pub label: String,
}

pub fn normalize_write_in(other_text: Option<&str>) -> Option<WriteIn> {
    let label = other_text?.trim();
    if label.is_empty() {
        return None;
    }
    Some(WriteIn {
        key: format!("{}{}", WRITE_IN_KEY_PREFIX, label.to_lowercase()),
        label: label.to_string(),
    })
}

/// Whether a vote document holds an actual submission.
///
/// Documents with no rankings, no selected options and (when write-ins are
/// allowed) no write-in text are placeholders and are not counted anywhere.
pub fn is_submitted(vote: &VoteDocument, allow_write_in: bool) -> bool {
    let has_rankings = vote.rankings.as_ref().map_or(false, |r| !r.is_empty());
    let has_selection = vote.option_ids.as_ref().map_or(false, |o| !o.is_empty());
    let has_write_in = allow_write_in && normalize_write_in(vote.other_text.as_deref()).is_some();
    has_rankings || has_selection || has_write_in
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ranking_drops_unknown_blank_and_repeats() {
        let valid: HashSet<&str> = ["a", "b", "c"].into_iter().collect();
        let raw = strings(&["b", "", "zz", " a ", "b", "c", "a"]);
        assert_eq!(normalize_ranking(&raw, &valid), strings(&["b", "a", "c"]));
    }

    #[test]
    fn universe_keeps_first_occurrence() {
        let ids = strings(&["x", "", "y", "x", "z"]);
        assert_eq!(option_universe(&ids), strings(&["x", "y", "z"]));
    }

    #[test]
    fn write_in_folds_case_and_whitespace() {
        let w1 = normalize_write_in(Some(" Tacos ")).unwrap();
        let w2 = normalize_write_in(Some("TACOS")).unwrap();
        assert_eq!(w1.key, "write-in:tacos");
        assert_eq!(w1.key, w2.key);
        assert_eq!(w1.label, "Tacos");
        assert_eq!(normalize_write_in(Some("   ")), None);
        assert_eq!(normalize_write_in(None), None);
    }

    #[test]
    fn placeholder_votes_are_not_submitted() {
        let empty = VoteDocument {
            voter_id: "v".to_string(),
            rankings: Some(vec![]),
            option_ids: None,
            other_text: Some("  ".to_string()),
        };
        assert!(!is_submitted(&empty, true));

        let write_in_only = VoteDocument::selection("v", &[], Some("pizza"));
        assert!(is_submitted(&write_in_only, true));
        assert!(!is_submitted(&write_in_only, false));

        // Stale option ids still count as a submission; they only exhaust.
        assert!(is_submitted(&VoteDocument::ranked("v", &["gone"]), false));
    }
}
