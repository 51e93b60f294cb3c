mod config;
mod multiple_choice;
mod snapshot;

pub mod builder;
pub mod manual;
pub mod normalize;

use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;
pub use crate::multiple_choice::*;
pub use crate::snapshot::*;

/// Upper bound on the number of instant-runoff rounds.
///
/// Every round that does not conclude removes at least one option, so a poll
/// with fewer options than this always finishes on its own. Reaching the
/// bound reports the options still running as tied.
pub const MAX_ROUNDS: u32 = 100;

// **** Private structures ****

type RoundId = u32;

// The counts of one round, before deciding what happens to the options.
struct RoundTally {
    counts: Vec<(String, u64)>,
    exhausted: u64,
    non_exhausted: u64,
}

impl RoundTally {
    fn lowest_count(&self) -> u64 {
        self.counts.iter().map(|(_, c)| *c).min().unwrap_or(0)
    }

    fn into_round(self, round: RoundId, eliminated_ids: Vec<String>) -> Round {
        Round {
            round,
            counts: OptionCounts(self.counts),
            exhausted: self.exhausted,
            non_exhausted: self.non_exhausted,
            eliminated_ids,
        }
    }
}

/// Runs instant-runoff over ranked vote documents.
///
/// Arguments:
/// * `option_ids` the option universe. Blank and repeated ids are ignored; the
/// order of the remaining ids is the order used to break the last ties.
/// * `votes` the vote documents. Each one counts as a ballot, even when its
/// rankings are missing or only name unknown options: such a ballot is
/// exhausted from the first round.
///
/// ```
/// use poll_tally::{tabulate_instant_runoff, VoteDocument};
///
/// let options = vec!["a".to_string(), "b".to_string()];
/// let votes = vec![
///     VoteDocument::ranked("v1", &["a"]),
///     VoteDocument::ranked("v2", &["a"]),
///     VoteDocument::ranked("v3", &["b"]),
/// ];
/// let res = tabulate_instant_runoff(&options, &votes);
/// assert_eq!(res.winner_ids, vec!["a".to_string()]);
/// assert_eq!(res.rounds.len(), 1);
/// ```
pub fn tabulate_instant_runoff(option_ids: &[String], votes: &[VoteDocument]) -> InstantRunoffResult {
    let total_ballots = votes.len() as u64;
    let universe = normalize::option_universe(option_ids);
    info!(
        "tabulate_instant_runoff: processing {:?} ballots, options: {:?}",
        total_ballots, universe
    );

    if universe.is_empty() {
        return InstantRunoffResult {
            rounds: Vec::new(),
            winner_ids: Vec::new(),
            tied_ids: Vec::new(),
            total_ballots,
        };
    }

    let ballots: Vec<Vec<String>> = {
        let valid: HashSet<&str> = universe.iter().map(|s| s.as_str()).collect();
        votes
            .iter()
            .map(|v| match &v.rankings {
                Some(rankings) => normalize::normalize_ranking(rankings, &valid),
                None => Vec::new(),
            })
            .collect()
    };

    // The options still running, in universe order.
    let mut active: Vec<String> = universe;
    let mut rounds: Vec<Round> = Vec::new();

    for round_id in 1..=MAX_ROUNDS {
        let tally = count_round(&ballots, &active);
        debug!(
            "Round {:?}: counts: {:?} exhausted: {:?} non exhausted: {:?}",
            round_id, tally.counts, tally.exhausted, tally.non_exhausted
        );

        let winners = majority_winners(&tally.counts, tally.non_exhausted);
        if !winners.is_empty() {
            info!("Round {:?}: majority reached by {:?}", round_id, winners);
            rounds.push(tally.into_round(round_id, Vec::new()));
            return finish(rounds, winners, Vec::new(), total_ballots);
        }

        let lowest = tally.lowest_count();
        if tally.counts.iter().all(|(_, c)| *c == lowest) {
            info!(
                "Round {:?}: all remaining options tied at {:?}: {:?}",
                round_id, lowest, active
            );
            // Recorded for the audit trail. Nobody is actually removed.
            rounds.push(tally.into_round(round_id, active.clone()));
            return finish(rounds, Vec::new(), active, total_ballots);
        }

        let eliminated = find_eliminated(&tally.counts, &rounds);
        info!("Round {:?}: eliminating {:?}", round_id, eliminated);
        active.retain(|id| !eliminated.contains(id));
        rounds.push(tally.into_round(round_id, eliminated));

        match active.len() {
            1 => {
                info!("Round {:?}: {:?} is the last option running", round_id, active);
                return finish(rounds, active, Vec::new(), total_ballots);
            }
            0 => {
                warn!("Round {:?}: no option left running", round_id);
                return finish(rounds, Vec::new(), Vec::new(), total_ballots);
            }
            _ => {}
        }
    }

    warn!(
        "tabulate_instant_runoff: no decision after {:?} rounds, reporting {:?} as tied",
        MAX_ROUNDS, active
    );
    finish(rounds, Vec::new(), active, total_ballots)
}

fn finish(
    rounds: Vec<Round>,
    winner_ids: Vec<String>,
    tied_ids: Vec<String>,
    total_ballots: u64,
) -> InstantRunoffResult {
    InstantRunoffResult {
        rounds,
        winner_ids,
        tied_ids,
        total_ballots,
    }
}

/// The first option of the ballot that is still running, if any.
fn first_active_choice<'a>(ballot: &'a [String], active: &HashMap<&str, usize>) -> Option<&'a str> {
    ballot
        .iter()
        .map(|id| id.as_str())
        .find(|id| active.contains_key(id))
}

fn count_round(ballots: &[Vec<String>], active: &[String]) -> RoundTally {
    let positions: HashMap<&str, usize> = active
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();
    let mut counts: Vec<(String, u64)> = active.iter().map(|id| (id.clone(), 0)).collect();
    let mut exhausted: u64 = 0;
    let mut non_exhausted: u64 = 0;
    for ballot in ballots.iter() {
        match first_active_choice(ballot, &positions) {
            Some(id) => {
                non_exhausted += 1;
                if let Some(idx) = positions.get(id) {
                    counts[*idx].1 += 1;
                }
            }
            None => {
                exhausted += 1;
            }
        }
    }
    RoundTally {
        counts,
        exhausted,
        non_exhausted,
    }
}

/// The options holding a strict majority of the ballots that are not
/// exhausted. Several options qualify only in degenerate cases; they are all
/// returned, in active order.
fn majority_winners(counts: &[(String, u64)], non_exhausted: u64) -> Vec<String> {
    counts
        .iter()
        .filter(|(_, c)| c * 2 > non_exhausted)
        .map(|(id, _)| id.clone())
        .collect()
}

/// Picks the options to remove after a round that neither found a majority
/// nor ended with every option tied.
///
/// Ties for the lowest count go through three steps:
/// 1. the previous rounds, latest first, keep only the candidates that had
///    the fewest votes in that round;
/// 2. if several remain and even their combined votes stay below the next
///    count up, they are all removed together;
/// 3. otherwise the first remaining candidate in active order is removed.
fn find_eliminated(counts: &[(String, u64)], history: &[Round]) -> Vec<String> {
    let lowest = counts.iter().map(|(_, c)| *c).min().unwrap_or(0);
    let lowest_ids: Vec<&str> = counts
        .iter()
        .filter(|(_, c)| *c == lowest)
        .map(|(id, _)| id.as_str())
        .collect();
    debug!("find_eliminated: lowest count {:?}: {:?}", lowest, lowest_ids);

    if lowest_ids.len() == 1 {
        return vec![lowest_ids[0].to_string()];
    }

    let candidates = narrow_by_previous_rounds(lowest_ids, history);
    if candidates.len() == 1 {
        debug!("find_eliminated: tie resolved by previous rounds: {:?}", candidates);
        return vec![candidates[0].to_string()];
    }

    let next_lowest: Option<u64> = counts.iter().map(|(_, c)| *c).filter(|c| *c > lowest).min();
    let combined = lowest * candidates.len() as u64;
    debug!(
        "find_eliminated: still tied: {:?} combined: {:?} next lowest: {:?}",
        candidates, combined, next_lowest
    );
    match next_lowest {
        Some(next) if combined >= next => {
            let pick = counts
                .iter()
                .map(|(id, _)| id.as_str())
                .find(|id| candidates.contains(id))
                .unwrap_or(candidates[0]);
            vec![pick.to_string()]
        }
        // Merged together they still could not catch up: drop them all.
        _ => candidates.iter().map(|id| id.to_string()).collect(),
    }
}

fn narrow_by_previous_rounds<'a>(candidates: Vec<&'a str>, history: &[Round]) -> Vec<&'a str> {
    let mut remaining = candidates;
    for prior in history.iter().rev() {
        if remaining.len() <= 1 {
            break;
        }
        let count_in = |id: &str| prior.counts.get(id).unwrap_or(0);
        let min_count = remaining.iter().map(|id| count_in(*id)).min().unwrap_or(0);
        remaining.retain(|id| count_in(*id) == min_count);
        debug!(
            "narrow_by_previous_rounds: round {:?} keeps {:?}",
            prior.round, remaining
        );
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(l: &[(&str, u64)]) -> Vec<(String, u64)> {
        l.iter().map(|(id, c)| (id.to_string(), *c)).collect()
    }

    fn round(idx: RoundId, l: &[(&str, u64)]) -> Round {
        Round {
            round: idx,
            counts: OptionCounts(counts(l)),
            exhausted: 0,
            non_exhausted: l.iter().map(|(_, c)| *c).sum(),
            eliminated_ids: Vec::new(),
        }
    }

    #[test]
    fn majority_requires_more_than_half_of_non_exhausted() {
        let c = counts(&[("a", 2), ("b", 2)]);
        assert!(majority_winners(&c, 4).is_empty());
        // Counts above half for several options are all reported.
        assert_eq!(
            majority_winners(&c, 3),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn single_lowest_is_eliminated() {
        let c = counts(&[("a", 3), ("b", 1), ("c", 2)]);
        assert_eq!(find_eliminated(&c, &[]), vec!["b".to_string()]);
    }

    #[test]
    fn previous_rounds_break_ties_latest_first() {
        let c = counts(&[("a", 5), ("b", 2), ("c", 2)]);
        let history = vec![
            round(1, &[("a", 3), ("b", 1), ("c", 2), ("d", 1)]),
            round(2, &[("a", 4), ("b", 2), ("c", 2), ("d", 1)]),
        ];
        // Round 2 does not separate b and c, round 1 does.
        assert_eq!(find_eliminated(&c, &history), vec!["b".to_string()]);
    }

    #[test]
    fn hopeless_ties_are_eliminated_together() {
        let c = counts(&[("a", 5), ("b", 1), ("c", 1), ("d", 3)]);
        assert_eq!(
            find_eliminated(&c, &[]),
            vec!["b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn remaining_ties_fall_back_to_active_order() {
        let c = counts(&[("a", 5), ("c", 2), ("b", 2), ("d", 3)]);
        assert_eq!(find_eliminated(&c, &[]), vec!["c".to_string()]);
    }

    #[test]
    fn first_active_choice_skips_eliminated() {
        let active: HashMap<&str, usize> = [("b", 0), ("c", 1)].into_iter().collect();
        let ballot = vec!["a".to_string(), "c".to_string(), "b".to_string()];
        assert_eq!(first_active_choice(&ballot, &active), Some("c"));
        assert_eq!(first_active_choice(&ballot[..1], &active), None);
    }
}
