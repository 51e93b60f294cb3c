use log::{debug, info};

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::config::{PollOption, TallyResult, TallyRow, VoteDocument};
use crate::normalize;

/// Largest integer a JSON number holds exactly (2^53 - 1).
///
/// Write-in rows are ordered from here on, after every predefined option.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Counts the selections of a multiple-choice poll.
///
/// Every predefined option gets a row, even without votes. With
/// `allow_write_in`, non-blank `other_text` entries are grouped into extra rows
/// regardless of case and surrounding whitespace; the label of such a row is
/// the text of its first voter.
///
/// Percentages are relative to the number of vote documents, so they may add
/// up to more than 100 when voters select several options.
pub fn tally_multiple_choice(
    options: &[PollOption],
    votes: &[VoteDocument],
    allow_write_in: bool,
) -> TallyResult {
    let total_voters = votes.len() as u64;
    info!(
        "tally_multiple_choice: processing {:?} votes over {:?} options (write-ins: {:?})",
        total_voters,
        options.len(),
        allow_write_in
    );

    let mut rows: Vec<TallyRow> = Vec::new();
    let mut option_rows: HashMap<&str, usize> = HashMap::new();
    for o in options.iter() {
        if o.id.is_empty() || option_rows.contains_key(o.id.as_str()) {
            debug!("tally_multiple_choice: skipping option {:?}", o);
            continue;
        }
        option_rows.insert(o.id.as_str(), rows.len());
        rows.push(TallyRow {
            key: o.id.clone(),
            label: o.label.clone(),
            order: o.order,
            count: 0,
            voter_ids: Vec::new(),
            percentage: 0,
        });
    }
    let valid: HashSet<&str> = option_rows.keys().cloned().collect();

    let mut write_in_rows: HashMap<String, usize> = HashMap::new();
    for vote in votes.iter() {
        if let Some(option_ids) = &vote.option_ids {
            for id in normalize::normalize_selection(option_ids, &valid) {
                if let Some(idx) = option_rows.get(id.as_str()) {
                    let row = &mut rows[*idx];
                    row.count += 1;
                    row.voter_ids.push(vote.voter_id.clone());
                }
            }
        }

        if !allow_write_in {
            continue;
        }
        if let Some(write_in) = normalize::normalize_write_in(vote.other_text.as_deref()) {
            let existing = write_in_rows.get(&write_in.key).copied();
            let idx = match existing {
                Some(idx) => idx,
                None => {
                    let order = MAX_SAFE_INTEGER + write_in_rows.len() as i64;
                    debug!(
                        "tally_multiple_choice: new write-in {:?} from voter {:?}",
                        write_in.key, vote.voter_id
                    );
                    write_in_rows.insert(write_in.key.clone(), rows.len());
                    rows.push(TallyRow {
                        key: write_in.key,
                        label: write_in.label,
                        order,
                        count: 0,
                        voter_ids: Vec::new(),
                        percentage: 0,
                    });
                    rows.len() - 1
                }
            };
            let row = &mut rows[idx];
            row.count += 1;
            row.voter_ids.push(vote.voter_id.clone());
        }
    }

    for row in rows.iter_mut() {
        row.percentage = percentage(row.count, total_voters);
    }
    rows.sort_by(compare_rows);

    TallyResult { rows, total_voters }
}

fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}

// Most votes first, then display order, then label.
fn compare_rows(a: &TallyRow, b: &TallyRow) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.order.cmp(&b.order))
        .then_with(|| a.label.cmp(&b.label))
}
