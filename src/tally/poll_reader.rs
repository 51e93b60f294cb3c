use crate::tally::*;

use poll_tally::{Poll, VoteDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

/// A poll, as exported with all of its vote documents.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollExport {
    pub poll: Poll,
    #[serde(default)]
    pub votes: Vec<VoteDocument>,
}

pub fn read_poll_export(path: &str) -> PtResult<PollExport> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let export: PollExport =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!(
        "read_poll_export: {:?}: {:?} options, {:?} vote documents",
        path,
        export.poll.options.len(),
        export.votes.len()
    );
    Ok(export)
}

/// Reads a snapshot for comparison, without the capture time.
pub fn read_reference(path: &str) -> PtResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(without_capture_time(js))
}

pub fn without_capture_time(mut js: JSValue) -> JSValue {
    if let Some(obj) = js.as_object_mut() {
        obj.remove("capturedAt");
    }
    js
}
