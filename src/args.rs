use clap::Parser;

/// This is a poll finalization program: it tabulates the votes of a poll and
/// prints the final results snapshot.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The poll export in JSON format: the poll definition and all its vote documents.
    /// See the documentation of the poll_tally crate for the format.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (file path, 'stdout' or empty) If specified, the snapshot will be written in JSON format to
    /// the given location. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference snapshot in JSON format. If provided, polltally will check that
    /// the computed snapshot matches the reference, except for the capture time.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (RFC 3339 timestamp, default now) The capture time recorded in the snapshot.
    #[clap(long, value_parser)]
    pub captured_at: Option<String>,

    /// (ranked-choice or multiple-choice) If specified, overrides the vote type configured in the poll.
    #[clap(long, value_parser)]
    pub vote_type: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
