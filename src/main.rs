mod args;
mod tally;

use clap::Parser;
use log::LevelFilter;
use snafu::ErrorCompat;

use crate::args::Args;
use crate::tally::{run_poll, TallyRequest};

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let request = TallyRequest {
        input: args.input,
        out: args.out,
        reference: args.reference,
        captured_at: args.captured_at,
        vote_type: args.vote_type,
    };

    if let Err(e) = run_poll(&request) {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("{}", bt);
        }
        std::process::exit(1);
    }
}
