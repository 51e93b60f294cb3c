use chrono::{TimeZone, Utc};
use poll_tally::builder::Builder;
use poll_tally::*;
use serde_json::{json, Value as JSValue};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ranked_builder() -> Builder {
    let options = vec![
        PollOption::new("c", "Carrot", 0),
        PollOption::new("a", "Apple", 1),
        PollOption::new("b", "Banana", 2),
    ];
    let mut builder = Builder::new(&PollSettings::RANKED_CHOICE)
        .and_then(|b| b.options(&options))
        .unwrap();
    builder.add_ranked_vote("v1", &["a", "b"]).unwrap();
    builder.add_ranked_vote("v2", &["a"]).unwrap();
    builder.add_ranked_vote("v3", &["b", "c"]).unwrap();
    builder.add_ranked_vote("v4", &["c"]).unwrap();
    builder.add_ranked_vote("v5", &["b"]).unwrap();
    builder.add_ranked_vote("v6", &["c", "a"]).unwrap();
    builder.add_ranked_vote("v7", &[]).unwrap();
    builder
}

#[test]
fn ranked_snapshot_json_shape() {
    init();
    let builder = ranked_builder();
    let snapshot = builder.build_final_results(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    let js: JSValue = serde_json::to_value(&snapshot).unwrap();
    let mut js_no_time = js.clone();
    assert!(js_no_time.as_object_mut().unwrap().remove("capturedAt").is_some());

    // Round 1: c 2, a 2, b 2, all tied.
    assert_eq!(
        js_no_time,
        json!({
            "voteType": "ranked-choice",
            "rounds": [
                {"round": 1, "counts": {"c": 2, "a": 2, "b": 2}, "exhausted": 0,
                 "nonExhausted": 6, "eliminatedIds": ["c", "a", "b"]}
            ],
            "winnerIds": [],
            "tiedIds": ["c", "a", "b"],
            "voterCount": 6,
            "exhaustedCount": 0
        })
    );

    // Counts keep the option order in the serialized text.
    let text = serde_json::to_string(&snapshot).unwrap();
    assert!(text.contains(r#""counts":{"c":2,"a":2,"b":2}"#));
    assert!(text.starts_with(r#"{"voteType":"ranked-choice","rounds":"#));

    let back: FinalResultsSnapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn ranked_snapshot_reports_last_round_exhaustion() {
    init();
    let mut builder = ranked_builder();
    builder.add_ranked_vote("v8", &["a", "c"]).unwrap();
    let snapshot = builder.build_final_results(Utc.timestamp_opt(0, 0).unwrap());
    match snapshot {
        FinalResultsSnapshot::RankedChoice(s) => {
            // Round 1: c 2, a 3, b 2 -> c goes first (option order).
            // Round 2: a 4, b 2, with v4 exhausted.
            assert_eq!(s.rounds.len(), 2);
            assert_eq!(s.rounds[0].eliminated_ids, vec!["c".to_string()]);
            assert_eq!(s.winner_ids, vec!["a".to_string()]);
            assert_eq!(s.exhausted_count, 1);
            assert_eq!(s.voter_count, 7);
        }
        x => panic!("unexpected snapshot {:?}", x),
    }
}

#[test]
fn multiple_choice_snapshot_hides_voters() {
    init();
    let settings = PollSettings {
        vote_type: VoteType::MultipleChoice,
        allow_write_in: true,
    };
    let mut builder = Builder::new(&settings)
        .and_then(|b| b.labels(&["pizza", "sushi"]))
        .unwrap();
    builder.add_selection_vote("v1", &["pizza"], None).unwrap();
    builder.add_selection_vote("v2", &[], Some("Tacos")).unwrap();
    builder.add_selection_vote("v3", &[], Some("  ")).unwrap();
    let snapshot = builder.build_final_results(Utc.timestamp_opt(0, 0).unwrap());

    let mut js: JSValue = serde_json::to_value(&snapshot).unwrap();
    js.as_object_mut().unwrap().remove("capturedAt");
    assert_eq!(
        js,
        json!({
            "voteType": "multiple-choice",
            "rows": [
                {"key": "pizza", "label": "pizza", "order": 0, "count": 1, "percentage": 50},
                {"key": "write-in:tacos", "label": "Tacos", "order": 9007199254740991i64,
                 "count": 1, "percentage": 50},
                {"key": "sushi", "label": "sushi", "order": 1, "count": 0, "percentage": 0}
            ],
            "winnerIds": ["pizza", "write-in:tacos"],
            "voterCount": 2
        })
    );
}

#[test]
fn rebuilding_gives_the_same_outcome() {
    init();
    let builder = ranked_builder();
    let first = builder.build_final_results(Utc.timestamp_opt(0, 0).unwrap());
    let second = builder.build_final_results(Utc::now());
    assert!(first.same_outcome(&second));

    let strip = |s: &FinalResultsSnapshot| {
        let mut js = serde_json::to_value(s).unwrap();
        js.as_object_mut().unwrap().remove("capturedAt");
        serde_json::to_string(&js).unwrap()
    };
    assert_eq!(strip(&first), strip(&second));
}
