/*!

This is the long-form manual for `poll_tally` and `polltally`.

## Poll export format

`polltally` reads one JSON document holding a poll and all of its vote documents:

```text
{
  "poll": {
    "id": "lunch",
    "title": "Where do we eat?",
    "options": [
      {"id": "a", "label": "Pizza", "order": 0},
      {"id": "b", "label": "Sushi", "order": 1}
    ],
    "settings": {"voteType": "multiple-choice", "allowWriteIn": true}
  },
  "votes": [
    {"voterId": "u1", "optionIds": ["a"]},
    {"voterId": "u2", "optionIds": [], "otherText": "Tacos"}
  ]
}
```

Ranked-choice votes carry `rankings` instead of `optionIds`, most preferred first.
`voteType` is either `ranked-choice` or `multiple-choice`. `allowWriteIn` defaults to `false`.
Option ids must be non-empty and unique, `polltally` refuses the file otherwise.

Vote documents are taken as they are stored and may be stale: unknown, blank or repeated
option ids are dropped while counting. A vote with no rankings, no selected options and no
write-in text (when write-ins are allowed) is treated as not submitted and is ignored.

## Ranked-choice polls

Ranked-choice polls are counted with instant-runoff. In each round, every ballot counts for
its highest-ranked option that is still running. Ballots without such an option are
*exhausted*.

- An option with more than half of the ballots that are not exhausted wins.
- If every option still running has the same count, the poll ends in a tie between them.
- Otherwise, the option with the fewest votes is eliminated. Ties for the fewest votes are
  broken by looking at the previous rounds, latest first, and keeping the options that had
  the fewest votes there. If several options are still tied and their combined votes are below
  the next count up, they are all eliminated at once. Otherwise the first of them, in option
  order, is eliminated.

The count stops after 100 rounds at most. The options still running are then reported as tied.

## Multiple-choice polls

Each selected option counts once per voter. Write-ins, when allowed, are grouped regardless of
case and surrounding spaces (`Tacos`, ` tacos ` and `TACOS` are the same answer) and are
labelled after their first voter.

Percentages are computed against the number of voters, and rounded. Since a voter can pick
several options, percentages may add up to more than 100.

Rows are sorted by count (highest first), then by option order, then by label. Write-ins come
after the predefined options when counts are equal.

## Snapshot format

The result is a JSON snapshot tagged by `voteType`.

Ranked-choice:

```text
{
  "voteType": "ranked-choice",
  "rounds": [
    {"round": 1, "counts": {"a": 2, "b": 1}, "exhausted": 0, "nonExhausted": 3, "eliminatedIds": []}
  ],
  "winnerIds": ["a"],
  "tiedIds": [],
  "voterCount": 3,
  "exhaustedCount": 0,
  "capturedAt": "2024-05-01T12:00:00Z"
}
```

Multiple-choice:

```text
{
  "voteType": "multiple-choice",
  "rows": [
    {"key": "a", "label": "Pizza", "order": 0, "count": 1, "percentage": 50},
    {"key": "write-in:tacos", "label": "Tacos", "order": 9007199254740991, "count": 1, "percentage": 50},
    {"key": "b", "label": "Sushi", "order": 1, "count": 0, "percentage": 0}
  ],
  "winnerIds": ["a", "write-in:tacos"],
  "voterCount": 2,
  "capturedAt": "2024-05-01T12:00:00Z"
}
```

`winnerIds` holds every row with the highest count, or nothing when no vote was cast.
Computing the snapshot twice over the same votes gives the same document, except for
`capturedAt`.

## Command line

```bash
polltally -i lunch.json --out results.json --captured-at 2024-05-01T12:00:00Z
```

- `--reference <file>` compares the result with a previous snapshot (ignoring `capturedAt`)
  and prints the differences.
- `--vote-type` counts the votes with another method than the one configured in the poll.
- `--verbose` prints the details of every round.

 */
