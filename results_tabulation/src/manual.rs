/*!

This is the long-form manual for `results_tabulation` and `resultsrpt`.

## Data model

A contest holds a flat list of result rows. Each row is one count:

| field          | meaning                                                         |
|----------------|-----------------------------------------------------------------|
| `stat`         | the statistic type (`RSTot`, `RSCst`, `RSReg`, ...), mandatory  |
| `group`        | the voting group (`ED`, `MV`, ...), empty for all groups        |
| `party`        | a party tag, empty when the row is not broken down by party     |
| `choice`       | the choice, empty for contest-level counts                      |
| `precinct`     | the precinct, empty for counts that cover the whole contest     |
| `count`        | a non-negative integer                                          |

The votes of a choice are the `RSTot` rows of that choice.

A row with an empty group, party or precinct is the combined count for that dimension.
It is never added to the rows of the same cell that carry a value. For example, with
these rows:

```text
stat   group  choice  precinct  count
RSTot         A       P1        15
RSTot  ED     A       P1        5
RSTot  MV     A       P1        10
RSTot  ED     A       P2        30
```

the votes of `A` are `15 + 30 = 45`, and the election day votes of `A` are `5 + 30 = 35`.
A combined row lower than the sum of its groups is rejected when the contest is built.

The group `TO` is the same as an empty group. The group `IA` (in county) is the sum of
the `ED`, `MV` and `EV` rows of its cell: when present, it is used instead of them.

The votes of a choice count for the party of the choice. Rows tagged with another party
(cross-endorsements) are part of the untagged row of the choice: with these rows,

```text
stat   party  choice  count
RSTot         A       80
RSTot  WFP    A       4
```

`A` has 80 votes, of which 4 count for `WFP` and 76 for the party of `A`.

## Statistic types

| code    | meaning                                            |
|---------|----------------------------------------------------|
| `RSTot` | ballots counted, and the votes of each choice      |
| `RSCst` | ballots cast                                       |
| `RSReg` | registered voters                                  |
| `RSEli` | eligible voters (an estimate)                      |
| `RSTrn` | turnout                                            |
| `RSRej` | rejected ballots                                   |
| `RSUnc` | uncounted ballots                                  |
| `RSWri` | write-in votes                                     |
| `RSUnd` | undervotes                                         |
| `RSOvr` | overvotes                                          |
| `RSExh` | exhausted ballots (ranked-choice rounds)           |

Asking for a statistic that the contest does not declare is an error. A declared
statistic without any row has a total of 0.

## Selectors

Report sections name the rows they display with a selector, a list of words separated
by spaces:

- `CHOICES`: all the choices, in ballot order
- `PARTIES`: all the parties. The parties of the choices come first, in ballot order,
  followed by the parties only found on row tags, in row order.
- `STATS`: all the statistics declared by the contest
- any other word is a choice id, a statistic code or a party (tried in this order)

## Percentages

Percentages are rounded half to even at 0, 1 or 2 decimals (2 by default). A percentage
with a denominator of 0 is displayed as `—`.

## Ranked-choice contests

The rounds are computed upstream. Each round provides the votes of the choices still
running (`null` once a choice is eliminated), the continuing ballots (`RSTot` by default)
and optionally the exhausted ballots (`RSExh`) and the choices elected in that round.

The rounds must be numbered from 1, a choice may not come back after its elimination and
the votes of a round may not exceed its continuing ballots.

All the bars of all the rounds share the same scale: the highest percentage reached by
any choice in any round. The majority line (50%) is only drawn when it fits in that scale.

A contest may be flagged as ranked-choice and have no round yet: it is then displayed
without round tables.

## Approval thresholds

A measure requiring a supermajority declares a threshold (`2/3`, `0.55` or `55%`) and the
choice it applies to (usually `yes`). Its bars are scaled against the total votes and the
threshold line is drawn at `threshold × total votes`, on that choice only. Whether the
measure passed is taken from the results feed.

## Configuration of `resultsrpt`

```json
{
  "outputSettings": {
    "outputDirectory": "out",
    "buildTime": "2024-11-06 21:00",
    "deterministic": true
  },
  "inputs": {
    "election": "election.json",
    "resultFiles": [
      { "provider": "tsv", "filePath": "results.tsv" },
      { "provider": "xlsx", "filePath": "results.xlsx", "worksheetName": "Results" }
    ]
  },
  "report": {
    "summarySelector": "CHOICES",
    "statsSelector": "STATS",
    "detailSelector": "CHOICES RSUnd RSOvr",
    "percentPrecision": 2
  }
}
```

The paths are relative to the configuration file. The result files contain one row per
line with the columns `contest stat group party choice precinct count`, in any order
after a header line.

The program writes in the output directory:
- `summary.json` (English) and `summary-<lang>.json` for each other language
- `results-detail/contest-<id>.tsv`: one line per precinct, then the contest total. The
  columns follow the `detailSelector` of the contest, or of the configuration.
- `SHA256SUMS.txt`: the checksums of all the files above

Without an output directory, the English summary is printed on the standard output.

In deterministic mode, the build time is only taken from the configuration or the command
line and two runs produce identical files.

 */
