/*!

This is the long-form manual for `ranked_pairs` and `rptally`.

## The method

Ranked pairs (also called the Tideman method) elects the candidate who wins
its head-to-head contest against every other candidate once contradictory
majorities have been resolved. The tabulation runs in five phases, each one
completing before the next starts:

1. every ballot is folded into a pairwise preference matrix: `pref[i][j]`
   counts the voters who ranked candidate `i` above candidate `j`;
2. every strict majority (`pref[i][j] > pref[j][i]`) becomes a pair; tied
   matchups produce no pair;
3. the pairs are sorted by decreasing strength of victory, with a stable
   tie-break on the order the pairs were found;
4. each pair is locked into a directed graph in turn; a pair whose edge
   would close a cycle through the already locked edges is skipped;
5. the single candidate with no incoming locked edge is the winner.

Phase 4 performs a full reachability search, not a single-edge test: a
cycle can run through any number of intermediate candidates.

## Input formats

`rptally` collects ballots in two ways.

**Interactive.** With no `--input` flag, the program prompts on the
standard input, one candidate name per rank:

```text
$ rptally Alice Bob Charlie
Number of voters: 2
Rank 1: Alice
Rank 2: Bob
Rank 3: Charlie

Rank 1: Bob
Rank 2: Charlie
Rank 3: Alice

Alice
```

**CSV.** With `--input ballots.csv`, each row is one ballot listing the
candidate names in rank order:

```text
Alice,Bob,Charlie
Bob,Charlie,Alice
```

With `--weighted`, the first column carries the number of identical
ballots in the row:

```text
3,Alice,Bob,Charlie
2,Bob,Charlie,Alice
```

Every ballot must rank every registered candidate exactly once; anything
else aborts the run with an error before tabulation starts.

## Configuration

The strength of a pairwise victory is the raw number of voters preferring
the pair's winner, matching the reference tabulator. Pass
`--strength margin` to sort by the margin of victory (winning votes minus
opposing votes) instead. Note that for tallies built from complete
rankings the two orderings agree; the mode matters when tallies are
assembled or merged from other sources.

The JSON summary written by `--out` contains the winner, every majority
pair with its lock decision, and the final preference matrix and lock
graph. `--reference` compares the summary against a previously recorded
one and fails on any difference.

*/
