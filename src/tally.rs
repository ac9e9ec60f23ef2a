use log::{debug, info, warn};

use ranked_pairs::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

#[derive(Debug, Snafu)]
pub enum TallyError {
    #[snafu(display("Error opening ballot file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading ballot file at line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display(""))]
    OpeningJson { source: std::io::Error },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error prompting for votes"))]
    PromptIo { source: std::io::Error },
    #[snafu(display("Ballot {position}: {name:?} is not a registered candidate"))]
    UnknownCandidate { position: usize, name: String },
    #[snafu(display("Voting error: {source}"))]
    Voting { source: ElectionErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TallyResult<T> = Result<T, TallyError>;

/// A ballot as parsed from an input source, before name resolution.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub count: Option<u64>,
    pub choices: Vec<String>,
}

pub mod csv_reader {
    use crate::tally::*;

    /// Reads ballots from a CSV file. Each row lists candidate names in
    /// rank order. With `weighted`, the first column carries the number of
    /// identical ballots in the row.
    pub fn read_csv_ballots(path: &str, weighted: bool) -> TallyResult<Vec<ParsedBallot>> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .context(CsvOpenSnafu {
                path: path.to_string(),
            })?;
        read_ballot_records(rdr.into_records(), weighted)
    }

    pub fn read_ballot_records<R: std::io::Read>(
        records: csv::StringRecordsIntoIter<R>,
        weighted: bool,
    ) -> TallyResult<Vec<ParsedBallot>> {
        let mut res: Vec<ParsedBallot> = Vec::new();
        for (idx, line_r) in records.enumerate() {
            let lineno = idx + 1;
            let line = line_r.context(CsvLineParseSnafu { lineno })?;
            debug!("read_ballot_records: line {:?}: {:?}", lineno, line);
            let mut cells = line.iter();
            let count: Option<u64> = if weighted {
                let cell = match cells.next() {
                    Some(c) => c,
                    None => whatever!("Missing count column at line {}", lineno),
                };
                match cell.trim().parse::<u64>() {
                    Ok(x) => Some(x),
                    Err(_) => whatever!("Invalid ballot count {:?} at line {}", cell, lineno),
                }
            } else {
                Some(1)
            };
            let choices: Vec<String> = cells
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            res.push(ParsedBallot { count, choices });
        }
        Ok(res)
    }
}

pub mod interactive {
    use crate::tally::*;
    use std::io::{BufRead, Write};

    /// Collects ballots on the terminal: the number of voters first, then
    /// one candidate name per rank for each voter.
    pub fn prompt_ballots(candidates: &[String]) -> TallyResult<Vec<ParsedBallot>> {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        read_prompted_ballots(&mut input, &mut output, candidates)
    }

    pub fn read_prompted_ballots<R: BufRead, W: Write>(
        input: &mut R,
        output: &mut W,
        candidates: &[String],
    ) -> TallyResult<Vec<ParsedBallot>> {
        let voter_count = prompt_number(input, output, "Number of voters: ")?;
        let mut res: Vec<ParsedBallot> = Vec::new();
        for _ in 0..voter_count {
            let mut choices: Vec<String> = Vec::new();
            for rank in 0..candidates.len() {
                let prompt = format!("Rank {}: ", rank + 1);
                choices.push(prompt_line(input, output, prompt.as_str())?);
            }
            writeln!(output).context(PromptIoSnafu {})?;
            res.push(ParsedBallot {
                count: Some(1),
                choices,
            });
        }
        Ok(res)
    }

    fn prompt_line<R: BufRead, W: Write>(
        input: &mut R,
        output: &mut W,
        prompt: &str,
    ) -> TallyResult<String> {
        write!(output, "{}", prompt).context(PromptIoSnafu {})?;
        output.flush().context(PromptIoSnafu {})?;
        let mut line = String::new();
        let read = input.read_line(&mut line).context(PromptIoSnafu {})?;
        if read == 0 {
            whatever!("Unexpected end of input while prompting for votes");
        }
        Ok(line.trim().to_string())
    }

    fn prompt_number<R: BufRead, W: Write>(
        input: &mut R,
        output: &mut W,
        prompt: &str,
    ) -> TallyResult<u64> {
        let line = prompt_line(input, output, prompt)?;
        match line.parse::<u64>() {
            Ok(x) => Ok(x),
            Err(_) => whatever!("Invalid number of voters: {:?}", line),
        }
    }
}

/// Resolves parsed ballots to candidate indices. Every choice must name a
/// registered candidate; the permutation invariant itself is re-checked by
/// the tabulation.
pub fn resolve_ballots(
    parsed: &[ParsedBallot],
    candidates: &[String],
) -> TallyResult<Vec<Ballot>> {
    let mut res: Vec<Ballot> = Vec::new();
    for (position, pb) in parsed.iter().enumerate() {
        if pb.choices.is_empty() {
            debug!("resolve_ballots: skipping empty ballot {:?}", position);
            continue;
        }
        let mut ranks: Vec<u32> = Vec::with_capacity(pb.choices.len());
        for name in pb.choices.iter() {
            let idx = candidates
                .iter()
                .position(|c| c == name)
                .context(UnknownCandidateSnafu {
                    position,
                    name: name.clone(),
                })?;
            ranks.push(idx as u32);
        }
        let count = pb.count.unwrap_or(1);
        if count > 0 {
            res.push(Ballot { ranks, count });
        }
    }
    Ok(res)
}

fn validate_rules(strength: &Option<String>) -> TallyResult<ElectionRules> {
    let strength_mode = match strength.as_deref() {
        None | Some("winningVotes") => StrengthMode::WinningVotes,
        Some("margin") => StrengthMode::Margin,
        Some(x) => {
            whatever!(
                "Cannot use strength mode {:?} (expected winningVotes or margin)",
                x
            )
        }
    };
    Ok(ElectionRules {
        strength_mode,
        ..ElectionRules::DEFAULT_RULES
    })
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub candidates: Vec<String>,
    pub strength: String,
}

fn result_to_json(result: &ElectionResult) -> JSValue {
    let pairs: Vec<JSValue> = result
        .pair_tallies
        .iter()
        .map(|pt| {
            json!({
                "winner": pt.winner,
                "loser": pt.loser,
                "support": pt.support,
                "opposition": pt.opposition,
                "locked": pt.locked,
            })
        })
        .collect();
    json!({
        "winner": result.winner,
        "winnerIndex": result.winner_index,
        "totalBallots": result.total_ballots,
        "pairs": pairs,
        "preferences": result.preferences,
        "locked": result.locked,
    })
}

fn build_summary_js(args: &Args, rules: &ElectionRules, result: &ElectionResult) -> JSValue {
    let c = OutputConfig {
        contest: args
            .contest
            .clone()
            .unwrap_or_else(|| "Ranked pairs election".to_string()),
        candidates: args.candidates.clone(),
        strength: match rules.strength_mode {
            StrengthMode::WinningVotes => "winningVotes".to_string(),
            StrengthMode::Margin => "margin".to_string(),
        },
    };
    json!({
        "config": c,
        "results": result_to_json(result)
    })
}

fn read_summary(path: &str) -> TallyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn run_tally(args: &Args) -> TallyResult<()> {
    let candidates = &args.candidates;
    for (idx, name) in candidates.iter().enumerate() {
        if candidates[..idx].contains(name) {
            whatever!("Duplicate candidate name {:?}", name);
        }
    }
    let rules = validate_rules(&args.strength)?;

    let parsed = match &args.input {
        Some(path) => csv_reader::read_csv_ballots(path.as_str(), args.weighted)?,
        None => interactive::prompt_ballots(candidates)?,
    };
    info!("Collected {:?} ballots", parsed.len());

    let ballots = resolve_ballots(&parsed, candidates)?;
    let result = run_ranked_pairs(&ballots, candidates, &rules).context(VotingSnafu {})?;

    println!("{}", result.winner);

    let summary = build_summary_js(args, &rules, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
    match args.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => fs::write(path, &pretty_js_stats).context(WritingJsonSnafu {
            path: path.to_string(),
        })?,
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &args.reference {
        let summary_ref = read_summary(reference_p.as_str())?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_str(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn args_for(candidates: &[&str]) -> Args {
        Args {
            candidates: names(candidates),
            input: None,
            out: None,
            reference: None,
            strength: None,
            weighted: false,
            contest: Some("test contest".to_string()),
            verbose: false,
        }
    }

    fn parse_csv(data: &str, weighted: bool) -> TallyResult<Vec<ParsedBallot>> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(data.as_bytes());
        csv_reader::read_ballot_records(rdr.into_records(), weighted)
    }

    #[test]
    fn reads_plain_csv() {
        let parsed = parse_csv("Alice,Bob,Charlie\nBob,Charlie,Alice\n", false).unwrap();
        assert_eq!(
            parsed,
            vec![
                ParsedBallot {
                    count: Some(1),
                    choices: names(&["Alice", "Bob", "Charlie"])
                },
                ParsedBallot {
                    count: Some(1),
                    choices: names(&["Bob", "Charlie", "Alice"])
                },
            ]
        );
    }

    #[test]
    fn reads_weighted_csv() {
        let parsed = parse_csv("3,Alice,Bob\n2,Bob,Alice\n", true).unwrap();
        assert_eq!(parsed[0].count, Some(3));
        assert_eq!(parsed[0].choices, names(&["Alice", "Bob"]));
        assert_eq!(parsed[1].count, Some(2));
    }

    #[test]
    fn rejects_bad_weight() {
        let res = parse_csv("x,Alice,Bob\n", true);
        assert!(res.is_err());
    }

    #[test]
    fn resolves_names_and_skips_blank_rows() {
        let parsed = vec![
            ParsedBallot {
                count: Some(2),
                choices: names(&["Bob", "Alice"]),
            },
            ParsedBallot {
                count: Some(1),
                choices: vec![],
            },
        ];
        let ballots = resolve_ballots(&parsed, &names(&["Alice", "Bob"])).unwrap();
        assert_eq!(
            ballots,
            vec![Ballot {
                ranks: vec![1, 0],
                count: 2
            }]
        );
    }

    #[test]
    fn rejects_unknown_candidate() {
        let parsed = vec![ParsedBallot {
            count: Some(1),
            choices: names(&["Alice", "Dave"]),
        }];
        let res = resolve_ballots(&parsed, &names(&["Alice", "Bob"]));
        match res {
            Err(TallyError::UnknownCandidate { position: 0, name }) => assert_eq!(name, "Dave"),
            x => panic!("expected UnknownCandidate, got {:?}", x),
        }
    }

    #[test]
    fn validates_strength_modes() {
        assert_eq!(
            validate_rules(&None).unwrap().strength_mode,
            StrengthMode::WinningVotes
        );
        assert_eq!(
            validate_rules(&Some("winningVotes".to_string()))
                .unwrap()
                .strength_mode,
            StrengthMode::WinningVotes
        );
        assert_eq!(
            validate_rules(&Some("margin".to_string()))
                .unwrap()
                .strength_mode,
            StrengthMode::Margin
        );
        assert!(validate_rules(&Some("strongest".to_string())).is_err());
    }

    #[test]
    fn prompts_for_each_rank() {
        let candidates = names(&["Alice", "Bob", "Charlie"]);
        let mut input = Cursor::new("2\nAlice\nBob\nCharlie\nBob\nCharlie\nAlice\n");
        let mut output: Vec<u8> = Vec::new();
        let parsed =
            interactive::read_prompted_ballots(&mut input, &mut output, &candidates).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].choices, names(&["Alice", "Bob", "Charlie"]));
        assert_eq!(parsed[1].choices, names(&["Bob", "Charlie", "Alice"]));
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.starts_with("Number of voters: "));
        assert!(transcript.contains("Rank 3: "));
    }

    #[test]
    fn prompt_rejects_bad_voter_count() {
        let candidates = names(&["Alice", "Bob"]);
        let mut input = Cursor::new("several\n");
        let mut output: Vec<u8> = Vec::new();
        let res = interactive::read_prompted_ballots(&mut input, &mut output, &candidates);
        assert!(res.is_err());
    }

    #[test]
    fn summary_carries_winner_and_pairs() {
        let args = args_for(&["Alice", "Bob", "Charlie"]);
        let rules = validate_rules(&args.strength).unwrap();
        let data = "Alice,Bob,Charlie\nAlice,Bob,Charlie\nAlice,Bob,Charlie\n\
                    Bob,Charlie,Alice\nBob,Charlie,Alice\nCharlie,Alice,Bob\n";
        let parsed = parse_csv(data, false).unwrap();
        let ballots = resolve_ballots(&parsed, &args.candidates).unwrap();
        let result = run_ranked_pairs(&ballots, &args.candidates, &rules).unwrap();
        let js = build_summary_js(&args, &rules, &result);

        assert_eq!(js["config"]["contest"], "test contest");
        assert_eq!(js["config"]["strength"], "winningVotes");
        assert_eq!(js["results"]["winner"], "Alice");
        assert_eq!(js["results"]["totalBallots"], 6);
        let pairs = js["results"]["pairs"].as_array().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0]["winner"], "Bob");
        assert_eq!(pairs[0]["support"], 5);
        assert_eq!(pairs[0]["locked"], true);
    }
}
