use clap::Parser;

/// This is a ranked-pairs (Tideman) election tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// The candidate names, in index order. Ballots refer to candidates by these names.
    #[clap(value_parser, required = true)]
    pub candidates: Vec<String>,

    /// (file path or empty) If specified, the ballots are read from this CSV file instead of
    /// prompting on the standard input. Each row lists candidate names in rank order.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written
    /// in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected summary of the election in JSON
    /// format. If provided, rptally will check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default winningVotes) How the strength of a pairwise victory is measured when sorting
    /// the majority pairs: 'winningVotes' (the raw count of voters preferring the winner) or
    /// 'margin' (winning votes minus opposing votes).
    #[clap(long, value_parser)]
    pub strength: Option<String>,

    /// If passed as an argument, the first column of the CSV input carries the number of
    /// identical ballots in the row instead of a choice.
    #[clap(long, takes_value = false)]
    pub weighted: bool,

    /// (optional) The name of the contest, echoed into the JSON summary.
    #[clap(long, value_parser)]
    pub contest: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
