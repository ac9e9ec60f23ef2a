// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One voter's complete ranking of all the candidates.
///
/// `ranks[0]` is the index of the most preferred candidate. A valid ballot
/// ranks every candidate exactly once.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ballot {
    pub ranks: Vec<u32>,
    /// The number of identical ballots carried by this record. Callers that
    /// work voter by voter use a count of one; aggregated inputs may carry
    /// higher counts.
    pub count: u64,
}

impl Ballot {
    /// A single ballot (count of one) with the given ranking.
    pub fn new(ranks: &[u32]) -> Ballot {
        Ballot {
            ranks: ranks.to_vec(),
            count: 1,
        }
    }
}

// ******** Output data structures *********

/// The outcome of one pairwise contest, in the order the lock phase
/// processed them.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairTally {
    pub winner: String,
    pub loser: String,
    /// Number of voters ranking the winner above the loser.
    pub support: u64,
    /// Number of voters ranking the loser above the winner.
    pub opposition: u64,
    /// False when committing this pair would have closed a cycle.
    pub locked: bool,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionResult {
    pub winner: String,
    pub winner_index: u32,
    /// Total ballot weight processed.
    pub total_ballots: u64,
    /// Every strict-majority pair, strongest first.
    pub pair_tallies: Vec<PairTally>,
    /// `preferences[i][j]` is the number of voters preferring candidate `i`
    /// over candidate `j`.
    pub preferences: Vec<Vec<u64>>,
    /// `locked[i][j]` means candidate `i` is locked in over candidate `j`.
    pub locked: Vec<Vec<bool>>,
}

/// Errors that prevent the tabulation from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ElectionErrors {
    /// No candidates were registered.
    EmptyElection,
    /// More candidates than the rules allow.
    CandidateOverflow { count: usize, capacity: u32 },
    /// The ballot at this position in the input is not a full permutation of
    /// the candidate indices.
    InvalidBallot { position: usize, reason: String },
    /// The lock graph did not end with exactly one undefeated candidate.
    /// This is a defect in cycle detection, not an input condition.
    LockInvariantViolation { sources: usize },
}

impl Error for ElectionErrors {}

impl Display for ElectionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectionErrors::EmptyElection => write!(f, "no candidates in the election"),
            ElectionErrors::CandidateOverflow { count, capacity } => write!(
                f,
                "{} candidates requested but the configured capacity is {}",
                count, capacity
            ),
            ElectionErrors::InvalidBallot { position, reason } => {
                write!(f, "ballot {} is not a valid ranking: {}", position, reason)
            }
            ElectionErrors::LockInvariantViolation { sources } => write!(
                f,
                "lock graph ended with {} source candidates instead of exactly one",
                sources
            ),
        }
    }
}

// ********* Configuration **********

/// How the strength of a pairwise victory is measured when sorting the
/// majority pairs.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum StrengthMode {
    /// The raw number of voters ranking the winner above the loser. This is
    /// the behavior of the reference tabulator and the default.
    WinningVotes,
    /// The conventional ranked-pairs measure: winning votes minus opposing
    /// votes.
    Margin,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionRules {
    pub strength_mode: StrengthMode,
    /// Upper bound on the number of candidates accepted by the tabulation.
    pub max_candidates: u32,
}

impl ElectionRules {
    pub const DEFAULT_RULES: ElectionRules = ElectionRules {
        strength_mode: StrengthMode::WinningVotes,
        max_candidates: 9,
    };
}
