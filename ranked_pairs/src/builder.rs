pub use crate::config::*;
use crate::run_ranked_pairs;

/// A builder for assembling and running an election.
///
/// ```
/// pub use ranked_pairs::Builder;
/// pub use ranked_pairs::ElectionRules;
/// # use ranked_pairs::ElectionErrors;
///
/// let mut builder = Builder::new(&ElectionRules::DEFAULT_RULES)?
///     .candidates(&["Alice".to_string(), "Bob".to_string()])?;
///
/// builder.add_ballot_weighted(&[0, 1], 2)?;
/// builder.add_ballot(&[1, 0])?;
///
/// let result = builder.tally()?;
/// assert_eq!(result.winner, "Alice");
/// # Ok::<(), ElectionErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: ElectionRules,
    pub(crate) _candidates: Vec<String>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &ElectionRules) -> Result<Builder, ElectionErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
            _ballots: Vec::new(),
        })
    }

    /// Registers the candidate names. Ballot indices refer to positions in
    /// this list.
    pub fn candidates(self, names: &[String]) -> Result<Builder, ElectionErrors> {
        if names.is_empty() {
            return Err(ElectionErrors::EmptyElection);
        }
        if names.len() > self._rules.max_candidates as usize {
            return Err(ElectionErrors::CandidateOverflow {
                count: names.len(),
                capacity: self._rules.max_candidates,
            });
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: names.to_vec(),
            _ballots: self._ballots,
        })
    }

    /// Adds one ballot given as candidate indices, most preferred first.
    ///
    /// It is the simplest use case for most callers.
    pub fn add_ballot(&mut self, ranks: &[u32]) -> Result<(), ElectionErrors> {
        self.add_ballot_weighted(ranks, 1)
    }

    /// Adds a ballot with a weight attached to it, for aggregated inputs.
    pub fn add_ballot_weighted(&mut self, ranks: &[u32], count: u64) -> Result<(), ElectionErrors> {
        self._ballots.push(Ballot {
            ranks: ranks.to_vec(),
            count,
        });
        Ok(())
    }

    /// Adds one ballot given as candidate names, most preferred first. The
    /// names are resolved against the registered candidate list.
    pub fn add_ballot_named(&mut self, ranking: &[String]) -> Result<(), ElectionErrors> {
        let position = self._ballots.len();
        let mut ranks: Vec<u32> = Vec::with_capacity(ranking.len());
        for name in ranking.iter() {
            match self._candidates.iter().position(|c| c == name) {
                Some(idx) => ranks.push(idx as u32),
                None => {
                    return Err(ElectionErrors::InvalidBallot {
                        position,
                        reason: format!("unknown candidate {:?}", name),
                    })
                }
            }
        }
        self.add_ballot_weighted(&ranks, 1)
    }

    /// Runs the tabulation over the ballots added so far.
    pub fn tally(&self) -> Result<ElectionResult, ElectionErrors> {
        run_ranked_pairs(&self._ballots, &self._candidates, &self._rules)
    }
}
