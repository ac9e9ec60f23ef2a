mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::ops::{Add, AddAssign};

pub use crate::builder::Builder;
pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

// Invariant: ranks is a permutation of 0..n. Enforced by check_ballots.
#[derive(Eq, PartialEq, Debug, Clone)]
struct CheckedBallot {
    ranks: Vec<CandidateId>,
    count: VoteCount,
}

/// The pairwise tally. `get(i, j)` is the number of voters who ranked
/// candidate `i` above candidate `j`. Owned by the tabulation run and sized
/// at runtime to the actual candidate count.
#[derive(Eq, PartialEq, Debug, Clone)]
struct PreferenceMatrix {
    num_candidates: usize,
    counts: Vec<VoteCount>,
}

impl PreferenceMatrix {
    fn new(num_candidates: usize) -> PreferenceMatrix {
        PreferenceMatrix {
            num_candidates,
            counts: vec![VoteCount::EMPTY; num_candidates * num_candidates],
        }
    }

    fn get(&self, i: CandidateId, j: CandidateId) -> VoteCount {
        self.counts[i.0 as usize * self.num_candidates + j.0 as usize]
    }

    /// Folds one ballot into the tally: every candidate is preferred over
    /// every candidate ranked after it.
    fn record(&mut self, ballot: &CheckedBallot) {
        for (position, winner) in ballot.ranks.iter().enumerate() {
            for loser in ballot.ranks[position + 1..].iter() {
                let idx = winner.0 as usize * self.num_candidates + loser.0 as usize;
                self.counts[idx] += ballot.count;
            }
        }
    }

    fn rows(&self) -> Vec<Vec<u64>> {
        self.counts
            .chunks(self.num_candidates)
            .map(|row| row.iter().map(|vc| vc.0).collect())
            .collect()
    }
}

// Cell-wise sum. Callers that tally partitions of the ballots into local
// matrices reduce them with this before reading any pair off the total.
impl AddAssign<&PreferenceMatrix> for PreferenceMatrix {
    fn add_assign(&mut self, rhs: &PreferenceMatrix) {
        assert_eq!(self.num_candidates, rhs.num_candidates);
        for (cell, arg) in self.counts.iter_mut().zip(rhs.counts.iter()) {
            *cell = *cell + *arg;
        }
    }
}

// Each pair has a winner and a loser.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct Pair {
    winner: CandidateId,
    loser: CandidateId,
}

/// All the strict-majority pairs, in increasing winner index then loser
/// index order. A tied matchup produces no pair in either direction.
fn extract_pairs(prefs: &PreferenceMatrix) -> Vec<Pair> {
    let n = prefs.num_candidates as u32;
    let mut pairs: Vec<Pair> = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let winner = CandidateId(i);
            let loser = CandidateId(j);
            if prefs.get(winner, loser) > prefs.get(loser, winner) {
                pairs.push(Pair { winner, loser });
            }
        }
    }
    pairs
}

fn strength(prefs: &PreferenceMatrix, pair: &Pair, mode: StrengthMode) -> u64 {
    let support = prefs.get(pair.winner, pair.loser).0;
    match mode {
        StrengthMode::WinningVotes => support,
        StrengthMode::Margin => support - prefs.get(pair.loser, pair.winner).0,
    }
}

/// Sorts pairs by decreasing strength of victory. The sort is stable, so
/// pairs of equal strength keep their extraction order and reruns are
/// reproducible.
fn sort_pairs(pairs: &mut [Pair], prefs: &PreferenceMatrix, mode: StrengthMode) {
    pairs.sort_by_key(|pair| std::cmp::Reverse(strength(prefs, pair, mode)));
}

/// The directed graph of locked-in pairs. The edge set is acyclic at every
/// step of the lock phase.
#[derive(Eq, PartialEq, Debug, Clone)]
struct LockGraph {
    num_candidates: usize,
    edges: Vec<bool>,
}

impl LockGraph {
    fn new(num_candidates: usize) -> LockGraph {
        LockGraph {
            num_candidates,
            edges: vec![false; num_candidates * num_candidates],
        }
    }

    fn is_locked(&self, winner: CandidateId, loser: CandidateId) -> bool {
        self.edges[winner.0 as usize * self.num_candidates + loser.0 as usize]
    }

    fn lock(&mut self, pair: &Pair) {
        self.edges[pair.winner.0 as usize * self.num_candidates + pair.loser.0 as usize] = true;
    }

    /// True when `to` can be reached from `from` through one or more locked
    /// edges. A single-hop check is not enough here: committing an edge can
    /// close a cycle that only runs through intermediate candidates.
    fn reaches(&self, from: CandidateId, to: CandidateId) -> bool {
        let mut visited = vec![false; self.num_candidates];
        let mut stack: Vec<CandidateId> = vec![from];
        visited[from.0 as usize] = true;
        while let Some(node) = stack.pop() {
            for next in 0..self.num_candidates as u32 {
                let next_id = CandidateId(next);
                if !self.is_locked(node, next_id) {
                    continue;
                }
                if next_id == to {
                    return true;
                }
                if !visited[next as usize] {
                    visited[next as usize] = true;
                    stack.push(next_id);
                }
            }
        }
        false
    }

    /// Candidates with no incoming locked edge.
    fn sources(&self) -> Vec<CandidateId> {
        (0..self.num_candidates as u32)
            .map(CandidateId)
            .filter(|cid| {
                !(0..self.num_candidates as u32).any(|other| self.is_locked(CandidateId(other), *cid))
            })
            .collect()
    }

    fn rows(&self) -> Vec<Vec<bool>> {
        self.edges.chunks(self.num_candidates).map(|row| row.to_vec()).collect()
    }
}

/// Locks the sorted pairs one by one, skipping any pair whose edge would
/// close a cycle through the already locked edges. Strictly sequential:
/// each decision depends on the graph left behind by all the previous ones.
fn lock_pairs(pairs: &[Pair], graph: &mut LockGraph) -> Vec<(Pair, bool)> {
    let mut decisions: Vec<(Pair, bool)> = Vec::with_capacity(pairs.len());
    for pair in pairs.iter() {
        let closes_cycle = graph.reaches(pair.loser, pair.winner);
        if closes_cycle {
            debug!(
                "lock_pairs: skipping {:?}: the loser already reaches the winner",
                pair
            );
        } else {
            graph.lock(pair);
        }
        decisions.push((*pair, !closes_cycle));
    }
    decisions
}

fn find_winner(graph: &LockGraph) -> Result<CandidateId, ElectionErrors> {
    let sources = graph.sources();
    match sources.as_slice() {
        [winner] => Ok(*winner),
        _ => Err(ElectionErrors::LockInvariantViolation {
            sources: sources.len(),
        }),
    }
}

// Defense in depth: the caller is expected to only hand over full rankings,
// but a malformed ballot would silently corrupt the tally.
fn check_ballots(
    ballots: &[Ballot],
    num_candidates: usize,
) -> Result<Vec<CheckedBallot>, ElectionErrors> {
    let mut checked: Vec<CheckedBallot> = Vec::with_capacity(ballots.len());
    for (position, ballot) in ballots.iter().enumerate() {
        if ballot.ranks.len() != num_candidates {
            return Err(ElectionErrors::InvalidBallot {
                position,
                reason: format!(
                    "{} ranks for {} candidates",
                    ballot.ranks.len(),
                    num_candidates
                ),
            });
        }
        let mut seen = vec![false; num_candidates];
        for &idx in ballot.ranks.iter() {
            match seen.get_mut(idx as usize) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(ElectionErrors::InvalidBallot {
                        position,
                        reason: format!("candidate {} is ranked more than once", idx),
                    })
                }
                None => {
                    return Err(ElectionErrors::InvalidBallot {
                        position,
                        reason: format!("no candidate with index {}", idx),
                    })
                }
            }
        }
        checked.push(CheckedBallot {
            ranks: ballot.ranks.iter().map(|&idx| CandidateId(idx)).collect(),
            count: VoteCount(ballot.count),
        });
    }
    Ok(checked)
}

/// Runs the ranked-pairs tabulation for the given ballots.
///
/// Arguments:
/// * `ballots` the ballots to process; each must rank every candidate
///   exactly once
/// * `candidates` the registered candidate names, in index order
/// * `rules` the rules that govern this election
///
/// The phases run to completion in order: tally, pair extraction, sorting,
/// locking, winner search. The returned result carries the winner along
/// with the final preference matrix and lock graph for reporting.
pub fn run_ranked_pairs(
    ballots: &[Ballot],
    candidates: &[String],
    rules: &ElectionRules,
) -> Result<ElectionResult, ElectionErrors> {
    info!(
        "Processing {:?} ballots, candidates: {:?}, rules: {:?}",
        ballots.len(),
        candidates,
        rules
    );
    if candidates.is_empty() {
        return Err(ElectionErrors::EmptyElection);
    }
    if candidates.len() > rules.max_candidates as usize {
        return Err(ElectionErrors::CandidateOverflow {
            count: candidates.len(),
            capacity: rules.max_candidates,
        });
    }
    let num_candidates = candidates.len();
    for (idx, name) in candidates.iter().enumerate() {
        info!("Candidate: {}: {}", idx, name);
    }

    let checked = check_ballots(ballots, num_candidates)?;
    let total_ballots: VoteCount = checked.iter().map(|ballot| ballot.count).sum();

    // Tally phase. The matrix is frozen once every ballot is recorded.
    let mut prefs = PreferenceMatrix::new(num_candidates);
    for ballot in checked.iter() {
        prefs.record(ballot);
    }
    debug!("run_ranked_pairs: preference matrix: {:?}", prefs);

    let mut pairs = extract_pairs(&prefs);
    info!("Found {:?} majority pairs", pairs.len());
    sort_pairs(&mut pairs, &prefs, rules.strength_mode);
    debug!("run_ranked_pairs: sorted pairs: {:?}", pairs);

    let mut graph = LockGraph::new(num_candidates);
    let decisions = lock_pairs(&pairs, &mut graph);

    let winner = find_winner(&graph)?;
    info!("Winner: {}: {}", winner.0, candidates[winner.0 as usize]);

    let pair_tallies: Vec<PairTally> = decisions
        .iter()
        .map(|(pair, locked)| PairTally {
            winner: candidates[pair.winner.0 as usize].clone(),
            loser: candidates[pair.loser.0 as usize].clone(),
            support: prefs.get(pair.winner, pair.loser).0,
            opposition: prefs.get(pair.loser, pair.winner).0,
            locked: *locked,
        })
        .collect();

    Ok(ElectionResult {
        winner: candidates[winner.0 as usize].clone(),
        winner_index: winner.0,
        total_ballots: total_ballots.0,
        pair_tallies,
        preferences: prefs.rows(),
        locked: graph.rows(),
    })
}
