use log::debug;

use std::collections::BTreeMap;

use crate::config::{BallotTable, Rank};
use crate::weight::VoteWeight;

/// The position of a candidate in the original candidate list.
///
/// Ordering candidate ids is the same as ordering candidates by list order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub(crate) u32);

impl CandidateId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The candidate a ballot currently counts toward.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Support {
    Candidate(CandidateId),
    /// No ranked candidate remains in contention on this ballot.
    Exhausted,
}

/// Weighted vote count per candidate still in contention, in list order.
pub type VoteTally = BTreeMap<CandidateId, VoteWeight>;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    // The row of the ballot in the original table.
    row: usize,
    // Indexed by candidate id. Never modified after construction.
    ranks: Vec<Option<Rank>>,
    weight: VoteWeight,
    support: Support,
}

impl Ballot {
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn rank(&self, cid: CandidateId) -> Option<Rank> {
        self.ranks.get(cid.index()).cloned().flatten()
    }

    pub fn weight(&self) -> VoteWeight {
        self.weight
    }

    pub fn support(&self) -> Support {
        self.support
    }

    pub fn supports(&self, cid: CandidateId) -> bool {
        self.support == Support::Candidate(cid)
    }

    /// The preferred candidate among `columns`. Equal ranks go to the earliest in list order.
    fn first_active(&self, columns: &[CandidateId]) -> Option<CandidateId> {
        columns
            .iter()
            .filter_map(|cid| self.rank(*cid).map(|r| (r, *cid)))
            .min_by_key(|(r, _)| *r)
            .map(|(_, cid)| cid)
    }
}

/// A snapshot of all the ballots still counting, and of the candidates still in contention.
///
/// All the operations return a new ledger: a snapshot handed to a round is never modified.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ledger {
    // The rank columns still present, in list order.
    columns: Vec<CandidateId>,
    ballots: Vec<Ballot>,
}

impl Ledger {
    /// Builds the initial ledger: full weights, blank ballots removed, support computed.
    ///
    /// Returns the number of blank ballots that were removed.
    pub(crate) fn from_table(table: &BallotTable) -> (Ledger, u64) {
        let columns: Vec<CandidateId> = (0..table.candidates.len())
            .map(|idx| CandidateId(idx as u32))
            .collect();
        let ballots: Vec<Ballot> = table
            .rows
            .iter()
            .enumerate()
            .map(|(row, ranks)| Ballot {
                row,
                ranks: ranks.iter().map(|r| r.filter(|x| *x > 0)).collect(),
                weight: VoteWeight::FULL,
                support: Support::Exhausted,
            })
            .collect();
        let (ledger, blanks) = Ledger { columns, ballots }.remove_exhausted();
        debug!(
            "from_table: {} ballots, {} blank ballots removed",
            ledger.len(),
            blanks
        );
        (ledger.recompute_support(), blanks)
    }

    pub fn active_candidates(&self) -> &[CandidateId] {
        &self.columns
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    pub fn supporters(&self, cid: CandidateId) -> impl Iterator<Item = &Ballot> + '_ {
        self.ballots.iter().filter(move |b| b.supports(cid))
    }

    /// Points every ballot to its preferred candidate among the remaining columns.
    pub fn recompute_support(&self) -> Ledger {
        let ballots = self
            .ballots
            .iter()
            .map(|b| Ballot {
                support: match b.first_active(&self.columns) {
                    Some(cid) => Support::Candidate(cid),
                    None => Support::Exhausted,
                },
                ..b.clone()
            })
            .collect();
        Ledger {
            columns: self.columns.clone(),
            ballots,
        }
    }

    /// Drops the ballots that rank none of the remaining columns.
    ///
    /// Returns the number of ballots dropped. They are expired for the rest of the count.
    pub fn remove_exhausted(&self) -> (Ledger, u64) {
        let (kept, dropped): (Vec<&Ballot>, Vec<&Ballot>) = self
            .ballots
            .iter()
            .partition(|b| b.first_active(&self.columns).is_some());
        let ledger = Ledger {
            columns: self.columns.clone(),
            ballots: kept.into_iter().cloned().collect(),
        };
        (ledger, dropped.len() as u64)
    }

    /// The weighted vote count of every remaining column, zero included.
    pub fn weighted_vote_count(&self) -> VoteTally {
        let mut tally: VoteTally = self
            .columns
            .iter()
            .map(|cid| (*cid, VoteWeight::EMPTY))
            .collect();
        for b in self.ballots.iter() {
            if let Support::Candidate(cid) = b.support {
                if let Some(vc) = tally.get_mut(&cid) {
                    *vc += b.weight;
                }
            }
        }
        tally
    }

    /// Removes the rank column of a candidate. The support of the ballots is left as is.
    pub fn withdraw_candidate(&self, cid: CandidateId) -> Ledger {
        Ledger {
            columns: self
                .columns
                .iter()
                .filter(|c| **c != cid)
                .cloned()
                .collect(),
            ballots: self.ballots.clone(),
        }
    }

    /// Drops all the ballots currently supporting `cid`, and returns how many were dropped.
    pub(crate) fn remove_supporters(&self, cid: CandidateId) -> (Ledger, u64) {
        let before = self.ballots.len();
        let ballots: Vec<Ballot> = self
            .ballots
            .iter()
            .filter(|b| !b.supports(cid))
            .cloned()
            .collect();
        let dropped = (before - ballots.len()) as u64;
        (
            Ledger {
                columns: self.columns.clone(),
                ballots,
            },
            dropped,
        )
    }

    /// Overwrites the weight of every selected ballot with `weight`.
    pub(crate) fn revalue<F>(&self, selected: F, weight: VoteWeight) -> Ledger
    where
        F: Fn(&Ballot) -> bool,
    {
        let ballots = self
            .ballots
            .iter()
            .map(|b| {
                if selected(b) {
                    Ballot {
                        weight,
                        ..b.clone()
                    }
                } else {
                    b.clone()
                }
            })
            .collect();
        Ledger {
            columns: self.columns.clone(),
            ballots,
        }
    }

    pub fn total_weight(&self) -> VoteWeight {
        self.ballots.iter().map(|b| b.weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<Option<Rank>>>) -> BallotTable {
        BallotTable {
            candidates: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            rows,
        }
    }

    const A: CandidateId = CandidateId(0);
    const B: CandidateId = CandidateId(1);
    const C: CandidateId = CandidateId(2);

    #[test]
    fn blank_ballots_are_removed_up_front() {
        let (ledger, blanks) = Ledger::from_table(&table(vec![
            vec![Some(1), Some(2), None],
            vec![None, None, None],
            vec![Some(0), None, None],
            vec![None, None, Some(1)],
        ]));
        assert_eq!(blanks, 2);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.ballots()[1].row(), 3);
        assert_eq!(ledger.ballots()[0].support(), Support::Candidate(A));
        assert_eq!(ledger.ballots()[1].support(), Support::Candidate(C));
    }

    #[test]
    fn support_follows_lowest_remaining_rank() {
        let (ledger, _) = Ledger::from_table(&table(vec![vec![Some(2), Some(3), Some(1)]]));
        assert_eq!(ledger.ballots()[0].support(), Support::Candidate(C));

        let without_c = ledger.withdraw_candidate(C);
        // Withdrawing does not touch the support.
        assert_eq!(without_c.ballots()[0].support(), Support::Candidate(C));
        let recomputed = without_c.recompute_support();
        assert_eq!(recomputed.ballots()[0].support(), Support::Candidate(A));
        assert_eq!(recomputed.active_candidates(), &[A, B]);
        // The original snapshot is unchanged.
        assert_eq!(ledger.active_candidates(), &[A, B, C]);
        assert_eq!(ledger.ballots()[0].support(), Support::Candidate(C));
    }

    #[test]
    fn equal_ranks_go_to_list_order() {
        let (ledger, _) = Ledger::from_table(&table(vec![vec![None, Some(1), Some(1)]]));
        assert_eq!(ledger.ballots()[0].support(), Support::Candidate(B));
    }

    #[test]
    fn exhausted_ballots_are_counted() {
        let (ledger, _) = Ledger::from_table(&table(vec![
            vec![Some(1), None, None],
            vec![Some(1), Some(2), None],
            vec![None, Some(1), None],
        ]));
        let (pruned, dropped) = ledger.withdraw_candidate(A).remove_exhausted();
        assert_eq!(dropped, 1);
        assert_eq!(pruned.len(), 2);
    }

    #[test]
    fn vote_count_includes_empty_candidates() {
        let (ledger, _) = Ledger::from_table(&table(vec![
            vec![Some(1), Some(2), None],
            vec![Some(1), None, None],
            vec![Some(2), Some(1), None],
        ]));
        let tally = ledger.weighted_vote_count();
        assert_eq!(tally.get(&A), Some(&VoteWeight::from_count(2)));
        assert_eq!(tally.get(&B), Some(&VoteWeight::from_count(1)));
        assert_eq!(tally.get(&C), Some(&VoteWeight::EMPTY));
        assert_eq!(ledger.total_weight(), VoteWeight::from_count(3));
    }

    #[test]
    fn revalue_and_remove_supporters() {
        let (ledger, _) = Ledger::from_table(&table(vec![
            vec![Some(1), Some(2), None],
            vec![Some(1), None, None],
            vec![Some(2), Some(1), None],
        ]));
        let half = VoteWeight::ratio(1, 2).unwrap();
        let revalued = ledger.revalue(|b| b.supports(A), half);
        assert_eq!(revalued.weighted_vote_count().get(&A), Some(&VoteWeight::FULL));
        assert_eq!(revalued.supporters(B).next().map(|b| b.weight()), Some(VoteWeight::FULL));

        let (rest, dropped) = ledger.remove_supporters(A);
        assert_eq!(dropped, 2);
        assert_eq!(rest.len(), 1);
    }
}
