use log::debug;
use rust_decimal::Decimal;

use std::cmp::Ordering;

use crate::config::BallotTable;
use crate::ledger::CandidateId;

/// The mean of the ranks a candidate received, kept as an exact fraction.
#[derive(Debug, Clone, Copy)]
pub struct AverageRank {
    total: u64,
    count: u64,
}

impl AverageRank {
    pub fn value(&self) -> Decimal {
        Decimal::from(self.total) / Decimal::from(self.count)
    }
}

// Compared as fractions: 2/4 and 1/2 are the same average.
impl Ord for AverageRank {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.total as u128 * other.count as u128;
        let rhs = other.total as u128 * self.count as u128;
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for AverageRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for AverageRank {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AverageRank {}

/// Orders averages from best (lowest) to worst. A candidate that was never ranked comes last.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub(crate) struct AverageKey(Option<AverageRank>);

impl Ord for AverageKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for AverageKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fixed statistics of a candidate over the original ballots, only used to break ties.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateProfile {
    /// None if the candidate was never ranked.
    pub average: Option<AverageRank>,
    /// Element `p - 1` is the number of ballots placing the candidate at rank `p`,
    /// for `p` in 1..=K with K the number of candidates.
    pub rank_counts: Vec<u64>,
}

/// The profiles of all candidates, computed once and never updated.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ProfileIndex {
    profiles: Vec<CandidateProfile>,
}

impl ProfileIndex {
    pub(crate) fn from_table(table: &BallotTable) -> ProfileIndex {
        let num_candidates = table.candidates.len();
        let profiles: Vec<CandidateProfile> = (0..num_candidates)
            .map(|col| {
                let ranks: Vec<u64> = table
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col).cloned().flatten())
                    .filter(|r| *r > 0)
                    .map(|r| r as u64)
                    .collect();
                let average = if ranks.is_empty() {
                    None
                } else {
                    Some(AverageRank {
                        total: ranks.iter().sum(),
                        count: ranks.len() as u64,
                    })
                };
                let mut rank_counts: Vec<u64> = vec![0; num_candidates];
                for r in ranks.iter() {
                    if let Some(c) = rank_counts.get_mut((*r - 1) as usize) {
                        *c += 1;
                    }
                }
                CandidateProfile {
                    average,
                    rank_counts,
                }
            })
            .collect();
        for (name, p) in table.candidates.iter().zip(profiles.iter()) {
            debug!(
                "ProfileIndex: {}: average {:?} rank counts {:?}",
                name,
                p.average.map(|a| a.value()),
                p.rank_counts
            );
        }
        ProfileIndex { profiles }
    }

    pub fn get(&self, cid: CandidateId) -> Option<&CandidateProfile> {
        self.profiles.get(cid.index())
    }

    pub(crate) fn average_key(&self, cid: CandidateId) -> AverageKey {
        AverageKey(self.get(cid).and_then(|p| p.average))
    }

    /// The number of original ballots placing `cid` at the 0-based `position`.
    pub(crate) fn rank_count(&self, cid: CandidateId, position: usize) -> u64 {
        self.get(cid)
            .and_then(|p| p.rank_counts.get(position))
            .cloned()
            .unwrap_or(0)
    }

    pub fn num_positions(&self) -> usize {
        self.profiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ProfileIndex {
        ProfileIndex::from_table(&BallotTable {
            candidates: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            rows: vec![
                vec![Some(1), Some(2), None],
                vec![Some(2), Some(1), None],
                vec![Some(1), Some(4), None],
                vec![None, None, None],
            ],
        })
    }

    #[test]
    fn averages_are_exact() {
        let idx = index();
        let a = idx.get(CandidateId(0)).unwrap().average.unwrap();
        let b = idx.get(CandidateId(1)).unwrap().average.unwrap();
        // 4/3 and 7/3
        assert!(a < b);
        assert_eq!(a, AverageRank { total: 8, count: 6 });
        assert_eq!(idx.get(CandidateId(2)).unwrap().average, None);
    }

    #[test]
    fn never_ranked_sorts_last() {
        let idx = index();
        assert!(idx.average_key(CandidateId(1)) < idx.average_key(CandidateId(2)));
        assert!(idx.average_key(CandidateId(0)) < idx.average_key(CandidateId(1)));
    }

    #[test]
    fn rank_counts_ignore_positions_beyond_candidates() {
        let idx = index();
        assert_eq!(idx.get(CandidateId(0)).unwrap().rank_counts, vec![2, 1, 0]);
        // The rank 4 given to B has no position.
        assert_eq!(idx.get(CandidateId(1)).unwrap().rank_counts, vec![1, 1, 0]);
        assert_eq!(idx.rank_count(CandidateId(2), 0), 0);
        assert_eq!(idx.num_positions(), 3);
    }
}
