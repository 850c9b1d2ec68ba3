use log::debug;

use crate::config::{TieBreakKind, TieBreakStage};
use crate::ledger::CandidateId;
use crate::profile::ProfileIndex;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub(crate) struct Resolution {
    pub chosen: CandidateId,
    pub decided_by: TieBreakStage,
}

/// Picks one candidate out of a pool of candidates tied on their vote count.
///
/// The cascade is the same for both kinds of decisions:
/// 1. average rank: the lowest average is favored. An election picks among the lowest
///    averages, an elimination among the highest (a never-ranked candidate is the worst);
/// 2. rank positions 1..K in order: the most ballots at that position for an election,
///    the fewest for an elimination;
/// 3. candidate list order: the first listed is elected, the last listed is eliminated.
///
/// Returns None only if the pool is empty.
pub(crate) fn resolve(
    pool: &[CandidateId],
    kind: TieBreakKind,
    index: &ProfileIndex,
) -> Option<Resolution> {
    let mut remaining: Vec<CandidateId> = pool.to_vec();
    remaining.sort();
    remaining.dedup();

    match remaining.as_slice() {
        [] => return None,
        [cid] => {
            return Some(Resolution {
                chosen: *cid,
                decided_by: TieBreakStage::NoTie,
            })
        }
        _ => {}
    }

    // Average rank
    let keys = remaining.iter().map(|cid| index.average_key(*cid));
    let target = match kind {
        TieBreakKind::Elect => keys.min(),
        TieBreakKind::Eliminate => keys.max(),
    };
    remaining.retain(|cid| Some(index.average_key(*cid)) == target);
    debug!("resolve: {:?} after average rank: {:?}", kind, remaining);
    if let [cid] = remaining.as_slice() {
        return Some(Resolution {
            chosen: *cid,
            decided_by: TieBreakStage::AverageRank,
        });
    }

    // Rank positions
    for position in 0..index.num_positions() {
        let counts = remaining.iter().map(|cid| index.rank_count(*cid, position));
        let target = match kind {
            TieBreakKind::Elect => counts.max(),
            TieBreakKind::Eliminate => counts.min(),
        };
        remaining.retain(|cid| Some(index.rank_count(*cid, position)) == target);
        if let [cid] = remaining.as_slice() {
            debug!(
                "resolve: {:?} decided at rank position {}: {:?}",
                kind,
                position + 1,
                cid
            );
            return Some(Resolution {
                chosen: *cid,
                decided_by: TieBreakStage::RankPosition((position + 1) as u32),
            });
        }
    }

    // Candidate order
    debug!("resolve: {:?} falling back to list order: {:?}", kind, remaining);
    let chosen = match kind {
        TieBreakKind::Elect => remaining.first(),
        TieBreakKind::Eliminate => remaining.last(),
    };
    chosen.map(|cid| Resolution {
        chosen: *cid,
        decided_by: TieBreakStage::CandidateOrder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BallotTable;

    fn index(rows: Vec<Vec<Option<u32>>>) -> ProfileIndex {
        ProfileIndex::from_table(&BallotTable {
            candidates: vec![
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ],
            rows,
        })
    }

    const A: CandidateId = CandidateId(0);
    const B: CandidateId = CandidateId(1);
    const C: CandidateId = CandidateId(2);
    const D: CandidateId = CandidateId(3);

    #[test]
    fn empty_and_single_pools() {
        let idx = index(vec![vec![Some(1), None, None, None]]);
        assert_eq!(resolve(&[], TieBreakKind::Elect, &idx), None);
        assert_eq!(
            resolve(&[B], TieBreakKind::Eliminate, &idx),
            Some(Resolution {
                chosen: B,
                decided_by: TieBreakStage::NoTie
            })
        );
    }

    #[test]
    fn lowest_average_is_favored() {
        // A: 1, 3 (avg 2). B: 2, 2, 1 (avg 5/3).
        let idx = index(vec![
            vec![Some(1), Some(2), None, None],
            vec![Some(3), Some(2), None, None],
            vec![None, Some(1), None, None],
        ]);
        let elected = resolve(&[A, B], TieBreakKind::Elect, &idx).unwrap();
        assert_eq!(elected.chosen, B);
        assert_eq!(elected.decided_by, TieBreakStage::AverageRank);
        let eliminated = resolve(&[A, B], TieBreakKind::Eliminate, &idx).unwrap();
        assert_eq!(eliminated.chosen, A);
        assert_eq!(eliminated.decided_by, TieBreakStage::AverageRank);
    }

    #[test]
    fn never_ranked_candidate_is_eliminated() {
        let idx = index(vec![vec![Some(4), None, Some(1), None]]);
        let r = resolve(&[A, D], TieBreakKind::Eliminate, &idx).unwrap();
        assert_eq!(r.chosen, D);
        let r = resolve(&[A, D], TieBreakKind::Elect, &idx).unwrap();
        assert_eq!(r.chosen, A);
    }

    #[test]
    fn rank_positions_break_equal_averages() {
        // A: 1, 3 (avg 2). B: 2, 2 (avg 2). A has more first ranks.
        let idx = index(vec![
            vec![Some(1), Some(2), None, None],
            vec![Some(3), Some(2), None, None],
        ]);
        let elected = resolve(&[B, A], TieBreakKind::Elect, &idx).unwrap();
        assert_eq!(elected.chosen, A);
        assert_eq!(elected.decided_by, TieBreakStage::RankPosition(1));
        let eliminated = resolve(&[A, B], TieBreakKind::Eliminate, &idx).unwrap();
        assert_eq!(eliminated.chosen, B);
        assert_eq!(eliminated.decided_by, TieBreakStage::RankPosition(1));
    }

    #[test]
    fn identical_profiles_fall_back_to_list_order() {
        let idx = index(vec![
            vec![Some(1), Some(2), Some(3), None],
            vec![Some(2), Some(1), Some(3), None],
            vec![Some(3), Some(3), Some(3), None],
        ]);
        // A and B have the same profile, C has a worse average.
        let elected = resolve(&[C, B, A], TieBreakKind::Elect, &idx).unwrap();
        assert_eq!(elected.chosen, A);
        assert_eq!(elected.decided_by, TieBreakStage::CandidateOrder);
        let eliminated = resolve(&[A, B], TieBreakKind::Eliminate, &idx).unwrap();
        assert_eq!(eliminated.chosen, B);
        assert_eq!(eliminated.decided_by, TieBreakStage::CandidateOrder);
    }

    #[test]
    fn resolution_is_deterministic() {
        let idx = index(vec![vec![None, None, None, None]]);
        let first = resolve(&[A, B, C, D], TieBreakKind::Eliminate, &idx);
        for _ in 0..10 {
            assert_eq!(resolve(&[D, C, B, A], TieBreakKind::Eliminate, &idx), first);
        }
        assert_eq!(first.map(|r| r.chosen), Some(D));
    }
}
