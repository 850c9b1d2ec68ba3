use log::debug;

use crate::ledger::{Ballot, CandidateId, Ledger};
use crate::weight::VoteWeight;

/// The ledger after a transfer, with the accounting of what left the count.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct TransferOutcome {
    pub ledger: Ledger,
    /// Ballots expired by the transfer.
    pub exhausted: u64,
    /// Vote value that did not reach any continuing candidate.
    pub exhausted_value: VoteWeight,
    /// Vote value kept by an elected candidate.
    pub retained: VoteWeight,
}

// Carries a fraction of a vote from an earlier surplus.
fn is_inherited(b: &Ballot) -> bool {
    b.weight() < VoteWeight::FULL
}

/// Transfers the surplus of an elected candidate.
///
/// Above the quota, the surplus is spread uniformly over the winner's ballots that can still
/// move on: their previous weights are overwritten, not scaled. At or under the quota,
/// the winner's ballots are used up and dropped.
pub(crate) fn elect(
    ledger: &Ledger,
    winner: CandidateId,
    votes: VoteWeight,
    quota: VoteWeight,
) -> TransferOutcome {
    let withdrawn = ledger.withdraw_candidate(winner);
    let (adjusted, mut exhausted, exhausted_value, retained) = if votes.exceeds(quota) {
        let surplus = votes - quota;
        let (pruned, dropped) = withdrawn.remove_exhausted();
        let receivers = pruned.supporters(winner).count();
        let value = surplus.split(receivers);
        let lost = if receivers == 0 {
            surplus
        } else {
            VoteWeight::EMPTY
        };
        debug!(
            "elect: {:?} surplus {} over {} ballots: {} per ballot, {} dropped",
            winner, surplus, receivers, value, dropped
        );
        (
            pruned.revalue(|b| b.supports(winner), value),
            dropped,
            lost,
            quota,
        )
    } else {
        let (pruned, dropped) = withdrawn.remove_supporters(winner);
        debug!(
            "elect: {:?} has no surplus, {} ballots used up",
            winner, dropped
        );
        (pruned, dropped, VoteWeight::EMPTY, votes)
    };
    let (pruned, late) = adjusted.remove_exhausted();
    exhausted += late;
    TransferOutcome {
        ledger: pruned.recompute_support(),
        exhausted,
        exhausted_value,
        retained,
    }
}

/// Transfers the ballots of an eliminated candidate.
///
/// First-preference ballots (weight 1) move on at full value. The value carried by the
/// ballots inherited from earlier surpluses (weight under 1) is pooled and spread uniformly
/// over those of them that can still move on. Every other moving ballot whose weight is not 1
/// is given that same uniform value.
pub(crate) fn eliminate(ledger: &Ledger, loser: CandidateId) -> TransferOutcome {
    let pooled: VoteWeight = ledger
        .supporters(loser)
        .filter(|b| is_inherited(b))
        .map(|b| b.weight())
        .sum();
    let whole_before: VoteWeight = ledger
        .supporters(loser)
        .filter(|b| !is_inherited(b))
        .map(|b| b.weight())
        .sum();

    let (pruned, exhausted) = ledger.withdraw_candidate(loser).remove_exhausted();

    let full_after = pruned
        .supporters(loser)
        .filter(|b| b.weight().is_full())
        .count();
    let above_full = pruned
        .supporters(loser)
        .filter(|b| b.weight() > VoteWeight::FULL)
        .count();
    let inheritors = pruned.supporters(loser).filter(|b| is_inherited(b)).count();
    let value = pooled.split(inheritors);
    let lost_pool = if inheritors == 0 {
        pooled
    } else {
        VoteWeight::EMPTY
    };
    // Ballots at 1 or above that exhausted, or that were revalued down from above 1.
    let lost_whole =
        whole_before - VoteWeight::from_count(full_after as u64) - value.scaled(above_full);
    debug!(
        "eliminate: {:?} pooled {} over {} ballots: {} per ballot, {} dropped",
        loser, pooled, inheritors, value, exhausted
    );

    let adjusted = pruned.revalue(|b| b.supports(loser) && !b.weight().is_full(), value);
    TransferOutcome {
        ledger: adjusted.recompute_support(),
        exhausted,
        exhausted_value: lost_whole + lost_pool,
        retained: VoteWeight::EMPTY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BallotTable;
    use crate::ledger::Support;

    const A: CandidateId = CandidateId(0);
    const B: CandidateId = CandidateId(1);
    const C: CandidateId = CandidateId(2);

    fn ledger(rows: Vec<Vec<Option<u32>>>) -> Ledger {
        Ledger::from_table(&BallotTable {
            candidates: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            rows,
        })
        .0
    }

    fn assert_conserved(before: &Ledger, outcome: &TransferOutcome) {
        let after = outcome.ledger.total_weight() + outcome.retained + outcome.exhausted_value;
        assert!(
            after.approx_eq(before.total_weight()),
            "{} != {}",
            after,
            before.total_weight()
        );
    }

    #[test]
    fn surplus_is_spread_uniformly() {
        // A: 5 votes, quota 3. Surplus 2 over the 4 ballots that can move on.
        let l = ledger(vec![
            vec![Some(1), Some(2), None],
            vec![Some(1), Some(2), None],
            vec![Some(1), Some(2), None],
            vec![Some(1), None, Some(2)],
            vec![Some(1), None, None],
            vec![None, Some(1), None],
        ]);
        let out = elect(&l, A, VoteWeight::from_count(5), VoteWeight::from_count(3));
        assert_eq!(out.exhausted, 1);
        assert_eq!(out.retained, VoteWeight::from_count(3));
        let tally = out.ledger.weighted_vote_count();
        assert!(!tally.contains_key(&A));
        assert_eq!(tally.get(&B), Some(&VoteWeight::ratio(5, 2).unwrap()));
        assert_eq!(tally.get(&C), Some(&VoteWeight::ratio(1, 2).unwrap()));
        assert_conserved(&l, &out);
    }

    #[test]
    fn winner_at_quota_uses_up_ballots() {
        let l = ledger(vec![
            vec![Some(1), Some(2), None],
            vec![Some(1), None, None],
            vec![None, Some(1), None],
        ]);
        let out = elect(&l, A, VoteWeight::from_count(2), VoteWeight::from_count(2));
        assert_eq!(out.exhausted, 2);
        assert_eq!(out.ledger.len(), 1);
        assert_eq!(out.retained, VoteWeight::from_count(2));
        assert_eq!(out.exhausted_value, VoteWeight::EMPTY);
        assert_conserved(&l, &out);
    }

    #[test]
    fn surplus_is_lost_when_every_ballot_exhausts() {
        let l = ledger(vec![
            vec![Some(1), None, None],
            vec![Some(1), None, None],
            vec![None, Some(1), None],
        ]);
        let out = elect(&l, A, VoteWeight::from_count(2), VoteWeight::FULL);
        assert_eq!(out.exhausted, 2);
        assert_eq!(out.exhausted_value, VoteWeight::FULL);
        assert_conserved(&l, &out);
    }

    #[test]
    fn surplus_larger_than_receivers_is_carried_whole() {
        // Surplus of 2.5 with a single ballot left to carry it.
        let l = ledger(vec![
            vec![Some(1), Some(2), None],
            vec![Some(1), None, None],
            vec![Some(1), None, None],
            vec![Some(1), None, None],
        ]);
        let quota = VoteWeight::ratio(3, 2).unwrap();
        let out = elect(&l, A, VoteWeight::from_count(4), quota);
        assert_eq!(out.exhausted, 3);
        assert_eq!(out.ledger.ballots()[0].weight(), VoteWeight::ratio(5, 2).unwrap());
        assert_eq!(
            out.ledger.weighted_vote_count().get(&B),
            Some(&VoteWeight::ratio(5, 2).unwrap())
        );
        assert_eq!(out.exhausted_value, VoteWeight::EMPTY);
        assert_conserved(&l, &out);
    }

    #[test]
    fn elimination_moves_full_ballots_and_pools_inherited_value() {
        let l = ledger(vec![
            vec![Some(2), Some(1), None],
            vec![Some(2), Some(1), Some(3)],
            vec![None, Some(1), Some(2)],
            vec![None, Some(1), None],
            vec![Some(1), None, None],
        ]);
        let third = VoteWeight::ratio(1, 3).unwrap();
        // Make the first three ballots of B inherited ones.
        let l = l.revalue(|b| b.row() < 3, third);
        let out = eliminate(&l, B);
        // Ballot 4 exhausts at full value; the inherited value (1) goes to ballots 0..3.
        assert_eq!(out.exhausted, 1);
        assert!(out.exhausted_value.approx_eq(VoteWeight::FULL));
        for b in out.ledger.ballots().iter().take(3) {
            assert!(b.weight().approx_eq(third));
        }
        let tally = out.ledger.weighted_vote_count();
        assert!(tally.get(&A).unwrap().approx_eq(VoteWeight::FULL + third + third));
        assert!(tally.get(&C).unwrap().approx_eq(third));
        assert_eq!(out.ledger.ballots()[3].support(), Support::Candidate(A));
        assert_conserved(&l, &out);
    }

    #[test]
    fn elimination_pools_value_of_exhausted_inherited_ballots() {
        let l = ledger(vec![
            vec![Some(2), Some(1), None],
            vec![None, Some(1), None],
            vec![None, Some(1), None],
        ]);
        let quarter = VoteWeight::ratio(1, 4).unwrap();
        let l = l.revalue(|_| true, quarter);
        let out = eliminate(&l, B);
        // Three quarters pooled on the single ballot that moves on.
        assert_eq!(out.exhausted, 2);
        assert_eq!(out.ledger.ballots()[0].weight(), VoteWeight::ratio(3, 4).unwrap());
        assert_eq!(out.exhausted_value, VoteWeight::EMPTY);
        assert_conserved(&l, &out);
    }

    #[test]
    fn pooled_value_larger_than_inheritors_is_carried_whole() {
        let l = ledger(vec![
            vec![Some(2), Some(1), None],
            vec![None, Some(1), None],
            vec![None, Some(1), None],
            vec![None, Some(1), None],
            vec![None, Some(1), None],
        ]);
        let nine_tenths = VoteWeight::ratio(9, 10).unwrap();
        let l = l.revalue(|_| true, nine_tenths);
        let out = eliminate(&l, B);
        // 4.5 pooled, a single ballot moves on.
        assert_eq!(out.exhausted, 4);
        assert_eq!(out.ledger.ballots()[0].weight(), VoteWeight::ratio(9, 2).unwrap());
        assert_eq!(out.exhausted_value, VoteWeight::EMPTY);
        assert_conserved(&l, &out);
    }

    #[test]
    fn ballot_above_full_weight_is_revalued_but_not_pooled() {
        let l = ledger(vec![
            vec![Some(2), Some(1), None],
            vec![None, Some(1), Some(2)],
            vec![None, Some(1), None],
        ]);
        let half = VoteWeight::ratio(1, 2).unwrap();
        let five_halves = VoteWeight::ratio(5, 2).unwrap();
        let l = l
            .revalue(|b| b.row() == 0, five_halves)
            .revalue(|b| b.row() > 0, half);
        let out = eliminate(&l, B);
        // Only the two halves are pooled, and a single one of them moves on. The ballot above
        // 1 takes the same uniform value.
        assert_eq!(out.exhausted, 1);
        for b in out.ledger.ballots() {
            assert_eq!(b.weight(), VoteWeight::FULL);
        }
        assert_eq!(out.ledger.ballots()[0].support(), Support::Candidate(A));
        assert_eq!(out.ledger.ballots()[1].support(), Support::Candidate(C));
        assert_eq!(out.exhausted_value, VoteWeight::ratio(3, 2).unwrap());
        assert_conserved(&l, &out);
    }

    #[test]
    fn elimination_without_votes_only_withdraws() {
        let l = ledger(vec![vec![Some(1), None, Some(2)]]);
        let out = eliminate(&l, B);
        assert_eq!(out.exhausted, 0);
        assert_eq!(out.ledger.active_candidates(), &[A, C]);
        assert_eq!(out.ledger.ballots(), l.ballots());
    }
}
