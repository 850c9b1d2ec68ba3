use log::{debug, info};
use snafu::OptionExt;

use crate::config::*;
use crate::ledger::{CandidateId, Ledger, VoteTally};
use crate::profile::ProfileIndex;
use crate::tiebreak;
use crate::transfer;
use crate::weight::VoteWeight;

pub type RoundId = u32;

/// A tie that had to be resolved during a round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TieBreakEntry {
    pub kind: TieBreakKind,
    pub pool: Vec<CandidateId>,
    pub chosen: CandidateId,
    pub decided_by: TieBreakStage,
}

/// What a round needs to know about the election it belongs to.
pub(crate) struct RoundContext<'a> {
    pub quota: VoteWeight,
    /// Seats still to fill at the start of the round.
    pub open_seats: usize,
    pub index: &'a ProfileIndex,
}

/// One round of the count. It is fully decided when constructed and never changes afterwards.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TabulationRound {
    number: RoundId,
    starting_ledger: Ledger,
    starting_tally: VoteTally,
    elected: Vec<CandidateId>,
    eliminated: Option<CandidateId>,
    tie_breaks: Vec<TieBreakEntry>,
    outgoing_ledger: Ledger,
    outgoing_tally: VoteTally,
    exhausted: u64,
    exhausted_value: VoteWeight,
    retained: VoteWeight,
}

impl TabulationRound {
    /// Runs one round over `ledger`:
    /// - if the candidates still running exactly fill the open seats, all of them are elected;
    /// - otherwise, if some candidate reaches the quota, the leader is elected and its surplus
    ///   transferred;
    /// - otherwise the last candidate is eliminated and its ballots transferred.
    pub(crate) fn run(
        number: RoundId,
        ledger: Ledger,
        ctx: &RoundContext,
    ) -> Result<TabulationRound, VotingErrors> {
        let starting_tally = ledger.weighted_vote_count();
        debug!("run: round {} tally: {:?}", number, starting_tally);

        let active: Vec<CandidateId> = ledger.active_candidates().to_vec();
        if !active.is_empty() && active.len() == ctx.open_seats {
            info!(
                "Round {}: {} candidates for {} seats, electing all of them",
                number,
                active.len(),
                ctx.open_seats
            );
            return Ok(TabulationRound {
                number,
                outgoing_ledger: ledger.clone(),
                outgoing_tally: starting_tally.clone(),
                starting_ledger: ledger,
                starting_tally,
                elected: active,
                eliminated: None,
                tie_breaks: Vec::new(),
                exhausted: 0,
                exhausted_value: VoteWeight::EMPTY,
                retained: VoteWeight::EMPTY,
            });
        }

        let mut tie_breaks: Vec<TieBreakEntry> = Vec::new();
        let someone_reaches_quota = starting_tally.values().any(|vc| vc.reaches(ctx.quota));
        let (elected, eliminated, outcome) = if someone_reaches_quota {
            let winner = pick(
                number,
                &starting_tally,
                TieBreakKind::Elect,
                ctx.index,
                &mut tie_breaks,
            )?;
            let votes = starting_tally
                .get(&winner)
                .cloned()
                .unwrap_or(VoteWeight::EMPTY);
            (
                vec![winner],
                None,
                transfer::elect(&ledger, winner, votes, ctx.quota),
            )
        } else {
            let loser = pick(
                number,
                &starting_tally,
                TieBreakKind::Eliminate,
                ctx.index,
                &mut tie_breaks,
            )?;
            (Vec::new(), Some(loser), transfer::eliminate(&ledger, loser))
        };

        let outgoing_tally = outcome.ledger.weighted_vote_count();
        debug!(
            "run: round {} outgoing tally: {:?}, {} ballots exhausted",
            number, outgoing_tally, outcome.exhausted
        );
        Ok(TabulationRound {
            number,
            starting_ledger: ledger,
            starting_tally,
            elected,
            eliminated,
            tie_breaks,
            outgoing_ledger: outcome.ledger,
            outgoing_tally,
            exhausted: outcome.exhausted,
            exhausted_value: outcome.exhausted_value,
            retained: outcome.retained,
        })
    }

    pub fn number(&self) -> RoundId {
        self.number
    }

    pub fn starting_ledger(&self) -> &Ledger {
        &self.starting_ledger
    }

    pub fn starting_tally(&self) -> &VoteTally {
        &self.starting_tally
    }

    /// Zero or one candidate, or all of them when the remaining candidates fill the seats.
    pub fn elected(&self) -> &[CandidateId] {
        &self.elected
    }

    pub fn eliminated(&self) -> Option<CandidateId> {
        self.eliminated
    }

    pub fn tie_breaks(&self) -> &[TieBreakEntry] {
        &self.tie_breaks
    }

    pub fn outgoing_ledger(&self) -> &Ledger {
        &self.outgoing_ledger
    }

    pub fn outgoing_tally(&self) -> &VoteTally {
        &self.outgoing_tally
    }

    /// The number of ballots that expired during this round.
    pub fn exhausted(&self) -> u64 {
        self.exhausted
    }

    pub fn exhausted_value(&self) -> VoteWeight {
        self.exhausted_value
    }

    /// The value kept by the candidate elected this round.
    pub fn retained(&self) -> VoteWeight {
        self.retained
    }

    /// The value gained by each continuing candidate during this round.
    pub fn transfers(&self) -> Vec<(CandidateId, VoteWeight)> {
        self.outgoing_tally
            .iter()
            .filter_map(|(cid, out)| {
                let start = self
                    .starting_tally
                    .get(cid)
                    .cloned()
                    .unwrap_or(VoteWeight::EMPTY);
                let gain = *out - start;
                if gain.exceeds(VoteWeight::EMPTY) {
                    Some((*cid, gain))
                } else {
                    None
                }
            })
            .collect()
    }
}

// Finds the leader (or the last) of the tally, resolving ties if needed.
fn pick(
    round: RoundId,
    tally: &VoteTally,
    kind: TieBreakKind,
    index: &ProfileIndex,
    tie_breaks: &mut Vec<TieBreakEntry>,
) -> Result<CandidateId, VotingErrors> {
    let extreme: VoteWeight = match kind {
        TieBreakKind::Elect => tally.values().max(),
        TieBreakKind::Eliminate => tally.values().min(),
    }
    .cloned()
    .context(EmptyPoolSnafu { round })?;

    let pool: Vec<CandidateId> = tally
        .iter()
        .filter(|(_, vc)| vc.approx_eq(extreme))
        .map(|(cid, _)| *cid)
        .collect();
    let resolution = tiebreak::resolve(&pool, kind, index).context(EmptyPoolSnafu { round })?;
    if pool.len() > 1 {
        debug!(
            "pick: round {}: tie between {:?} at {}, resolved to {:?} by {}",
            round, pool, extreme, resolution.chosen, resolution.decided_by
        );
        tie_breaks.push(TieBreakEntry {
            kind,
            pool,
            chosen: resolution.chosen,
            decided_by: resolution.decided_by,
        });
    }
    Ok(resolution.chosen)
}
