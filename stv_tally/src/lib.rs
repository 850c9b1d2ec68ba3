mod config;
mod election;
mod ledger;
mod profile;
mod round;
mod tiebreak;
mod transfer;
mod weight;

pub mod builder;
pub mod manual;

use log::{debug, info};

pub use crate::config::*;
pub use crate::election::{Election, RoundStep};
pub use crate::ledger::{Ballot, CandidateId, Ledger, Support, VoteTally};
pub use crate::profile::{AverageRank, CandidateProfile, ProfileIndex};
pub use crate::round::{RoundId, TabulationRound, TieBreakEntry};
pub use crate::weight::{VoteWeight, VOTE_EPSILON};

/// Runs the count with the given rules for the given ballots.
///
/// Arguments:
/// * `table` the rankings, one row per voter and one column per candidate
/// * `rules` the rules that govern this election
///
/// ```
/// use stv_tally::{run_election, BallotTable, VoteRules};
///
/// let table = BallotTable {
///     candidates: vec!["A".to_string(), "B".to_string(), "C".to_string()],
///     rows: vec![
///         vec![Some(1), Some(2), None],
///         vec![Some(1), None, Some(2)],
///         vec![None, Some(1), None],
///         vec![None, None, Some(1)],
///     ],
/// };
/// let rules = VoteRules { number_of_winners: 2 };
/// let result = run_election(&table, &rules)?;
/// assert_eq!(result.winners.len(), 2);
/// assert_eq!(result.winners[0].name, "A");
/// # Ok::<(), stv_tally::VotingErrors>(())
/// ```
pub fn run_election(table: &BallotTable, rules: &VoteRules) -> Result<VotingResult, VotingErrors> {
    info!(
        "Processing {:?} ballots, candidates: {:?}, rules: {:?}",
        table.rows.len(),
        table.candidates,
        rules
    );
    let mut election = Election::new(table, rules)?;
    election.tabulate()?;
    let result = election.result()?;
    debug!(
        "run_election: {} rounds, winners: {:?}",
        result.round_stats.len(),
        result.winners
    );
    Ok(result)
}
