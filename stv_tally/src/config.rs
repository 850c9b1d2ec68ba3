// ********* Input data structures ***********

use snafu::Snafu;
use std::fmt::Display;

use crate::weight::VoteWeight;

/// A rank given by a voter. The most preferred candidate has rank 1.
pub type Rank = u32;

/// The rankings of one contest: one row per voter, one column per candidate.
///
/// Cells hold the rank given by that voter to that candidate, or `None` if the candidate
/// was left unranked. A row with no rank at all is a blank ballot.
///
/// In most cases, it is enough to use the higher-level builder API.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotTable {
    /// The candidate names, in list order. The order is significant for tie-breaks.
    pub candidates: Vec<String>,
    pub rows: Vec<Vec<Option<Rank>>>,
}

// ******** Output data structures *********

/// Which decision a tie-break was resolved for.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TieBreakKind {
    /// Picks the candidate to elect among the tied leaders.
    Elect,
    /// Picks the candidate to eliminate among the tied trailers.
    Eliminate,
}

impl Display for TieBreakKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TieBreakKind::Elect => write!(f, "elect"),
            TieBreakKind::Eliminate => write!(f, "eliminated"),
        }
    }
}

/// The statistic that singled out the chosen candidate of a tie.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TieBreakStage {
    NoTie,
    AverageRank,
    /// The number of original ballots placing the candidates at this (1-based) rank.
    RankPosition(u32),
    /// Nothing else separated the pool: the candidate list order decided.
    CandidateOrder,
}

impl Display for TieBreakStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TieBreakStage::NoTie => write!(f, "noTie"),
            TieBreakStage::AverageRank => write!(f, "averageRank"),
            TieBreakStage::RankPosition(p) => write!(f, "rankPosition{}", p),
            TieBreakStage::CandidateOrder => write!(f, "candidateOrder"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TieBreakRecord {
    pub round: u32,
    pub kind: TieBreakKind,
    /// All the tied candidates, in list order, before resolution.
    pub pool: Vec<String>,
    pub chosen: String,
    pub decided_by: TieBreakStage,
}

/// Statistics for one round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// The weighted vote count of every candidate still running at the start of the round.
    pub tally: Vec<(String, VoteWeight)>,
    pub tally_results_elected: Vec<String>,
    pub tally_result_eliminated: Option<String>,
    /// The value gained by each continuing candidate during this round.
    pub transfers: Vec<(String, VoteWeight)>,
    /// The number of ballots that expired during this round.
    pub exhausted: u64,
    pub exhausted_value: VoteWeight,
    pub tie_breaks: Vec<TieBreakRecord>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectedCandidate {
    pub name: String,
    /// The weighted vote count at the moment of election.
    pub votes: VoteWeight,
    pub round: u32,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VotingResult {
    /// In election order. Candidates elected together are in list order.
    pub winners: Vec<ElectedCandidate>,
    pub eliminated: Vec<String>,
    pub quota: VoteWeight,
    /// Ballots without any rank, discarded before the first round.
    pub blank_ballots: u64,
    /// All the expired ballots: the blank ballots and those exhausted during the rounds.
    pub expired: u64,
    pub round_stats: Vec<RoundStats>,
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum VotingErrors {
    #[snafu(display("the election has no candidate"))]
    NoCandidates {},
    #[snafu(display("the number of seats must be positive, got {seats}"))]
    InvalidSeats { seats: u32 },
    #[snafu(display("cannot fill {seats} seats with only {candidates} candidates"))]
    TooManySeats { seats: u32, candidates: usize },
    #[snafu(display("candidate {name} is listed more than once"))]
    DuplicateCandidate { name: String },
    #[snafu(display("row {row} has {found} cells, expected one per candidate ({expected})"))]
    RaggedTable {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[snafu(display("candidate {name} is not registered"))]
    UnknownCandidate { name: String },
    #[snafu(display("invalid rank {rank} for candidate {name}"))]
    InvalidRank { name: String, rank: Rank },
    #[snafu(display("the candidates must be declared before adding rankings"))]
    MissingCandidates {},
    #[snafu(display("every ballot is blank, no quota can be computed"))]
    EmptyElection {},
    #[snafu(display(
        "all candidates were resolved after {rounds} rounds with only {} of {seats} seats filled",
        elected.len()
    ))]
    Incomplete {
        rounds: usize,
        elected: Vec<String>,
        seats: u32,
    },
    #[snafu(display("round {round}: no candidate left to decide on"))]
    EmptyPool { round: u32 },
    #[snafu(display("no convergence after {rounds} rounds"))]
    NoConvergence { rounds: usize },
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRules {
    /// The number of seats to fill.
    pub number_of_winners: u32,
}

impl VoteRules {
    pub const DEFAULT_RULES: VoteRules = VoteRules {
        number_of_winners: 1,
    };
}
