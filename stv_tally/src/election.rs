use log::{debug, info};
use snafu::{ensure, OptionExt};

use std::collections::HashSet;

use crate::config::*;
use crate::ledger::{CandidateId, Ledger};
use crate::profile::ProfileIndex;
use crate::round::{RoundContext, RoundId, TabulationRound};
use crate::weight::VoteWeight;

/// The outcome of asking an election for one more round.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RoundStep {
    /// A new round was run and appended.
    Added,
    /// All the seats are filled, or every candidate has been resolved.
    Full,
}

/// A multi-seat count in progress: the quota, the candidate profiles and the rounds so far.
#[derive(Debug, Clone)]
pub struct Election {
    seats: u32,
    quota: VoteWeight,
    candidates: Vec<String>,
    index: ProfileIndex,
    original: Ledger,
    blank_ballots: u64,
    rounds: Vec<TabulationRound>,
}

impl Election {
    /// Validates the table and prepares the count. No round is run yet.
    pub fn new(table: &BallotTable, rules: &VoteRules) -> Result<Election, VotingErrors> {
        let seats = rules.number_of_winners;
        let num_candidates = table.candidates.len();
        ensure!(num_candidates > 0, NoCandidatesSnafu {});
        ensure!(seats > 0, InvalidSeatsSnafu { seats });
        ensure!(
            seats as usize <= num_candidates,
            TooManySeatsSnafu {
                seats,
                candidates: num_candidates
            }
        );
        let mut seen: HashSet<&String> = HashSet::new();
        for name in table.candidates.iter() {
            ensure!(seen.insert(name), DuplicateCandidateSnafu { name });
        }
        for (row, cells) in table.rows.iter().enumerate() {
            ensure!(
                cells.len() == num_candidates,
                RaggedTableSnafu {
                    row,
                    expected: num_candidates,
                    found: cells.len()
                }
            );
        }

        let (original, blank_ballots) = Ledger::from_table(table);
        let quota = VoteWeight::ratio(original.len() as u64, seats as u64)
            .context(InvalidSeatsSnafu { seats })?;
        ensure!(!original.is_empty(), EmptyElectionSnafu {});

        info!(
            "Election: {} ballots ({} blank), {} seats, quota: {}",
            original.len(),
            blank_ballots,
            seats,
            quota
        );
        for (idx, name) in table.candidates.iter().enumerate() {
            info!("Candidate: {}: {}", idx + 1, name);
        }

        Ok(Election {
            seats,
            quota,
            candidates: table.candidates.clone(),
            index: ProfileIndex::from_table(table),
            original,
            blank_ballots,
            rounds: Vec::new(),
        })
    }

    /// Runs the next round, unless the seats are filled or no candidate is left to resolve.
    pub fn add_round(&mut self) -> Result<RoundStep, VotingErrors> {
        let elected = self.all_elected().len();
        let resolved = elected + self.all_eliminated().len();
        if elected >= self.seats as usize || resolved >= self.candidates.len() {
            return Ok(RoundStep::Full);
        }

        let number = (self.rounds.len() + 1) as RoundId;
        // Each round works on its own copy of the previous outgoing ledger.
        let ledger = match self.rounds.last() {
            Some(previous) => previous.outgoing_ledger().clone(),
            None => self.original.clone(),
        };
        let ctx = RoundContext {
            quota: self.quota,
            open_seats: self.seats as usize - elected,
            index: &self.index,
        };
        let round = TabulationRound::run(number, ledger, &ctx)?;
        self.log_round(&round);
        self.rounds.push(round);
        Ok(RoundStep::Added)
    }

    /// Runs rounds until the seats are filled or every candidate is resolved.
    pub fn tabulate(&mut self) -> Result<(), VotingErrors> {
        // Every round resolves at least one candidate.
        let max_rounds = self.candidates.len();
        while self.add_round()? == RoundStep::Added {
            ensure!(
                self.rounds.len() <= max_rounds,
                NoConvergenceSnafu {
                    rounds: self.rounds.len()
                }
            );
        }
        Ok(())
    }

    fn log_round(&self, round: &TabulationRound) {
        info!("Round {} (quota: {})", round.number(), self.quota);
        for (cid, count) in round.starting_tally().iter() {
            let status = if round.elected().contains(cid) {
                " -> elected"
            } else if round.eliminated() == Some(*cid) {
                " -> eliminated"
            } else {
                ""
            };
            info!("{:>12} {}{}", count, self.candidate_name(*cid), status);
        }
        for tb in round.tie_breaks() {
            debug!(
                "Round {}: tie ({}) between {:?} resolved to {} by {}",
                round.number(),
                tb.kind,
                tb.pool
                    .iter()
                    .map(|cid| self.candidate_name(*cid))
                    .collect::<Vec<&str>>(),
                self.candidate_name(tb.chosen),
                tb.decided_by
            );
        }
    }

    pub fn seats(&self) -> u32 {
        self.seats
    }

    pub fn quota(&self) -> VoteWeight {
        self.quota
    }

    pub fn rounds(&self) -> &[TabulationRound] {
        &self.rounds
    }

    /// The ledger before the first round, without the blank ballots.
    pub fn original_ledger(&self) -> &Ledger {
        &self.original
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn candidate_name(&self, cid: CandidateId) -> &str {
        self.candidates
            .get(cid.index())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn candidate_id(&self, name: &str) -> Option<CandidateId> {
        self.candidates
            .iter()
            .position(|c| c == name)
            .map(|idx| CandidateId(idx as u32))
    }

    pub fn all_elected(&self) -> Vec<CandidateId> {
        self.rounds
            .iter()
            .flat_map(|r| r.elected().iter().cloned())
            .collect()
    }

    pub fn all_eliminated(&self) -> Vec<CandidateId> {
        self.rounds.iter().filter_map(|r| r.eliminated()).collect()
    }

    /// The vote count of a candidate in the round it was elected.
    pub fn election_votes(&self, cid: CandidateId) -> Option<VoteWeight> {
        self.rounds
            .iter()
            .find(|r| r.elected().contains(&cid))
            .and_then(|r| r.starting_tally().get(&cid).cloned())
    }

    pub fn tie_break_log(&self) -> Vec<TieBreakRecord> {
        self.rounds
            .iter()
            .flat_map(|r| {
                r.tie_breaks().iter().map(move |tb| TieBreakRecord {
                    round: r.number(),
                    kind: tb.kind,
                    pool: tb
                        .pool
                        .iter()
                        .map(|cid| self.candidate_name(*cid).to_string())
                        .collect(),
                    chosen: self.candidate_name(tb.chosen).to_string(),
                    decided_by: tb.decided_by,
                })
            })
            .collect()
    }

    pub fn blank_ballots(&self) -> u64 {
        self.blank_ballots
    }

    /// The blank ballots and all the ballots exhausted during the rounds.
    pub fn total_expired(&self) -> u64 {
        self.blank_ballots + self.rounds.iter().map(|r| r.exhausted()).sum::<u64>()
    }

    pub fn is_complete(&self) -> bool {
        self.all_elected().len() == self.seats as usize
    }

    /// Assembles the result of a finished count.
    ///
    /// A count that stopped without filling every seat is reported as an error.
    pub fn result(&self) -> Result<VotingResult, VotingErrors> {
        let elected = self.all_elected();
        ensure!(
            self.is_complete(),
            IncompleteSnafu {
                rounds: self.rounds.len(),
                elected: elected
                    .iter()
                    .map(|cid| self.candidate_name(*cid).to_string())
                    .collect::<Vec<String>>(),
                seats: self.seats
            }
        );

        let winners: Vec<ElectedCandidate> = self
            .rounds
            .iter()
            .flat_map(|r| {
                r.elected().iter().map(move |cid| ElectedCandidate {
                    name: self.candidate_name(*cid).to_string(),
                    votes: r
                        .starting_tally()
                        .get(cid)
                        .cloned()
                        .unwrap_or(VoteWeight::EMPTY),
                    round: r.number(),
                })
            })
            .collect();

        let tie_break_log = self.tie_break_log();
        let round_stats: Vec<RoundStats> = self
            .rounds
            .iter()
            .map(|r| RoundStats {
                round: r.number(),
                tally: self.named(r.starting_tally().iter().map(|(c, vc)| (*c, *vc))),
                tally_results_elected: r
                    .elected()
                    .iter()
                    .map(|cid| self.candidate_name(*cid).to_string())
                    .collect(),
                tally_result_eliminated: r
                    .eliminated()
                    .map(|cid| self.candidate_name(cid).to_string()),
                transfers: self.named(r.transfers().into_iter()),
                exhausted: r.exhausted(),
                exhausted_value: r.exhausted_value(),
                tie_breaks: tie_break_log
                    .iter()
                    .filter(|tb| tb.round == r.number())
                    .cloned()
                    .collect(),
            })
            .collect();

        Ok(VotingResult {
            winners,
            eliminated: self
                .all_eliminated()
                .iter()
                .map(|cid| self.candidate_name(*cid).to_string())
                .collect(),
            quota: self.quota,
            blank_ballots: self.blank_ballots,
            expired: self.total_expired(),
            round_stats,
        })
    }

    fn named<I>(&self, counts: I) -> Vec<(String, VoteWeight)>
    where
        I: Iterator<Item = (CandidateId, VoteWeight)>,
    {
        counts
            .map(|(cid, vc)| (self.candidate_name(cid).to_string(), vc))
            .collect()
    }
}
