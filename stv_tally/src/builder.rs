use snafu::{ensure, OptionExt};

pub use crate::config::*;

/// A builder for adding ballots by candidate name.
///
/// ```
/// pub use stv_tally::builder::Builder;
/// pub use stv_tally::VoteRules;
/// # use stv_tally::VotingErrors;
///
/// let rules = VoteRules { number_of_winners: 2 };
/// let mut builder = Builder::new(&rules)?
///     .candidates(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_ranking_simple(&["Anna".to_string(), "Clara".to_string()])?;
/// builder.add_ranking(&[("Bob".to_string(), 1), ("Anna".to_string(), 2)])?;
/// builder.add_ranking_simple(&["Anna".to_string()])?;
/// builder.add_blank()?;
///
/// let result = builder.tabulate()?;
/// assert_eq!(result.winners[0].name, "Anna");
/// assert_eq!(result.blank_ballots, 1);
///
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: VoteRules,
    pub(crate) _candidates: Option<Vec<String>>,
    pub(crate) _rows: Vec<Vec<Option<Rank>>>,
}

impl Builder {
    pub fn new(rules: &VoteRules) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: None,
            _rows: Vec::new(),
        })
    }

    /// Declares the candidates, in list order. Any ballot added before is discarded.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, VotingErrors> {
        for (idx, name) in cands.iter().enumerate() {
            ensure!(
                !cands[..idx].contains(name),
                DuplicateCandidateSnafu { name }
            );
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: Some(cands.to_vec()),
            _rows: Vec::new(),
        })
    }

    /// Adds a ballot from the candidates in order of preference: the first one gets rank 1.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_ranking_simple(&mut self, candidates: &[String]) -> Result<(), VotingErrors> {
        let ranks: Vec<(String, Rank)> = candidates
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), (idx + 1) as Rank))
            .collect();
        self.add_ranking(&ranks)
    }

    /// Adds a ballot from explicit (candidate, rank) pairs. Candidates not mentioned are
    /// unranked. Ranks do not need to be contiguous.
    pub fn add_ranking(&mut self, ranks: &[(String, Rank)]) -> Result<(), VotingErrors> {
        let candidates = self._candidates.as_deref().context(MissingCandidatesSnafu {})?;
        let mut row: Vec<Option<Rank>> = vec![None; candidates.len()];
        for (name, rank) in ranks {
            ensure!(*rank > 0, InvalidRankSnafu { name, rank: *rank });
            let idx = candidates
                .iter()
                .position(|c| c == name)
                .context(UnknownCandidateSnafu { name })?;
            row[idx] = Some(*rank);
        }
        self._rows.push(row);
        Ok(())
    }

    /// Adds a ballot as a row of ranks, one cell per candidate in list order.
    pub fn add_row(&mut self, row: &[Option<Rank>]) -> Result<(), VotingErrors> {
        let candidates = self._candidates.as_deref().context(MissingCandidatesSnafu {})?;
        ensure!(
            row.len() == candidates.len(),
            RaggedTableSnafu {
                row: self._rows.len(),
                expected: candidates.len(),
                found: row.len()
            }
        );
        for (name, cell) in candidates.iter().zip(row.iter()) {
            if let Some(rank) = cell {
                ensure!(*rank > 0, InvalidRankSnafu { name, rank: *rank });
            }
        }
        self._rows.push(row.to_vec());
        Ok(())
    }

    /// Adds a ballot without any rank. It counts as expired but not toward the quota.
    pub fn add_blank(&mut self) -> Result<(), VotingErrors> {
        let candidates = self._candidates.as_deref().context(MissingCandidatesSnafu {})?;
        self._rows.push(vec![None; candidates.len()]);
        Ok(())
    }

    pub fn build(&self) -> Result<BallotTable, VotingErrors> {
        let candidates = self._candidates.clone().context(MissingCandidatesSnafu {})?;
        Ok(BallotTable {
            candidates,
            rows: self._rows.clone(),
        })
    }

    /// Runs the count over the ballots added so far.
    pub fn tabulate(&self) -> Result<VotingResult, VotingErrors> {
        crate::run_election(&self.build()?, &self._rules)
    }
}
