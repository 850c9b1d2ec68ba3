use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use stv_tally::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rcv::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RcvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive number in the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found"))]
    MissingWorksheet { name: String },
    #[snafu(display("Line {lineno}: unexpected cell {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("No header in {path} to read the candidates from"))]
    MissingHeader { path: String },
    #[snafu(display("No column found for question {question}"))]
    MissingQuestion { question: String },
    #[snafu(display("Candidate {candidate_name} not found in the header"))]
    CannotFindCandidateInHeader { candidate_name: String },
    #[snafu(display(
        "The candidates of {path} ({found:?}) differ from the previous sources ({expected:?})"
    ))]
    InconsistentSources {
        path: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[snafu(display("Line {lineno}, column {column}: cannot read a rank in {content:?}"))]
    InvalidRankCell {
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("Unknown provider {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("No input: provide a configuration file or an input file"))]
    MissingSources {},
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Voting error"))]
    Voting { source: VotingErrors },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    SummaryMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RcvResult<T> = Result<T, RcvError>;

pub type BRcvResult<T> = Result<T, Box<RcvError>>;

/// A table read from a file, before any interpretation of the cells.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedTable {
    pub header: Option<Vec<String>>,
    pub rows: Vec<ParsedRow>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedRow {
    /// 1-based, as seen in a spreadsheet.
    pub lineno: usize,
    pub cells: Vec<String>,
}

fn read_table(path: &str, cfs: &FileSource) -> BRcvResult<ParsedTable> {
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_table(path, cfs),
        "xlsx" | "msforms" => io_xlsx::read_excel_table(path, cfs),
        x => Err(Box::new(RcvError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

/// Reads all the sources of a configuration into a single table of ranks.
fn read_ballots(config: &RcvConfig, root_path: &Path) -> BRcvResult<BallotTable> {
    ensure!(!config.cvr_file_sources.is_empty(), MissingSourcesSnafu {});
    let registered: Option<Vec<String>> = config
        .candidates
        .as_ref()
        .map(|cs| cs.iter().map(|c| c.name.clone()).collect());

    let mut candidates: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<Option<Rank>>> = Vec::new();
    for cfs in config.cvr_file_sources.iter() {
        let p: PathBuf = root_path.join(&cfs.file_path);
        let path = p.as_path().display().to_string();
        info!("Attempting to read rank file {:?}", path);
        let table = read_table(&path, cfs)?;
        let columns = io_common::select_columns(&table, cfs, registered.as_deref())?;
        let names: Vec<String> = columns.iter().map(|(_, name)| name.clone()).collect();
        debug!("read_ballots: {}: columns {:?}", path, columns);
        if let Some(expected) = &candidates {
            ensure!(
                *expected == names,
                InconsistentSourcesSnafu {
                    path: io_common::simplify_file_name(&path),
                    expected: expected.clone(),
                    found: names.clone()
                }
            );
        }
        let mut source_rows = io_common::read_ranks(&table, &columns, cfs)?;
        info!("Read {} ballots from {:?}", source_rows.len(), path);
        rows.append(&mut source_rows);
        candidates = Some(names);
    }

    Ok(BallotTable {
        candidates: candidates.unwrap_or_default(),
        rows,
    })
}

fn tally_json(tally: &[(String, VoteWeight)]) -> JSMap<String, JSValue> {
    let mut res: JSMap<String, JSValue> = JSMap::new();
    for (name, count) in tally.iter() {
        res.insert(name.clone(), json!(count.to_string()));
    }
    res
}

fn result_stats_to_json(rs: &VotingResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rs.round_stats.iter() {
        let mut transfers = tally_json(&round_stat.transfers);
        if round_stat.exhausted_value.exceeds(VoteWeight::EMPTY) {
            transfers.insert(
                "exhausted".to_string(),
                json!(round_stat.exhausted_value.to_string()),
            );
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        if let Some(name) = &round_stat.tally_result_eliminated {
            tally_results.push(json!({
                "eliminated": name,
                "transfers": transfers
            }));
        }
        // Candidates elected together receive no transfer.
        let single_winner = round_stat.tally_results_elected.len() == 1;
        for winner_name in round_stat.tally_results_elected.iter() {
            let winner_transfers = if single_winner {
                transfers.clone()
            } else {
                JSMap::new()
            };
            tally_results.push(json!({
                "elected": winner_name,
                "transfers": winner_transfers
            }));
        }

        let tie_breaks: Vec<JSValue> = round_stat
            .tie_breaks
            .iter()
            .map(|tb| {
                json!({
                    "kind": tb.kind.to_string(),
                    "pool": tb.pool,
                    "chosen": tb.chosen,
                    "decidedBy": tb.decided_by.to_string()
                })
            })
            .collect();

        let js = json!({
            "round": round_stat.round,
            "tally": tally_json(&round_stat.tally),
            "tallyResults": tally_results,
            "tieBreaks": tie_breaks
        });
        l.push(js);
    }
    l
}

fn build_summary_js(config: &RcvConfig, rv: &VotingResult) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
        threshold: Some(rv.quota.to_string()),
    };
    let elected: Vec<JSValue> = rv
        .winners
        .iter()
        .map(|w| json!({"name": w.name, "votes": w.votes.to_string(), "round": w.round}))
        .collect();
    json!({
        "config": c,
        "results": result_stats_to_json(rv),
        "summary": {
            "elected": elected,
            "eliminated": rv.eliminated,
            "blankBallots": rv.blank_ballots,
            "expiredBallots": rv.expired
        }
    })
}

/// Merges the command line into the configuration file, if any.
///
/// Returns the configuration and the directory that the file paths are relative to.
fn resolve_config(args: &Args) -> BRcvResult<(RcvConfig, PathBuf)> {
    let (mut config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => {
            let input = args.input.clone().context(MissingSourcesSnafu {})?;
            let config = RcvConfig {
                output_settings: OutputSettings {
                    contest_name: io_common::simplify_file_name(&input),
                    output_directory: None,
                    contest_date: None,
                    contest_jurisdiction: None,
                    contest_office: None,
                },
                cvr_file_sources: Vec::new(),
                candidates: None,
                rules: RcvRules::with_seats(1),
            };
            (config, PathBuf::new())
        }
    };

    if let Some(input) = &args.input {
        let provider = args.input_type.clone().unwrap_or_else(|| "csv".to_string());
        config.cvr_file_sources = vec![FileSource::from_input(&provider, input)];
    }
    for cfs in config.cvr_file_sources.iter_mut() {
        if let Some(input_type) = &args.input_type {
            cfs.provider = input_type.clone();
        }
        if let Some(question) = &args.question {
            cfs.question = Some(question.clone());
        }
        if let Some(choices) = &args.choices {
            cfs.choices = Some(choices.clone());
        }
        if let Some(worksheet) = &args.excel_worksheet_name {
            cfs.excel_worksheet_name = Some(worksheet.clone());
        }
    }
    if let Some(seats) = args.seats {
        config.rules = RcvRules::with_seats(seats);
    }
    debug!("resolve_config: {:?}", config);
    Ok((config, root))
}

/// Reads the ballots, runs the count and assembles the summary.
fn tabulate(config: &RcvConfig, root: &Path) -> BRcvResult<JSValue> {
    let rules = VoteRules {
        number_of_winners: config.rules.number_of_winners()?,
    };
    let table = read_ballots(config, root)?;
    info!(
        "Read {} ballots for {} candidates",
        table.rows.len(),
        table.candidates.len()
    );
    let result = stv_tally::run_election(&table, &rules).context(VotingSnafu {})?;
    Ok(build_summary_js(config, &result))
}

// The command line first, then the output directory of the configuration.
fn output_target(args: &Args, config: &RcvConfig, root: &Path) -> RcvResult<String> {
    let out: String = match (&args.out, &config.output_settings.output_directory) {
        (Some(out), _) => out.clone(),
        (None, Some(dir)) => root
            .join(dir)
            .join("summary.json")
            .display()
            .to_string(),
        (None, None) => "stdout".to_string(),
    };
    ensure_whatever!(!out.trim().is_empty(), "The output location is empty");
    Ok(out)
}

fn write_output(pretty_js_stats: &str, out: &str) -> BRcvResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js_stats);
    } else {
        if let Some(parent) = Path::new(out).parent() {
            fs::create_dir_all(parent).context(WritingOutputSnafu { path: out })?;
        }
        fs::write(out, pretty_js_stats).context(WritingOutputSnafu { path: out })?;
        info!("Summary written to {:?}", out);
    }
    Ok(())
}

pub fn run_election(args: &Args) -> BRcvResult<()> {
    let (config, root) = resolve_config(args)?;
    let result_js = tabulate(&config, &root)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out = output_target(args, &config, &root)?;
    write_output(&pretty_js_stats, &out)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return Err(Box::new(RcvError::SummaryMismatch {}));
        }
        info!("The summary matches the reference {:?}", summary_p);
    }

    Ok(())
}
