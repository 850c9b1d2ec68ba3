// Primitives shared by all the readers: from a raw table of strings to ranks.

use std::collections::HashMap;
use std::path::Path;

use crate::rcv::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Splits the raw rows of a file into the header and the ballots.
///
/// `first_row` is the 0-based index of the first ballot. The row just above it, if any,
/// is the header.
pub fn split_table(raw: Vec<Vec<String>>, first_row: usize) -> ParsedTable {
    let header: Option<Vec<String>> = if first_row > 0 {
        raw.get(first_row - 1).cloned()
    } else {
        None
    };
    let rows: Vec<ParsedRow> = raw
        .into_iter()
        .enumerate()
        .skip(first_row)
        // The line numbers start at 1 to respect most conventions in the excel world
        .map(|(idx, cells)| ParsedRow {
            lineno: idx + 1,
            cells,
        })
        .collect();
    ParsedTable { header, rows }
}

/// The columns of a source that hold ranks, with the candidate of each column.
///
/// With a question, the columns are those with a header shaped as `<question> [<candidate>]`.
/// Otherwise every column starting at the first vote column holds ranks.
/// When the candidates are registered, they are matched by name against the header,
/// or by position if there is no header.
pub fn select_columns(
    table: &ParsedTable,
    cfs: &FileSource,
    candidates: Option<&[String]>,
) -> BRcvResult<Vec<(usize, String)>> {
    let from_header: Option<Vec<(usize, String)>> = match (&table.header, &cfs.question) {
        (Some(header), Some(question)) => {
            let prefix = format!("{} [", question);
            let cols: Vec<(usize, String)> = header
                .iter()
                .enumerate()
                .filter(|(_, h)| h.contains(question.as_str()))
                .map(|(idx, h)| (idx, h.replace(&prefix, "").replace(']', "").trim().to_string()))
                .collect();
            ensure!(
                !cols.is_empty(),
                MissingQuestionSnafu {
                    question: question.clone()
                }
            );
            Some(cols)
        }
        (None, Some(_)) => {
            return Err(Box::new(RcvError::MissingHeader {
                path: cfs.file_path.clone(),
            }));
        }
        (Some(header), None) => {
            let start = cfs.first_vote_column_index()?;
            Some(
                header
                    .iter()
                    .enumerate()
                    .skip(start)
                    .map(|(idx, h)| (idx, h.trim().to_string()))
                    .collect(),
            )
        }
        (None, None) => None,
    };
    debug!("select_columns: from header: {:?}", from_header);

    match (from_header, candidates) {
        (Some(cols), None) => Ok(cols),
        (Some(cols), Some(names)) => {
            let col_names: HashMap<&str, usize> =
                cols.iter().map(|(idx, s)| (s.as_str(), *idx)).collect();
            let mut res: Vec<(usize, String)> = Vec::new();
            for cname in names {
                let idx = col_names.get(cname.as_str()).context(
                    CannotFindCandidateInHeaderSnafu {
                        candidate_name: cname,
                    },
                )?;
                res.push((*idx, cname.clone()));
            }
            Ok(res)
        }
        (None, Some(names)) => {
            let start = cfs.first_vote_column_index()?;
            Ok(names
                .iter()
                .enumerate()
                .map(|(idx, cname)| (start + idx, cname.clone()))
                .collect())
        }
        (None, None) => Err(Box::new(RcvError::MissingHeader {
            path: cfs.file_path.clone(),
        })),
    }
}

/// Reads the rank in a cell. An empty cell is an unranked candidate.
///
/// The labels of the choices are tried first, if any. Otherwise the first number in the cell
/// is the rank, so that `2`, `2nd choice` or `Rank 2` are all read as 2.
pub fn read_rank(
    cell: &str,
    choices: &[String],
    lineno: usize,
    column: &str,
) -> RcvResult<Option<Rank>> {
    let s = cell.trim();
    if s.is_empty() {
        return Ok(None);
    }
    if let Some(idx) = choices.iter().position(|c| c.trim() == s) {
        return Ok(Some((idx + 1) as Rank));
    }
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<Rank>() {
        Ok(rank) if rank > 0 => Ok(Some(rank)),
        _ => InvalidRankCellSnafu {
            lineno,
            column,
            content: s,
        }
        .fail(),
    }
}

/// Converts the selected columns of a table to rows of ranks.
pub fn read_ranks(
    table: &ParsedTable,
    columns: &[(usize, String)],
    cfs: &FileSource,
) -> BRcvResult<Vec<Vec<Option<Rank>>>> {
    let choices: Vec<String> = cfs.choices.clone().unwrap_or_default();
    let mut res: Vec<Vec<Option<Rank>>> = Vec::new();
    for row in table.rows.iter() {
        let mut ranks: Vec<Option<Rank>> = Vec::new();
        for (col_idx, cname) in columns.iter() {
            // Trailing empty cells may be missing.
            let cell = row.cells.get(*col_idx).map(|s| s.as_str()).unwrap_or("");
            ranks.push(read_rank(cell, &choices, row.lineno, cname)?);
        }
        debug!("read_ranks: lineno: {:?} ranks: {:?}", row.lineno, ranks);
        res.push(ranks);
    }
    Ok(res)
}
