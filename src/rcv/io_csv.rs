// Primitives for reading CSV files.

use crate::rcv::{io_common::split_table, *};

pub fn read_csv_table(path: &str, cfs: &FileSource) -> BRcvResult<ParsedTable> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut raw: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_table: lineno: {:?} line: {:?}", lineno, line);
        raw.push(line.iter().map(|s| s.to_string()).collect());
    }
    Ok(split_table(raw, first_row))
}
