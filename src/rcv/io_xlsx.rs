// Primitives for reading Excel files, as exported by Microsoft Forms and Google Forms.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::rcv::{io_common::split_table, *};

pub fn read_excel_table(path: &str, cfs: &FileSource) -> BRcvResult<ParsedTable> {
    let first_row = cfs.first_vote_row_index()?;
    let wrange = get_range(path, cfs)?;

    let mut raw: Vec<Vec<String>> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        let lineno = idx + 1;
        let mut cells: Vec<String> = Vec::new();
        for cell in row {
            cells.push(read_cell(cell, lineno)?);
        }
        debug!("read_excel_table: lineno: {:?} row: {:?}", lineno, cells);
        raw.push(cells);
    }
    Ok(split_table(raw, first_row))
}

// Whole numbers are written without decimals, so that the rank 2.0 reads as "2".
fn read_cell(cell: &DataType, lineno: usize) -> RcvResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Empty => Ok("".to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Bool(b) => Ok(b.to_string()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

fn get_range(path: &str, cfs: &FileSource) -> BRcvResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it. Otherwise the first one.
    let wrange = if let Some(worksheet_name) = worksheet_name_o {
        workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
            })?
            .context(OpeningExcelSnafu { path })?
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?
    };
    Ok(wrange)
}
