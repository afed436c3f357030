// Primitives for reading result rows from Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::report::{io_common::*, *};

/// Reads the rows of a worksheet (the first one by default). The first line is the header.
pub fn read_excel_rows(path: &str, worksheet_name: Option<&str>) -> ReportResult<Vec<OverlayRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let sheet = worksheet_name.unwrap_or("<first>");
    let wrange = match worksheet_name {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    }
    .context(EmptyExcelSnafu { path, sheet })?
    .context(OpeningExcelSnafu { path })?;

    let mut iter = wrange.rows();
    let header: Vec<String> = match iter.next() {
        Some(cells) => read_cells(cells, path, 1)?,
        None => whatever!("{}: worksheet {} is empty", path, sheet),
    };
    debug!("read_excel_rows: header: {:?}", header);
    let columns = RowColumns::from_header(&header, path)?;
    let mut res: Vec<OverlayRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let cells = read_cells(row, path, lineno)?;
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        debug!("read_excel_rows: lineno: {:?} cells: {:?}", lineno, cells);
        res.push(columns.make_row(&cells, path, lineno)?);
    }
    info!(
        "read_excel_rows: {}: {} rows",
        simplify_file_name(path),
        res.len()
    );
    Ok(res)
}

fn read_cells(row: &[DataType], path: &str, lineno: usize) -> ReportResult<Vec<String>> {
    row.iter().map(|c| read_cell(c, path, lineno)).collect()
}

// Counts are often stored as floats by spreadsheets.
fn read_cell(cell: &DataType, path: &str, lineno: usize) -> ReportResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Ok(format!("{}", *f as u64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Empty => Ok("".to_string()),
        _ => whatever!(
            "{}: line {}: could not understand cell {:?}",
            path,
            lineno,
            cell
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        let read = |c: DataType| read_cell(&c, "r.xlsx", 2).unwrap();
        assert_eq!(read(DataType::String("mayor".to_string())), "mayor");
        assert_eq!(read(DataType::Int(12)), "12");
        assert_eq!(read(DataType::Float(1250.0)), "1250");
        assert_eq!(read(DataType::Float(2.5)), "2.5");
        assert_eq!(read(DataType::Empty), "");
        assert!(read_cell(&DataType::Bool(true), "r.xlsx", 2).is_err());
    }

    #[test]
    fn fractional_counts_are_rejected() {
        let cols = RowColumns::from_header(
            &["contest".to_string(), "stat".to_string(), "count".to_string()],
            "r.xlsx",
        )
        .unwrap();
        let cells = read_cells(
            &[
                DataType::String("mayor".to_string()),
                DataType::String("RSTot".to_string()),
                DataType::Float(2.5),
            ],
            "r.xlsx",
            3,
        )
        .unwrap();
        assert!(matches!(
            cols.make_row(&cells, "r.xlsx", 3),
            Err(ReportError::InvalidCount { lineno: 3, .. })
        ));
    }

    #[test]
    fn missing_workbook() {
        let res = read_excel_rows("does/not/exist.xlsx", None);
        assert!(matches!(res, Err(ReportError::OpeningExcel { .. })));
    }
}
