// Primitives for reading result rows from tab-separated files.

use std::io::Read;

use crate::report::{io_common::*, *};

pub fn read_tsv_rows(path: &str) -> ReportResult<Vec<OverlayRow>> {
    let rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(OpeningTsvSnafu { path })?;
    let res = parse_rows(rdr, path)?;
    info!(
        "read_tsv_rows: {}: {} rows",
        simplify_file_name(path),
        res.len()
    );
    Ok(res)
}

/// Reads the header line, then one row per line. Blank lines are skipped.
pub fn parse_rows<R: Read>(rdr: csv::Reader<R>, path: &str) -> ReportResult<Vec<OverlayRow>> {
    let mut records = rdr.into_records();
    let header: Vec<String> = match records.next() {
        Some(line_r) => line_r
            .context(ReadingTsvSnafu { path, lineno: 1usize })?
            .iter()
            .map(|s| s.to_string())
            .collect(),
        None => whatever!("{}: empty file", path),
    };
    let columns = RowColumns::from_header(&header, path)?;
    let mut res: Vec<OverlayRow> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let line = line_r.context(ReadingTsvSnafu {
            path,
            lineno: idx + 2,
        })?;
        let lineno = line
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        if line.iter().all(|s| s.trim().is_empty()) {
            continue;
        }
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        debug!("parse_rows: lineno: {:?} cells: {:?}", lineno, cells);
        res.push(columns.make_row(&cells, path, lineno)?);
    }
    Ok(res)
}
