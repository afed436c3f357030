// Primitives shared by the readers of result files.

use std::path::Path;

use crate::report::*;

pub const COL_CONTEST: &str = "contest";
pub const COL_STAT: &str = "stat";
pub const COL_GROUP: &str = "group";
pub const COL_PARTY: &str = "party";
pub const COL_CHOICE: &str = "choice";
pub const COL_PRECINCT: &str = "precinct";
pub const COL_COUNT: &str = "count";

/// A result row read from a file, with the contest it belongs to.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OverlayRow {
    pub contest: String,
    pub row: ResultRow,
}

/// The position of each column in a result file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RowColumns {
    contest: usize,
    stat: usize,
    count: usize,
    group: Option<usize>,
    party: Option<usize>,
    choice: Option<usize>,
    precinct: Option<usize>,
}

impl RowColumns {
    /// Locates the columns from the header line. `contest`, `stat` and `count` are mandatory.
    pub fn from_header(header: &[String], path: &str) -> ReportResult<RowColumns> {
        let find = |name: &str| header.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let mandatory = |name: &str| {
            find(name).context(MissingColumnSnafu {
                path,
                column: name,
            })
        };
        Ok(RowColumns {
            contest: mandatory(COL_CONTEST)?,
            stat: mandatory(COL_STAT)?,
            count: mandatory(COL_COUNT)?,
            group: find(COL_GROUP),
            party: find(COL_PARTY),
            choice: find(COL_CHOICE),
            precinct: find(COL_PRECINCT),
        })
    }

    /// Builds a row from the cells of one line. Empty cells are absent values.
    pub fn make_row(&self, cells: &[String], path: &str, lineno: usize) -> ReportResult<OverlayRow> {
        let cell = |idx: usize| cells.get(idx).map(|s| s.trim()).unwrap_or("");
        let optional = |idx: Option<usize>| match idx.map(cell) {
            Some(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        };
        let contest = cell(self.contest);
        let stat = cell(self.stat);
        if contest.is_empty() || stat.is_empty() {
            whatever!("{}: line {}: missing contest or stat", path, lineno);
        }
        let count_str = cell(self.count);
        let count = count_str.parse::<u64>().ok().context(InvalidCountSnafu {
            path,
            lineno,
            value: count_str,
        })?;
        let row = ResultRow {
            stat: StatCode::from(stat),
            voting_group: optional(self.group).map(GroupCode::from),
            party: optional(self.party).map(PartyId::from),
            choice: optional(self.choice).map(ChoiceId::from),
            precinct: optional(self.precinct).map(PrecinctId::from),
            count,
        };
        Ok(OverlayRow {
            contest: contest.to_string(),
            row,
        })
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}
