//! Report tables for `info` and `operations` output

use prettytable::{Cell, Row, Table, format::consts::FORMAT_NO_LINESEP_WITH_TITLE};
use std::fmt;

/// A titled table of report lines
pub struct ReportTable {
    table: Table,
}

impl ReportTable {
    /// Table with bold column titles
    pub fn new(titles: &[&str]) -> Self {
        let mut table = Table::new();
        table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(Row::new(
            titles
                .iter()
                .map(|title| Cell::new(title).style_spec("b"))
                .collect(),
        ));
        Self { table }
    }

    /// Two-column `Field` / `Value` table
    pub fn fields() -> Self {
        Self::new(&["Field", "Value"])
    }

    /// Append one row, one cell per value
    pub fn row<I>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let cells = cells
            .into_iter()
            .map(|cell| Cell::new(&cell.to_string()))
            .collect();
        self.table.add_row(Row::new(cells));
        self
    }

    /// Append a named value to a [`ReportTable::fields`] table
    pub fn field(&mut self, name: &str, value: impl fmt::Display) -> &mut Self {
        self.row([name.to_string(), value.to_string()])
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn print(&self) {
        self.table.printstd();
    }
}

impl fmt::Display for ReportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)
    }
}
