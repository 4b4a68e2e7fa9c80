// ── Column definitions ──
//
// A column reads its raw value through a typed accessor and optionally
// formats it for display. Filtering and export both see the formatted
// value; sorting uses the raw one.

use std::fmt;
use std::sync::Arc;

/// Reads a column's raw value from a row. `None` renders as an empty cell.
pub type Accessor<R> = fn(&R) -> Option<&str>;

/// Turns a raw value into its display string.
pub type Formatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How a column can be filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// Case-insensitive substring match on the displayed value.
    #[default]
    Text,
    /// Column cannot be filtered.
    None,
}

pub struct Column<R> {
    /// Stable identifier (backend field name), used by CLI flags.
    pub field: &'static str,
    /// Header text.
    pub header: &'static str,
    pub filter: FilterKind,
    /// Relative width weight.
    pub flex: u16,
    accessor: Accessor<R>,
    formatter: Option<Formatter>,
}

impl<R> Column<R> {
    pub fn new(field: &'static str, header: &'static str, accessor: Accessor<R>) -> Self {
        Self {
            field,
            header,
            filter: FilterKind::Text,
            flex: 1,
            accessor,
            formatter: None,
        }
    }

    pub fn flex(mut self, flex: u16) -> Self {
        self.flex = flex;
        self
    }

    pub fn filter(mut self, filter: FilterKind) -> Self {
        self.filter = filter;
        self
    }

    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// The raw value as stored in the row.
    pub fn raw<'r>(&self, row: &'r R) -> Option<&'r str> {
        (self.accessor)(row)
    }

    /// The value shown in the cell.
    pub fn display(&self, row: &R) -> String {
        match (self.raw(row), &self.formatter) {
            (Some(raw), Some(format)) => format(raw),
            (Some(raw), None) => raw.to_owned(),
            (None, _) => String::new(),
        }
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            field: self.field,
            header: self.header,
            filter: self.filter,
            flex: self.flex,
            accessor: self.accessor,
            formatter: self.formatter.clone(),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("field", &self.field)
            .field("header", &self.header)
            .field("filter", &self.filter)
            .field("flex", &self.flex)
            .field("formatted", &self.formatter.is_some())
            .finish()
    }
}
