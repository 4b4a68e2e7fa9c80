//! Column definitions, the tabular view, and the fetch-bound record grid.

mod column;
pub mod csv;
mod record;
mod table;
pub mod timefmt;

pub use column::{Accessor, Column, FilterKind, Formatter};
pub use record::{GridPhase, GridSpec, GridView, RecordGrid};
pub use table::{Sort, SortOrder, TabularView, VisibleRow};

/// Parent/child identity used for row expansion.
///
/// Rows without an id can never be parents; rows without a parent id are
/// always top-level.
pub trait GridRow {
    fn row_id(&self) -> Option<&str> {
        None
    }

    fn parent_id(&self) -> Option<&str> {
        None
    }
}
