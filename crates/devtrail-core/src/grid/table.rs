// ── Tabular view ──
//
// Filter, sort, and tree expansion over a settled row set. The rows are
// shared with the fetch state; the view only holds indices and options.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::fetch::Rows;

use super::GridRow;
use super::column::{Column, FilterKind};
use super::csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: usize,
    pub order: SortOrder,
}

/// A row as currently displayed.
#[derive(Debug)]
pub struct VisibleRow<'a, R> {
    pub record: &'a R,
    /// 0 for top-level rows, 1 for their children, and so on.
    pub depth: usize,
    /// Number of direct children, whether or not they are shown.
    pub child_count: usize,
}

pub struct TabularView<R> {
    columns: Vec<Column<R>>,
    rows: Rows<R>,
    filters: Vec<String>,
    sort: Option<Sort>,
    expanded: bool,
}

impl<R: GridRow> TabularView<R> {
    pub fn new(columns: Vec<Column<R>>, rows: Rows<R>) -> Self {
        let filters = vec![String::new(); columns.len()];
        Self {
            columns,
            rows,
            filters,
            sort: None,
            expanded: false,
        }
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header).collect()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Total rows loaded, regardless of filters and expansion.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Displayed text of one cell. Out-of-range columns are blank.
    pub fn cell_text(&self, row: &R, column: usize) -> String {
        self.columns
            .get(column)
            .map(|c| c.display(row))
            .unwrap_or_default()
    }

    /// Position of the column with the given field or header (case-insensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| {
            c.field.eq_ignore_ascii_case(name) || c.header.eq_ignore_ascii_case(name)
        })
    }

    // ── Filtering ──

    pub fn filter(&self, column: usize) -> Option<&str> {
        self.filters
            .get(column)
            .map(String::as_str)
            .filter(|q| !q.is_empty())
    }

    /// Set the filter text of a column. Returns `false` if the column does
    /// not exist or is not filterable.
    pub fn set_filter(&mut self, column: usize, query: impl Into<String>) -> bool {
        let filterable = self
            .columns
            .get(column)
            .is_some_and(|c| c.filter == FilterKind::Text);
        match self.filters.get_mut(column) {
            Some(slot) if filterable => {
                *slot = query.into();
                true
            }
            _ => false,
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.iter_mut().for_each(String::clear);
    }

    pub fn has_filters(&self) -> bool {
        self.filters.iter().any(|q| !q.is_empty())
    }

    /// Every active filter must match the row's displayed value.
    fn matches(&self, row: &R) -> bool {
        self.columns
            .iter()
            .zip(&self.filters)
            .filter(|(_, q)| !q.is_empty())
            .all(|(col, q)| {
                col.display(row)
                    .to_lowercase()
                    .contains(&q.to_lowercase())
            })
    }

    // ── Sorting ──

    pub fn sort(&self) -> Option<Sort> {
        self.sort
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) {
        self.sort = sort.filter(|s| s.column < self.columns.len());
    }

    /// Ascending, then descending, then unsorted.
    pub fn cycle_sort(&mut self, column: usize) {
        let next = match self.sort {
            Some(Sort { column: c, order: SortOrder::Ascending }) if c == column => {
                Some(SortOrder::Descending)
            }
            Some(Sort { column: c, order: SortOrder::Descending }) if c == column => None,
            _ => Some(SortOrder::Ascending),
        };
        self.set_sort(next.map(|order| Sort { column, order }));
    }

    fn compare(&self, a: &R, b: &R) -> Ordering {
        let Some(sort) = self.sort else {
            return Ordering::Equal;
        };
        let Some(col) = self.columns.get(sort.column) else {
            return Ordering::Equal;
        };
        let ord = col.raw(a).cmp(&col.raw(b));
        match sort.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }

    fn sort_indices(&self, indices: &mut [usize]) {
        if self.sort.is_some() {
            indices.sort_by(|&a, &b| self.compare(&self.rows[a], &self.rows[b]));
        }
    }

    // ── Tree ──

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    /// Show or hide child rows. Returns the new setting.
    pub fn toggle_expanded(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    /// Rows in display order after filtering, sorting, and expansion.
    ///
    /// A row whose parent id names a row in the set is a child of it; any
    /// other row is top-level. Children are listed under their parent
    /// only while expanded. Each row is filtered on its own values.
    pub fn visible_rows(&self) -> Vec<VisibleRow<'_, R>> {
        let rows = self.rows.as_slice();
        let ids: HashSet<&str> = rows.iter().filter_map(GridRow::row_id).collect();

        let mut roots = Vec::new();
        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            match row.parent_id() {
                Some(parent) if ids.contains(parent) && row.row_id() != Some(parent) => {
                    children.entry(parent).or_default().push(idx);
                }
                _ => roots.push(idx),
            }
        }
        self.sort_indices(&mut roots);
        for group in children.values_mut() {
            self.sort_indices(group);
        }

        let mut walk = Walk {
            view: self,
            children: &children,
            visited: vec![false; rows.len()],
            out: Vec::new(),
        };
        for &idx in &roots {
            walk.visit(idx, 0, true);
        }
        // Rows caught in a parent cycle are never reached from a root.
        for idx in 0..rows.len() {
            walk.visit(idx, 0, true);
        }
        walk.out
    }

    // ── Export ──

    /// Displayed values of every visible row, in column order.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.visible_rows()
            .iter()
            .map(|v| self.columns.iter().map(|c| c.display(v.record)).collect())
            .collect()
    }

    /// Visible rows as CSV: header line first, formatted values.
    pub fn export_csv(&self) -> String {
        csv::to_csv(&self.headers(), &self.display_rows())
    }
}

struct Walk<'v, 'c, R> {
    view: &'v TabularView<R>,
    children: &'c HashMap<&'v str, Vec<usize>>,
    visited: Vec<bool>,
    out: Vec<VisibleRow<'v, R>>,
}

impl<'v, R: GridRow> Walk<'v, '_, R> {
    fn visit(&mut self, idx: usize, depth: usize, shown: bool) {
        if self.visited[idx] {
            return;
        }
        self.visited[idx] = true;

        let view = self.view;
        let children = self.children;
        let record = &view.rows[idx];
        let kids = record
            .row_id()
            .and_then(|id| children.get(id))
            .map_or(&[][..], Vec::as_slice);

        if shown && view.matches(record) {
            self.out.push(VisibleRow {
                record,
                depth,
                child_count: kids.len(),
            });
        }
        let kids_shown = shown && view.expanded;
        for &kid in kids {
            self.visit(kid, depth + 1, kids_shown);
        }
    }
}

impl<R> std::fmt::Debug for TabularView<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabularView")
            .field("columns", &self.columns)
            .field("rows", &self.rows.len())
            .field("filters", &self.filters)
            .field("sort", &self.sort)
            .field("expanded", &self.expanded)
            .finish()
    }
}
