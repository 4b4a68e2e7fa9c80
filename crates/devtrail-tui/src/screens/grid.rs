//! Grid screen: one [`RecordGrid`] shown as a table with column filters,
//! sort, row expansion, CSV export, and an optional drill-down on Enter.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use serde::de::DeserializeOwned;
use throbber_widgets_tui::{Throbber, ThrobberState};
use tracing::{info, warn};

use devtrail_core::{
    BackendClient, FilterKind, GridPhase, GridRow, GridSpec, GridView, RecordGrid, SortOrder,
    TabularView,
};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::screen::ScreenId;
use crate::theme;

/// Builds the action fired by Enter on a row, if any.
pub type SelectAction<R> = fn(&R) -> Option<Action>;

const PAGE: isize = 10;

pub struct GridScreen<R> {
    screen: ScreenId,
    focused: bool,
    client: Arc<BackendClient>,
    spec: GridSpec<R>,
    grid: Option<RecordGrid<R>>,
    subtitle: Option<String>,
    /// Shown while no resource path is bound.
    placeholder: &'static str,
    selected: usize,
    column: usize,
    /// Query being typed for the cursor column.
    filter_input: Option<String>,
    throbber: ThrobberState,
    export_dir: PathBuf,
    on_select: Option<SelectAction<R>>,
}

impl<R> GridScreen<R>
where
    R: GridRow + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(
        screen: ScreenId,
        client: Arc<BackendClient>,
        spec: GridSpec<R>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            screen,
            focused: false,
            client,
            spec,
            grid: None,
            subtitle: None,
            placeholder: "",
            selected: 0,
            column: 0,
            filter_input: None,
            throbber: ThrobberState::default(),
            export_dir,
            on_select: None,
        }
    }

    pub fn on_select(mut self, action: SelectAction<R>) -> Self {
        self.on_select = Some(action);
        self
    }

    pub fn placeholder(mut self, text: &'static str) -> Self {
        self.placeholder = text;
        self
    }

    /// Bind to `path`, mounting the grid on first use. Rebinding to the
    /// path already shown keeps the current rows.
    pub fn open(&mut self, path: &str, subtitle: Option<String>) {
        match &mut self.grid {
            Some(grid) => {
                if grid.set_path(path).is_some() {
                    self.reset_cursor();
                }
            }
            None => {
                self.grid = Some(RecordGrid::mount(
                    Arc::clone(&self.client),
                    path,
                    self.spec.clone(),
                ));
            }
        }
        self.subtitle = subtitle;
    }

    #[cfg(test)]
    fn bind(mut self, grid: RecordGrid<R>) -> Self {
        self.grid = Some(grid);
        self
    }

    fn reset_cursor(&mut self) {
        self.selected = 0;
        self.filter_input = None;
    }

    fn table(&self) -> Option<&TabularView<R>> {
        self.grid.as_ref().and_then(RecordGrid::table)
    }

    fn table_mut(&mut self) -> Option<&mut TabularView<R>> {
        self.grid.as_mut().and_then(RecordGrid::table_mut)
    }

    fn visible_len(&self) -> usize {
        self.table().map_or(0, |t| t.visible_rows().len())
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.visible_len().saturating_sub(1));
    }

    fn move_selection(&mut self, delta: isize) {
        self.selected = self.selected.saturating_add_signed(delta);
        self.clamp_selection();
    }

    fn move_column(&mut self, delta: isize) {
        let count = self.table().map_or(0, |t| t.columns().len());
        self.column = self
            .column
            .saturating_add_signed(delta)
            .min(count.saturating_sub(1));
    }

    fn selected_action(&self) -> Option<Action> {
        let select = self.on_select?;
        let table = self.table()?;
        let rows = table.visible_rows();
        rows.get(self.selected).and_then(|row| select(row.record))
    }

    fn reload(&mut self) {
        if let Some(grid) = &mut self.grid {
            // Detached: progress is observed through the grid phase.
            drop(grid.resource().fetch());
            grid.sync();
        }
    }

    fn start_filter(&mut self) -> Option<Action> {
        let table = self.table()?;
        let column = table.columns().get(self.column)?;
        if column.filter == FilterKind::None {
            return Some(Action::Notify(Notification::info(format!(
                "{} cannot be filtered",
                column.header
            ))));
        }
        let current = table.filter(self.column).unwrap_or_default().to_owned();
        self.filter_input = Some(current);
        None
    }

    fn apply_filter(&mut self) {
        let column = self.column;
        let query = self.filter_input.clone().unwrap_or_default();
        if let Some(table) = self.table_mut() {
            table.set_filter(column, query);
        }
        self.selected = 0;
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Option<Action> {
        let input = self.filter_input.as_mut()?;
        match key.code {
            KeyCode::Enter => self.filter_input = None,
            KeyCode::Esc => {
                input.clear();
                self.apply_filter();
                self.filter_input = None;
            }
            KeyCode::Backspace => {
                input.pop();
                self.apply_filter();
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.apply_filter();
            }
            _ => {}
        }
        None
    }

    fn toggle_expanded(&mut self) -> Option<Action> {
        let expanded = self.table_mut()?.toggle_expanded();
        self.clamp_selection();
        let message = if expanded { "Rows expanded" } else { "Rows collapsed" };
        Some(Action::Notify(Notification::info(message)))
    }

    /// File the current view exports to: the resource path flattened into
    /// a name under the export directory.
    fn export_target(&self) -> Option<PathBuf> {
        let path = self.grid.as_ref()?.path();
        let stem = path.trim_matches('/').replace('/', "-");
        Some(self.export_dir.join(format!("{stem}.csv")))
    }

    fn export_csv(&self) -> Action {
        let (Some(table), Some(target)) = (self.table(), self.export_target()) else {
            return Action::Notify(Notification::error("Nothing to export yet"));
        };
        match write_csv(table, &target) {
            Ok(count) => {
                info!(path = %target.display(), rows = count, "exported grid");
                Action::Notify(Notification::success(format!(
                    "Exported {count} rows to {}",
                    target.display()
                )))
            }
            Err(e) => {
                warn!(path = %target.display(), error = %e, "export failed");
                Action::Notify(Notification::error(format!("Export failed: {e}")))
            }
        }
    }

    fn render_title(&self) -> String {
        let mut title = format!(" {}", self.spec.title);
        if let Some(subtitle) = &self.subtitle {
            title.push_str(" · ");
            title.push_str(subtitle);
        }
        if let Some(table) = self.table() {
            title.push_str(&format!(" ({}/{})", self.visible_len(), table.len()));
        }
        title.push(' ');
        title
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, table: &TabularView<R>) {
        let visible = table.visible_rows();
        if visible.is_empty() {
            let text = if table.has_filters() {
                "No rows match the current filters."
            } else {
                "No rows."
            };
            frame.render_widget(Paragraph::new(Span::styled(text, theme::key_hint())), area);
            return;
        }

        let header = Row::new(table.columns().iter().enumerate().map(|(i, column)| {
            let mut label = column.header.to_owned();
            if let Some(sort) = table.sort().filter(|s| s.column == i) {
                label.push_str(match sort.order {
                    SortOrder::Ascending => " ▲",
                    SortOrder::Descending => " ▼",
                });
            }
            if table.filter(i).is_some() {
                label.push_str(" *");
            }
            let style = if i == self.column {
                theme::table_header_cursor()
            } else {
                theme::table_header()
            };
            Cell::from(label).style(style)
        }));

        let rows = visible.iter().map(|row| {
            let cells = (0..table.columns().len()).map(|i| {
                let text = table.cell_text(row.record, i);
                if i > 0 {
                    return Cell::from(text);
                }
                if row.depth > 0 {
                    Cell::from(format!("{}└ {text}", "  ".repeat(row.depth - 1)))
                } else if row.child_count > 0 && !table.is_expanded() {
                    Cell::from(format!("{text} (+{})", row.child_count))
                } else {
                    Cell::from(text)
                }
            });
            let style = if row.depth > 0 {
                theme::table_child_row()
            } else {
                theme::table_row()
            };
            Row::new(cells).style(style)
        });

        let widths = table.columns().iter().map(|c| Constraint::Fill(c.flex));
        let widget = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("▶ ");

        let mut state = TableState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(widget, area, &mut state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        if let Some(query) = &self.filter_input {
            let header = self
                .table()
                .and_then(|t| t.columns().get(self.column))
                .map_or("", |c| c.header);
            let line = Line::from(vec![
                Span::styled(format!(" Filter {header}: "), Style::default().fg(theme::ELECTRIC_PURPLE)),
                Span::styled(query.as_str(), Style::default().fg(theme::NEON_CYAN)),
                Span::styled("█", Style::default().fg(theme::NEON_CYAN)),
                Span::styled("  Enter keep  Esc clear", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let phase = self.grid.as_ref().map(RecordGrid::phase);
        let mut hints: Vec<(&str, &str)> = Vec::new();
        if phase == Some(GridPhase::Ready) {
            hints.extend([
                ("j/k", "move"),
                ("h/l", "column"),
                ("/", "filter"),
                ("c", "clear"),
                ("s", "sort"),
                ("x", "Expand rows"),
                ("e", "Export CSV"),
            ]);
            if self.on_select.is_some() {
                hints.push(("Enter", "device"));
            }
        }
        if phase.is_some() {
            hints.push(("r", "reload"));
        }

        let spans: Vec<Span> = hints
            .into_iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(format!("  {key} "), theme::key_hint_key()),
                    Span::styled(label, theme::key_hint()),
                ]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Write the table's CSV export to `target`. Returns the number of rows.
fn write_csv<R: GridRow>(table: &TabularView<R>, target: &Path) -> std::io::Result<usize> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, table.export_csv())?;
    Ok(table.visible_rows().len())
}

impl<R> Component for GridScreen<R>
where
    R: GridRow + DeserializeOwned + Send + Sync + 'static,
{
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.filter_input.is_some() {
            return Ok(self.handle_filter_key(key));
        }

        let ready = self
            .grid
            .as_ref()
            .is_some_and(|g| g.phase() == GridPhase::Ready);
        if !ready {
            if key.code == KeyCode::Char('r') {
                self.reload();
            }
            return Ok(None);
        }

        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(PAGE);
                None
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-PAGE);
                None
            }
            KeyCode::Char('g') => {
                self.selected = 0;
                None
            }
            KeyCode::Char('G') => {
                self.selected = self.visible_len().saturating_sub(1);
                None
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.move_column(-1);
                None
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.move_column(1);
                None
            }
            KeyCode::Char('/') => self.start_filter(),
            KeyCode::Char('c') => {
                if let Some(table) = self.table_mut() {
                    table.clear_filters();
                }
                self.clamp_selection();
                None
            }
            KeyCode::Char('s') => {
                let column = self.column;
                if let Some(table) = self.table_mut() {
                    table.cycle_sort(column);
                }
                None
            }
            KeyCode::Char('x') => self.toggle_expanded(),
            KeyCode::Char('e') => Some(self.export_csv()),
            KeyCode::Char('r') => {
                self.reload();
                None
            }
            KeyCode::Enter => self.selected_action(),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => {
                if let Some(grid) = &mut self.grid {
                    if grid.sync() == GridPhase::Loading {
                        self.throbber.calc_next();
                    }
                    self.clamp_selection();
                }
            }
            Action::OpenGrid {
                screen,
                path,
                subtitle,
            } if *screen == self.screen => {
                self.open(path, subtitle.clone());
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(self.render_title())
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
        let (body, footer) = (layout[0], layout[1]);

        match self.grid.as_ref().map(RecordGrid::view) {
            None => {
                frame.render_widget(
                    Paragraph::new(Span::styled(self.placeholder, theme::key_hint())),
                    body,
                );
            }
            Some(GridView::Loading(message)) => {
                let throbber = Throbber::default()
                    .label(message)
                    .style(Style::default().fg(theme::NEON_CYAN))
                    .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
                let row = Layout::vertical([Constraint::Length(1)]).split(body)[0];
                frame.render_stateful_widget(throbber, row, &mut self.throbber.clone());
            }
            Some(GridView::Failed(message)) => {
                frame.render_widget(Paragraph::new(message).style(theme::failure()), body);
            }
            Some(GridView::Ready(table)) => self.render_table(frame, body, table),
        }

        self.render_footer(frame, footer);
    }

    fn captures_input(&self) -> bool {
        self.filter_input.is_some()
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        self.spec.title
    }
}
