//! Output formatting: table, JSON, YAML, CSV, plain.
//!
//! Grids render their displayed (formatted) cells as a table or CSV; the
//! structured formats serialize the visible records themselves.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use devtrail_core::{GridRow, TabularView};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled on `stream`.
pub fn should_color(mode: ColorMode, stream: &impl IsTerminal) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stream.is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Marker drawn before child rows in table output.
const CHILD_MARKER: &str = "└ ";

// ── Render dispatchers ───────────────────────────────────────────────

/// Render the visible rows of a grid in the chosen format.
pub fn render_grid<R>(
    format: OutputFormat,
    table: &TabularView<R>,
    color: bool,
) -> Result<String, CliError>
where
    R: GridRow + Serialize,
{
    match format {
        OutputFormat::Table => Ok(render_table(table, color)),
        OutputFormat::Csv => Ok(table.export_csv().trim_end_matches('\n').to_owned()),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            let records: Vec<&R> = table.visible_rows().iter().map(|v| v.record).collect();
            render_structured(format, &records)
        }
        OutputFormat::Plain => Ok(table
            .visible_rows()
            .iter()
            .map(|v| {
                v.record
                    .row_id()
                    .map_or_else(|| table.cell_text(v.record, 0), str::to_owned)
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Render a single serde-serializable value in the chosen format.
///
/// Table and plain fall back to pretty JSON and `id_fn` respectively.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
{
    match format {
        OutputFormat::Table | OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Csv | OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    // A closed pipe (e.g. `| head`) is not an error worth reporting.
    drop(writeln!(stdout, "{output}"));
}

/// Print a status line to stderr, respecting quiet mode.
pub fn print_status(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: GridRow>(table: &TabularView<R>, color: bool) -> String {
    let mut builder = Builder::default();
    let headers = table.headers().into_iter().map(|h| {
        if color {
            h.bold().to_string()
        } else {
            h.to_owned()
        }
    });
    builder.push_record(headers);

    for visible in table.visible_rows() {
        let mut cells: Vec<String> = (0..table.columns().len())
            .map(|col| table.cell_text(visible.record, col))
            .collect();
        if let Some(first) = cells.first_mut() {
            if visible.depth > 0 {
                let indent = "  ".repeat(visible.depth - 1);
                *first = format!("{indent}{CHILD_MARKER}{first}");
            } else if visible.child_count > 0 && !table.is_expanded() {
                let more = format!("(+{})", visible.child_count);
                let more = if color { more.dimmed().to_string() } else { more };
                *first = format!("{first} {more}");
            }
        }
        builder.push_record(cells);
    }

    builder.build().with(Style::rounded()).to_string()
}

fn render_structured<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::JsonCompact => render_json(data, true),
        _ => render_json(data, false),
    }
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use devtrail_core::EventRecord;
    use devtrail_core::grid::timefmt;
    use devtrail_core::grids::event_grid_spec_with;

    use super::*;

    fn table() -> TabularView<EventRecord> {
        let rows = vec![
            EventRecord {
                event_id: Some("1".into()),
                user_email: Some("ann@example.com".into()),
                move_time: Some("2024-12-12 23:59:59".into()),
                loc_name: Some("Lab, north".into()),
                ..EventRecord::default()
            },
            EventRecord {
                event_id: Some("2".into()),
                parent_event_id: Some("1".into()),
                user_email: Some("ann@example.com".into()),
                loc_name: Some("Shelf".into()),
                ..EventRecord::default()
            },
        ];
        let spec = event_grid_spec_with(timefmt::formatter_in(Utc));
        TabularView::new(spec.columns, Arc::new(rows))
    }

    #[test]
    fn csv_uses_displayed_values() {
        let out = render_grid(OutputFormat::Csv, &table(), false).unwrap();
        assert_eq!(
            out,
            "Email,User name,Date/Time,Location,Company,Device\n\
             ann@example.com,,\"12/12/2024, 23:59\",\"Lab, north\",,"
        );
    }

    #[test]
    fn table_marks_collapsed_children() {
        let out = render_grid(OutputFormat::Table, &table(), false).unwrap();
        assert!(out.contains("ann@example.com (+1)"));
        assert!(!out.contains("Shelf"));
    }

    #[test]
    fn table_indents_expanded_children() {
        let mut t = table();
        t.set_expanded(true);
        let out = render_grid(OutputFormat::Table, &t, false).unwrap();
        assert!(out.contains("└ ann@example.com"));
        assert!(out.contains("Shelf"));
    }

    #[test]
    fn json_serializes_visible_records() {
        let out = render_grid(OutputFormat::JsonCompact, &table(), false).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["move_time"], "2024-12-12 23:59:59");
    }

    #[test]
    fn plain_prints_row_ids() {
        let mut t = table();
        t.set_expanded(true);
        assert_eq!(render_grid(OutputFormat::Plain, &t, false).unwrap(), "1\n2");
    }
}
