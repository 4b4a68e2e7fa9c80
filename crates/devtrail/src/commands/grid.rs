//! Listing a record grid: fetch, apply view flags, print, export.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use devtrail_core::{
    GridPhase, GridRow, GridSpec, RecordGrid, Sort, SortOrder, TabularView,
};

use crate::cli::{GlobalOpts, GridArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

/// Load `path` into a grid, apply `args`, and print it.
pub async fn show<R>(
    session: &Session,
    path: String,
    spec: GridSpec<R>,
    args: &GridArgs,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    R: GridRow + DeserializeOwned + Serialize + Send + Sync + 'static,
{
    let client = session.backend.build_client(session.tokens.clone())?;
    let mut grid = RecordGrid::mount(client, path, spec);

    if grid.settled().await == GridPhase::Failed {
        let source = grid
            .error()
            .cloned()
            .unwrap_or_else(|| devtrail_core::RequestError::parse("request failed"));
        return Err(CliError::LoadFailed {
            message: grid.spec().failure_message.to_owned(),
            path: grid.path().to_owned(),
            source,
        });
    }

    let Some(table) = grid.table_mut() else {
        return Ok(());
    };
    apply_view(table, args)?;

    if let Some(requested) = &args.export {
        let target = session.export_path(requested);
        let rows = export(table, &target)?;
        output::print_status(
            &format!("Exported {rows} rows to {}", target.display()),
            global.quiet,
        );
    }

    let color = output::should_color(global.color, &std::io::stdout());
    let rendered = output::render_grid(global.output, table, color)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Apply filter, sort, and expansion flags.
pub fn apply_view<R: GridRow>(table: &mut TabularView<R>, args: &GridArgs) -> Result<(), CliError> {
    for raw in &args.filter {
        let (name, query) = raw.split_once('=').ok_or_else(|| CliError::Validation {
            field: "filter".into(),
            reason: format!("expected COLUMN=TEXT, got '{raw}'"),
        })?;
        let column = column(table, name)?;
        if !table.set_filter(column, query) {
            return Err(CliError::Validation {
                field: "filter".into(),
                reason: format!("column '{name}' cannot be filtered"),
            });
        }
    }

    if let Some(raw) = &args.sort {
        let (name, order) = match raw.rsplit_once(':') {
            Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => (name, SortOrder::Descending),
            Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name, SortOrder::Ascending),
            _ => (raw.as_str(), SortOrder::Ascending),
        };
        let column = column(table, name)?;
        table.set_sort(Some(Sort { column, order }));
    }

    table.set_expanded(args.expand);
    Ok(())
}

fn column<R: GridRow>(table: &TabularView<R>, name: &str) -> Result<usize, CliError> {
    table
        .column_index(name.trim())
        .ok_or_else(|| CliError::UnknownColumn {
            name: name.into(),
            available: table
                .columns()
                .iter()
                .map(|c| c.field)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Write the visible rows as CSV. Returns the number of data rows.
pub fn export<R: GridRow>(table: &TabularView<R>, target: &Path) -> Result<usize, CliError> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, table.export_csv())?;
    let rows = table.visible_rows().len();
    tracing::info!(path = %target.display(), rows, "csv exported");
    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use devtrail_core::{EventRecord, event_grid_spec};

    use super::*;

    fn table() -> TabularView<EventRecord> {
        let rows = ["Lab", "Office", "lab annex"]
            .iter()
            .enumerate()
            .map(|(i, loc)| EventRecord {
                event_id: Some(i.to_string()),
                loc_name: Some((*loc).into()),
                ..EventRecord::default()
            })
            .collect();
        TabularView::new(event_grid_spec().columns, Arc::new(rows))
    }

    #[test]
    fn flags_filter_and_sort() {
        let mut t = table();
        let args = GridArgs {
            filter: vec!["Location=LAB".into()],
            sort: Some("loc_name:desc".into()),
            ..GridArgs::default()
        };
        apply_view(&mut t, &args).unwrap();
        let locs: Vec<_> = t
            .visible_rows()
            .iter()
            .map(|v| v.record.loc_name.clone().unwrap())
            .collect();
        assert_eq!(locs, ["lab annex", "Lab"]);
    }

    #[test]
    fn unknown_column_is_usage_error() {
        let args = GridArgs {
            filter: vec!["Colour=red".into()],
            ..GridArgs::default()
        };
        let err = apply_view(&mut table(), &args).unwrap_err();
        assert!(matches!(err, CliError::UnknownColumn { .. }));
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }

    #[test]
    fn malformed_filter_is_rejected() {
        let args = GridArgs {
            filter: vec!["Location".into()],
            ..GridArgs::default()
        };
        assert!(matches!(
            apply_view(&mut table(), &args),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out").join("events.csv");
        let rows = export(&table(), &target).unwrap();
        assert_eq!(rows, 3);
        let written = std::fs::read_to_string(target).unwrap();
        assert!(written.starts_with("Email,User name,Date/Time,Location,Company,Device\n"));
        assert_eq!(written.lines().count(), 4);
    }
}
