//! Shared helpers for command handlers.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use devtrail_core::{MutateResource, RequestState};

use crate::alert::StderrAlert;
use crate::cli::{DataArgs, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Resolve `--data` / `--from-file` into a JSON object.
pub fn read_payload(args: &DataArgs) -> Result<Value, CliError> {
    let value = match (&args.data, &args.from_file) {
        (Some(inline), _) => serde_json::from_str(inline).map_err(|e| CliError::Validation {
            field: "data".into(),
            reason: format!("invalid JSON: {e}"),
        })?,
        (None, Some(path)) => read_json_file(path)?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "data".into(),
                reason: "one of --data or --from-file is required".into(),
            });
        }
    };
    if !value.is_object() {
        return Err(CliError::Validation {
            field: "data".into(),
            reason: "payload must be a JSON object".into(),
        });
    }
    Ok(value)
}

/// POST `payload` to `path` under `label`, print the result, and map a
/// failure into an error whose alert has already been shown.
pub async fn submit<P>(
    session: &Session,
    path: &str,
    label: &str,
    payload: &P,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    P: Serialize + Sync + ?Sized,
{
    let client = session.backend.build_client(session.tokens.clone())?;
    let alerts = Arc::new(StderrAlert::new(output::should_color(
        global.color,
        &std::io::stderr(),
    )));
    let mutate = MutateResource::<Value>::new(client, path)
        .with_label(label)
        .with_alerts(alerts.clone());

    match mutate.submit(payload).await {
        RequestState::Ready(result) => {
            let rendered = output::render_single(global.output, &result, created_id)?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
        RequestState::Failed(error) => Err(CliError::Rejected {
            error,
            alerted: alerts.raised(),
        }),
        RequestState::Idle | RequestState::Loading => Ok(()),
    }
}

/// Identifier of a created record, for `--output plain`.
fn created_id(result: &Value) -> String {
    ["event_id", "dev_id", "id"]
        .iter()
        .find_map(|key| result.get(key))
        .map_or_else(String::new, |v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}
