//! Event command handlers.

use chrono::{DateTime, Utc};

use devtrail_core::{EVENTS_PATH, EventRecord, NewEvent, event_grid_spec};

use crate::cli::{EventCreateArgs, EventsArgs, EventsCommand, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

use super::{grid, util};

const CREATE_LABEL: &str = "Create event";

pub async fn handle(session: &Session, args: EventsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        EventsCommand::List(view) => {
            grid::show::<EventRecord>(session, EVENTS_PATH.into(), event_grid_spec(), &view, global)
                .await
        }
        EventsCommand::Create(create) => {
            let payload = new_event(&create)?;
            util::submit(session, EVENTS_PATH, CREATE_LABEL, &payload, global).await
        }
    }
}

fn new_event(args: &EventCreateArgs) -> Result<NewEvent, CliError> {
    let event = NewEvent::new(
        args.dev_id,
        args.user_id,
        &args.location,
        &args.company,
        &args.comment,
    );
    let Some(raw) = args.at.as_deref() else {
        return Ok(event);
    };
    let at = DateTime::parse_from_rfc3339(raw).map_err(|e| CliError::Validation {
        field: "at".into(),
        reason: format!("expected RFC 3339 time, got '{raw}': {e}"),
    })?;
    Ok(event.at(at.with_timezone(&Utc)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(at: Option<&str>) -> EventCreateArgs {
        EventCreateArgs {
            dev_id: 4,
            user_id: 2,
            location: "Lab".into(),
            company: "Acme".into(),
            comment: String::new(),
            at: at.map(str::to_owned),
        }
    }

    #[test]
    fn time_is_stored_as_utc() {
        let event = new_event(&args(Some("2024-12-13T01:59:59+02:00"))).unwrap();
        assert_eq!(event.move_time.as_deref(), Some("2024-12-12T23:59:59"));
    }

    #[test]
    fn bad_time_is_usage_error() {
        assert!(matches!(
            new_event(&args(Some("tomorrow"))),
            Err(CliError::Validation { .. })
        ));
        assert!(new_event(&args(None)).unwrap().move_time.is_none());
    }
}
