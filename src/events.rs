//! Event hand-off file.
//!
//! The calendar collaborator writes the week's events as a JSON array:
//!
//! ```json
//! [
//!   {
//!     "start": "2025-07-21T09:00:00-06:00",
//!     "end": "2025-07-21T10:30:00-06:00",
//!     "summary": "Budget Review",
//!     "location": "Finance Conference Room"
//!   }
//! ]
//! ```
//!
//! `location` and `description` may be omitted.

use crate::{CalendarError, Event};
use log::info;
use std::fs;
use std::path::Path;

/// Read events from `path`, sorted ascending by start time
pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>, CalendarError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| CalendarError::EventSource {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut events = parse_events(&content).map_err(|e| CalendarError::EventSource {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    events.sort_by_key(|event| event.start);
    info!("Loaded {} events from {}", events.len(), path.display());
    Ok(events)
}

fn parse_events(content: &str) -> Result<Vec<Event>, serde_json::Error> {
    serde_json::from_str(content)
}
