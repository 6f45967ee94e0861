//! # Weekly E-Paper Calendar Core Library
//!
//! This library renders a Monday–Friday calendar for an 800×480 monochrome
//! e-paper panel and ships the finished bitmap to the panel's firmware over
//! its HTTP command protocol.
//!
//! ## Pipeline
//!
//! 1. **Photo selection** ([`weekly_photo`]): one background photo per week,
//!    chosen by a deterministic shuffle so no photo repeats within a cycle
//! 2. **Layout** ([`layout`], [`calendar_image`]): hour grid, labels and
//!    cascaded event blocks drawn onto an 8-bit grayscale canvas
//! 3. **Dithering** ([`dither`]): grayscale → strict two-level [`dither::MonoImage`]
//! 4. **Transfer** ([`protocol`], [`uploader`]): bit packing, `'a'..'p'` nibble
//!    encoding and the `EPDw_` / `LOAD_` / `SHOW_` request sequence
//!
//! ## Core Types
//!
//! - [`Event`]: a calendar entry handed over by the calendar collaborator
//! - [`WeekIndex`]: count of 7-day periods since Monday 1970-01-05
//!
//! Every render owns its raster buffers outright, so independent renders can
//! run on separate threads while sharing the event list and photo read-only.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

pub mod calendar_image;
pub mod canvas;
pub mod config;
pub mod dither;
pub mod error;
pub mod events;
pub mod fonts;
pub mod layout;
pub mod protocol;
pub mod sample_week;
pub mod uploader;
pub mod weekly_photo;

#[cfg(test)]
mod tests;

pub use error::{CalendarError, TransportError};

/// Count of 7-day periods since the epoch Monday (1970-01-05).
pub type WeekIndex = i64;

/// A single calendar entry.
///
/// Events are read-only to the renderer. `start > end` is tolerated and
/// treated as a zero-length entry during layout.
///
/// # Example
/// ```
/// use chrono::DateTime;
/// use epaper_calendar_lib::Event;
///
/// let event = Event {
///     start: DateTime::parse_from_rfc3339("2025-07-21T09:00:00-06:00").unwrap(),
///     end: DateTime::parse_from_rfc3339("2025-07-21T10:30:00-06:00").unwrap(),
///     summary: "Budget Review".to_string(),
///     location: String::new(),
///     description: String::new(),
/// };
///
/// assert_eq!(event.weekday(), 0); // Monday
/// assert_eq!(event.start_hour(), 9.0);
/// assert_eq!(event.end_hour(), 10.5);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub summary: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

impl Event {
    /// Weekday of the start time, Monday = 0 … Sunday = 6.
    pub fn weekday(&self) -> u8 {
        self.start.weekday().num_days_from_monday() as u8
    }

    /// Start time as fractional hours of the day.
    pub fn start_hour(&self) -> f32 {
        fractional_hour(&self.start)
    }

    /// End time as fractional hours of the day.
    pub fn end_hour(&self) -> f32 {
        fractional_hour(&self.end)
    }
}

fn fractional_hour(ts: &DateTime<FixedOffset>) -> f32 {
    ts.hour() as f32 + ts.minute() as f32 / 60.0
}

/// Short labels for the five rendered columns.
pub const WEEKDAY_LABELS: [&str; 5] = ["MON", "TUE", "WED", "THU", "FRI"];
