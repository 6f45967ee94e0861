//! # Weekly Grid Layout
//!
//! Pure geometry for the Monday–Friday view: which events land in which
//! column, how concurrent events cascade, where each block sits in pixels,
//! and how event text is wrapped to a column.
//!
//! ## Visible window
//! Only 08:00–18:00 is drawn. Every event is clipped to that window before
//! any geometry is computed; events entirely outside it collapse to a
//! zero-length interval at the nearest edge and still take part in overlap
//! bookkeeping.
//!
//! ## Cascading
//! Events of one day are walked in start order while a list of active
//! intervals is maintained. Intervals that ended at or before the new start
//! are dropped, and the remaining ones that overlap the new event give its
//! offset. Back-to-back events (`end == start`) do not overlap.

use crate::{CalendarError, Event};

/// First visible hour
pub const DAY_START_HOUR: f32 = 8.0;
/// Last visible hour
pub const DAY_END_HOUR: f32 = 18.0;
/// Rows in the hour grid
pub const VISIBLE_HOURS: u32 = 10;
/// Rendered columns (Mon–Fri)
pub const WORKDAYS: usize = 5;
/// Pixels of shift and narrowing per unit of offset
pub const CASCADE_STEP: f32 = 10.0;
/// Character budget of a single-line label for events shorter than an hour
pub const SHORT_LABEL_CHARS: usize = 20;
/// Maximum wrapped lines drawn for events of an hour or more
pub const MAX_WRAPPED_LINES: usize = 3;

/// Clipped, fractional-hour view of an event
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeInterval {
    pub start_hour: f32,
    pub end_hour: f32,
}

impl TimeInterval {
    /// Clip an event to the visible window. An end before the start is
    /// pulled up to the start, giving a zero-length interval.
    pub fn clipped(event: &Event) -> Self {
        let start_hour = clip_hour(event.start_hour());
        let end_hour = clip_hour(event.end_hour()).max(start_hour);
        TimeInterval {
            start_hour,
            end_hour,
        }
    }

    pub fn duration(&self) -> f32 {
        self.end_hour - self.start_hour
    }

    fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start_hour < other.end_hour && self.end_hour > other.start_hour
    }
}

fn clip_hour(hour: f32) -> f32 {
    hour.clamp(DAY_START_HOUR, DAY_END_HOUR)
}

/// An event with its clipped interval and cascade offset
#[derive(Clone, Copy, Debug)]
pub struct PlacedEvent<'a> {
    pub event: &'a Event,
    pub interval: TimeInterval,
    pub offset: u32,
}

/// Pixel rectangle of an event block
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutRegion {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub offset: u32,
}

/// Group events into Mon–Fri columns, each sorted by start time.
/// Weekend events are dropped.
pub fn events_by_weekday(events: &[Event]) -> [Vec<&Event>; WORKDAYS] {
    let mut days: [Vec<&Event>; WORKDAYS] = Default::default();
    for event in events {
        let day = usize::from(event.weekday());
        if day < WORKDAYS {
            days[day].push(event);
        }
    }
    for day in days.iter_mut() {
        day.sort_by_key(|e| e.start);
    }
    days
}

/// Assign cascade offsets to one day's events (already sorted by start)
pub fn assign_offsets<'a>(day_events: &[&'a Event]) -> Vec<PlacedEvent<'a>> {
    let mut active: Vec<TimeInterval> = Vec::new();
    let mut placed = Vec::with_capacity(day_events.len());

    for &event in day_events {
        let interval = TimeInterval::clipped(event);
        active.retain(|a| a.end_hour > interval.start_hour);
        let offset = active.iter().filter(|a| a.overlaps(&interval)).count() as u32;
        active.push(interval);
        placed.push(PlacedEvent {
            event,
            interval,
            offset,
        });
    }

    placed
}

/// Pixel geometry of the hour grid
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub day_width: f32,
    pub hour_height: f32,
}

impl GridGeometry {
    pub fn new(width: u32, height: u32, margin: u32) -> Self {
        let margin_f = margin as f32;
        GridGeometry {
            width,
            height,
            margin,
            day_width: (width as f32 - margin_f) / WORKDAYS as f32,
            hour_height: (height as f32 - margin_f) / VISIBLE_HOURS as f32,
        }
    }

    /// Left edge of a day column
    pub fn column_x(&self, day: usize) -> f32 {
        self.margin as f32 + day as f32 * self.day_width
    }

    /// Vertical position of a (clipped) hour
    pub fn hour_y(&self, hour: f32) -> f32 {
        self.margin as f32 + (hour - DAY_START_HOUR) * self.hour_height
    }

    /// Block rectangle for an event, shifted right and narrowed by its offset
    pub fn region(&self, day: usize, interval: &TimeInterval, offset: u32) -> LayoutRegion {
        let shift = offset as f32 * CASCADE_STEP;
        let x1 = self.column_x(day);
        LayoutRegion {
            x1: x1 + shift,
            y1: self.hour_y(interval.start_hour),
            x2: x1 + self.day_width - shift,
            y2: self.hour_y(interval.end_hour),
            offset,
        }
    }

    /// Width available for wrapped text inside a block
    pub fn text_width(&self, offset: u32) -> f32 {
        (self.day_width - CASCADE_STEP) - offset as f32 * CASCADE_STEP
    }
}

impl LayoutRegion {
    /// Integer corners for drawing, rejecting non-finite geometry
    pub fn corners(&self) -> Result<(i32, i32, i32, i32), CalendarError> {
        Ok((
            to_pixel(self.x1)?,
            to_pixel(self.y1)?,
            to_pixel(self.x2)?,
            to_pixel(self.y2)?,
        ))
    }
}

/// Truncate a coordinate to a pixel, rejecting NaN and infinities
pub fn to_pixel(v: f32) -> Result<i32, CalendarError> {
    if v.is_finite() && v.abs() < i32::MAX as f32 {
        Ok(v as i32)
    } else {
        Err(CalendarError::RenderFailure(format!(
            "coordinate {} is not drawable",
            v
        )))
    }
}

/// Greedy word wrap.
///
/// Words are appended to the current line until its measured width exceeds
/// `max_width`; the overflowing word then starts the next line. A word that
/// is too wide on its own gets a line to itself and is never split.
pub fn wrap_text<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        if measure(&current.join(" ")) as f32 > max_width {
            if current.len() == 1 {
                lines.push(word.to_string());
                current.clear();
            } else {
                current.pop();
                lines.push(current.join(" "));
                current = vec![word];
            }
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines
}

/// Single-line label for events shorter than an hour: 20 characters,
/// two fewer per unit of offset.
pub fn short_label(text: &str, offset: u32) -> String {
    let budget = SHORT_LABEL_CHARS.saturating_sub(offset as usize * 2);
    text.chars().take(budget).collect()
}
