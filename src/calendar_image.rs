//! # Weekly Calendar Renderer
//!
//! Builds the final two-level image for the panel in one of two views.
//!
//! ## Photo view
//! Saturdays, Sundays and Friday evenings (from the configured cutoff hour)
//! show only the week's photo, resampled to the full panel and dithered.
//!
//! ## Week view
//! A Monday–Friday × 08:00–18:00 grid with day and hour labels and one block
//! per event. Concurrent events cascade to the right (see [`crate::layout`]).
//! Days before the current weekday are drawn in a muted gray, then the whole
//! grayscale composite is dithered and a slice of the dithered photo is
//! pasted over the past-day columns as one block.
//!
//! The photo is loaded before anything is drawn, so a missing photo aborts
//! the render without producing a partial image.

use crate::canvas::GrayCanvas;
use crate::config::Config;
use crate::dither::{dither, DitherMethod, MonoImage, INK, PAPER};
use crate::fonts::{self, FontSet};
use crate::layout::{
    assign_offsets, events_by_weekday, short_label, to_pixel, wrap_text, GridGeometry,
    PlacedEvent, MAX_WRAPPED_LINES, VISIBLE_HOURS, WORKDAYS,
};
use crate::weekly_photo::load_weekly_photo;
use crate::{CalendarError, Event, WeekIndex, WEEKDAY_LABELS};
use chrono::{Datelike, Local, Timelike};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment,
};
use embedded_graphics::text::{Baseline, Text};
use image::imageops::FilterType;
use image::DynamicImage;
use log::{debug, info};
use std::path::Path;

/// Gray used for text and borders of days that have passed
const PAST_TONE: u8 = 128;
/// Fill of event blocks on days that have passed
const PAST_FILL: u8 = 240;
/// Grid line thickness
const LINE_WIDTH: u32 = 2;
/// The weekday photo is this much narrower than the grid interior
const PHOTO_INSET: u32 = 10;
/// Extra photo columns pasted so the slice also covers the next grid line
const OVERLAY_BLEED: u32 = 8;

/// Weekday and hour the render is evaluated at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewClock {
    /// Monday = 0 … Sunday = 6
    pub weekday: u8,
    /// Hour of day, 0–23
    pub hour: u32,
}

impl ViewClock {
    /// Local wall-clock time of this process
    pub fn now() -> Self {
        let now = Local::now();
        ViewClock {
            weekday: now.weekday().num_days_from_monday() as u8,
            hour: now.hour(),
        }
    }

    /// Same hour, different weekday (for previews and tests)
    pub fn with_weekday(self, weekday: u8) -> Self {
        ViewClock { weekday, ..self }
    }
}

/// Which layout a render produces
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalendarView {
    Photo,
    Week { current_weekday: u8 },
}

/// Pick the view for a clock reading.
///
/// The cutoff is compared against the caller's clock, not the time zone of
/// the events.
pub fn choose_view(clock: ViewClock, after_hours_cutoff: u32) -> CalendarView {
    let weekend = usize::from(clock.weekday) >= WORKDAYS;
    let friday_evening = clock.weekday == 4 && clock.hour >= after_hours_cutoff;
    if weekend || friday_evening {
        CalendarView::Photo
    } else {
        CalendarView::Week {
            current_weekday: clock.weekday,
        }
    }
}

/// Gray levels of an event block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct EventTones {
    border: u8,
    fill: u8,
    text: u8,
}

impl EventTones {
    fn for_day(past: bool) -> Self {
        if past {
            EventTones {
                border: PAST_TONE,
                fill: PAST_FILL,
                text: PAST_TONE,
            }
        } else {
            EventTones {
                border: INK,
                fill: PAPER,
                text: INK,
            }
        }
    }
}

/// Calendar renderer for one panel configuration
#[derive(Clone, Debug)]
pub struct CalendarRenderer {
    grid: GridGeometry,
    fonts: FontSet,
    dithering: DitherMethod,
    after_hours_cutoff: u32,
}

impl CalendarRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            grid: GridGeometry::new(
                config.panel.width,
                config.panel.height,
                config.panel.margin,
            ),
            fonts: FontSet::resolve(&config.render.font, &config.render.header_font),
            dithering: config.render.dithering,
            after_hours_cutoff: config.render.after_hours_cutoff,
        }
    }

    pub fn with_dithering(mut self, dithering: DitherMethod) -> Self {
        self.dithering = dithering;
        self
    }

    /// Render the view selected by `clock`
    pub fn render(
        &self,
        events: &[Event],
        photo: &DynamicImage,
        clock: ViewClock,
    ) -> Result<MonoImage, CalendarError> {
        match choose_view(clock, self.after_hours_cutoff) {
            CalendarView::Photo => {
                info!(
                    "Rendering photo view (weekday {}, hour {})",
                    clock.weekday, clock.hour
                );
                Ok(self.render_photo_view(photo))
            }
            CalendarView::Week { current_weekday } => {
                info!(
                    "Rendering week view with {} events (current weekday {})",
                    events.len(),
                    current_weekday
                );
                self.render_week_view(events, photo, current_weekday)
            }
        }
    }

    /// Whole-panel photo, resized without cropping
    pub fn render_photo_view(&self, photo: &DynamicImage) -> MonoImage {
        let gray = photo
            .resize_exact(self.grid.width, self.grid.height, FilterType::Lanczos3)
            .to_luma8();
        dither(gray, self.dithering)
    }

    /// Hour grid with events, past days covered by the photo
    pub fn render_week_view(
        &self,
        events: &[Event],
        photo: &DynamicImage,
        current_weekday: u8,
    ) -> Result<MonoImage, CalendarError> {
        let mut canvas = GrayCanvas::new(self.grid.width, self.grid.height, PAPER);

        self.draw_grid(&mut canvas)?;
        self.draw_day_labels(&mut canvas, current_weekday)?;
        self.draw_hour_labels(&mut canvas)?;

        for (day, day_events) in events_by_weekday(events).iter().enumerate() {
            let past = day < usize::from(current_weekday);
            for placed in assign_offsets(day_events) {
                self.draw_event(&mut canvas, day, &placed, EventTones::for_day(past))?;
            }
        }

        let calendar = dither(canvas.into_image(), self.dithering);
        if current_weekday == 0 {
            return Ok(calendar);
        }
        Ok(self.overlay_past_days(&calendar, photo, current_weekday))
    }

    fn draw_grid(&self, canvas: &mut GrayCanvas) -> Result<(), CalendarError> {
        let stroke = PrimitiveStyle::with_stroke(Gray8::new(INK), LINE_WIDTH);
        let margin = self.grid.margin as i32;
        let bottom = self.grid.height as i32;
        let right = self.grid.width as i32;

        for day in 0..=WORKDAYS {
            let x = to_pixel(self.grid.column_x(day))?;
            Line::new(Point::new(x, margin), Point::new(x, bottom))
                .into_styled(stroke)
                .draw(canvas)
                .ok();
        }
        for row in 0..=VISIBLE_HOURS {
            let y = to_pixel(self.grid.margin as f32 + row as f32 * self.grid.hour_height)?;
            Line::new(Point::new(margin, y), Point::new(right, y))
                .into_styled(stroke)
                .draw(canvas)
                .ok();
        }
        Ok(())
    }

    fn draw_day_labels(
        &self,
        canvas: &mut GrayCanvas,
        current_weekday: u8,
    ) -> Result<(), CalendarError> {
        for (day, label) in WEEKDAY_LABELS.iter().enumerate() {
            let centre = self.grid.column_x(day) + self.grid.day_width / 2.0;
            let tone = if day < usize::from(current_weekday) {
                PAST_TONE
            } else {
                INK
            };
            let style = MonoTextStyle::new(self.fonts.header, Gray8::new(tone));
            let origin = Point::new(
                to_pixel(centre - 15.0)?,
                to_pixel(self.grid.margin as f32 - 25.0)?,
            );
            Text::with_baseline(label, origin, style, Baseline::Top)
                .draw(canvas)
                .ok();
        }
        Ok(())
    }

    fn draw_hour_labels(&self, canvas: &mut GrayCanvas) -> Result<(), CalendarError> {
        let style = MonoTextStyle::new(self.fonts.body, Gray8::new(INK));
        for row in 0..=VISIBLE_HOURS {
            let y = self.grid.margin as f32 + row as f32 * self.grid.hour_height;
            Text::with_baseline(
                &hour_label(row + 8),
                Point::new(5, to_pixel(y - 8.0)?),
                style,
                Baseline::Top,
            )
            .draw(canvas)
            .ok();
        }
        Ok(())
    }

    fn draw_event(
        &self,
        canvas: &mut GrayCanvas,
        day: usize,
        placed: &PlacedEvent<'_>,
        tones: EventTones,
    ) -> Result<(), CalendarError> {
        let region = self.grid.region(day, &placed.interval, placed.offset);
        let (x1, y1, x2, y2) = region.corners()?;

        let block = PrimitiveStyleBuilder::new()
            .stroke_color(Gray8::new(tones.border))
            .stroke_width(LINE_WIDTH)
            .stroke_alignment(StrokeAlignment::Inside)
            .fill_color(Gray8::new(tones.fill))
            .build();
        Rectangle::with_corners(Point::new(x1 + 1, y1), Point::new(x2 - 1, y2))
            .into_styled(block)
            .draw(canvas)
            .ok();

        let font = self.fonts.body;
        let style = MonoTextStyle::new(font, Gray8::new(tones.text));
        let text = format!(
            "{}{}",
            placed.event.start.format("%I:%M%p "),
            placed.event.summary
        );

        if placed.interval.duration() >= 1.0 {
            let lines = wrap_text(&text, self.grid.text_width(placed.offset), |s| {
                fonts::text_width(font, s)
            });
            let step = (fonts::line_height(font) + 2) as i32;
            for (i, line) in lines.iter().take(MAX_WRAPPED_LINES).enumerate() {
                let origin = Point::new(x1 + 5, y1 + 2 + i as i32 * step);
                Text::with_baseline(line, origin, style, Baseline::Top)
                    .draw(canvas)
                    .ok();
            }
        } else {
            let label = short_label(&text, placed.offset);
            Text::with_baseline(&label, Point::new(x1 + 5, y1 + 2), style, Baseline::Top)
                .draw(canvas)
                .ok();
        }

        debug!(
            "Day {} '{}' at ({}, {})-({}, {}) offset {}",
            day, placed.event.summary, x1, y1, x2, y2, placed.offset
        );
        Ok(())
    }

    /// Paste the left part of the dithered photo over all past-day columns
    fn overlay_past_days(
        &self,
        calendar: &MonoImage,
        photo: &DynamicImage,
        current_weekday: u8,
    ) -> MonoImage {
        let photo_width = self.grid.width - self.grid.margin - PHOTO_INSET;
        let photo_height = self.grid.height - self.grid.margin;
        let gray = photo
            .resize_exact(photo_width, photo_height, FilterType::Lanczos3)
            .to_luma8();
        let photo = dither(gray, self.dithering);

        let past_days = u32::from(current_weekday).min(WORKDAYS as u32);
        let slice_width = (past_days as f32 / WORKDAYS as f32 * photo_width as f32) as u32
            + OVERLAY_BLEED;
        let slice = photo.crop(0, 0, slice_width.min(photo_width), photo_height);
        debug!(
            "Covering {} past days with a {}x{} photo slice",
            past_days,
            slice.width(),
            slice.height()
        );
        calendar.overlay(&slice, self.grid.margin, self.grid.margin)
    }
}

/// "8AM" … "12PM" … "6PM"
fn hour_label(hour: u32) -> String {
    let period = if hour < 12 { "AM" } else { "PM" };
    let display = if hour <= 12 { hour } else { hour - 12 };
    format!("{}{}", display, period)
}

/// Load the week's photo and render. Nothing is drawn if the photo is missing.
pub fn render_calendar(
    config: &Config,
    events: &[Event],
    week: WeekIndex,
    clock: ViewClock,
) -> Result<MonoImage, CalendarError> {
    let photo = load_weekly_photo(&config.photos.dir, week)?;
    CalendarRenderer::new(config).render(events, &photo, clock)
}

/// Render and write the calendar, returning the bitmap for upload
pub fn save_calendar_image<P: AsRef<Path>>(
    config: &Config,
    events: &[Event],
    week: WeekIndex,
    clock: ViewClock,
    output: P,
) -> Result<MonoImage, CalendarError> {
    let image = render_calendar(config, events, week, clock)?;
    if let Some(parent) = output.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CalendarError::Output {
                path: parent.to_path_buf(),
                source: image::ImageError::IoError(e),
            })?;
        }
    }
    image.save(&output)?;
    info!("Saved calendar image to {}", output.as_ref().display());
    Ok(image)
}
