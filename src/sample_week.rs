//! Synthetic example week and the preview set rendered from it.

use crate::calendar_image::{CalendarRenderer, ViewClock};
use crate::config::Config;
use crate::dither::DitherMethod;
use crate::{CalendarError, Event};
use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime};
use image::DynamicImage;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// (hour, minute, minutes, summary, description, location)
type SampleMeeting = (u32, u32, i64, &'static str, &'static str, &'static str);

const SAMPLE_MEETINGS: [[SampleMeeting; 3]; 5] = [
    [
        (8, 0, 60, "Team Standup Meeting", "Daily team synchronization and progress updates", "Conference Room A"),
        (13, 0, 90, "Client Presentation", "Quarterly business review with key stakeholders", "Board Room"),
        (16, 0, 60, "Project Planning Session", "Planning for upcoming product launch initiatives", "Meeting Room B"),
    ],
    [
        (9, 0, 90, "Budget Review Meeting", "Monthly financial review and budget allocation", "Finance Conference Room"),
        (11, 0, 60, "Marketing Strategy Discussion", "Q3 marketing campaign planning and strategy alignment", "Marketing Office"),
        (14, 0, 90, "Technical Architecture Review", "System design review and technical documentation", "Tech Lab"),
    ],
    [
        (8, 0, 60, "Department All-Hands", "Weekly department updates and announcements", "Main Auditorium"),
        (11, 30, 90, "Vendor Negotiation Call", "Contract terms discussion with software vendor", "Phone Conference"),
        (15, 0, 90, "User Experience Workshop", "Design thinking session for new user interface", "Design Studio"),
    ],
    [
        (8, 30, 90, "Quality Assurance Review", "Testing protocols and quality standards assessment", "QA Lab"),
        (12, 0, 90, "Customer Feedback Session", "Review of customer surveys and feedback analysis", "Customer Success Office"),
        (14, 30, 90, "Security Audit Meeting", "IT security review and compliance discussion", "IT Security Room"),
    ],
    [
        (9, 0, 90, "Product Development Sync", "Feature prioritization and development roadmap", "Product Office"),
        (13, 30, 90, "HR Policy Training", "Updated workplace policies and procedures training", "Training Room C"),
        (16, 0, 60, "Weekly Retrospective", "Team reflection on achievements and improvements", "Collaboration Space"),
    ],
];

/// Sample meetings for Monday `week_start` through Friday, in `offset`
pub fn synthetic_events(week_start: NaiveDate, offset: FixedOffset) -> Vec<Event> {
    let mut events = Vec::new();
    for (day, meetings) in SAMPLE_MEETINGS.iter().enumerate() {
        let date = week_start + Duration::days(day as i64);
        for &(hour, minute, minutes, summary, description, location) in meetings {
            let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) else {
                continue;
            };
            let Some(start) = date.and_time(time).and_local_timezone(offset).single() else {
                continue;
            };
            events.push(Event {
                start,
                end: start + Duration::minutes(minutes),
                summary: summary.to_string(),
                location: location.to_string(),
                description: description.to_string(),
            });
        }
    }
    events
}

/// One preview file and how to render it
struct PreviewJob {
    file_name: String,
    dithering: DitherMethod,
    clock: ViewClock,
}

fn preview_jobs(clock: ViewClock) -> Vec<PreviewJob> {
    let mut jobs = vec![
        PreviewJob {
            file_name: "floyd-steinberg-calendar.png".to_string(),
            dithering: DitherMethod::FloydSteinberg,
            clock,
        },
        PreviewJob {
            file_name: "atkinson-calendar.png".to_string(),
            dithering: DitherMethod::Atkinson,
            clock,
        },
    ];
    for weekday in 0..6u8 {
        jobs.push(PreviewJob {
            file_name: format!("day-{}-calendar.png", weekday),
            dithering: DitherMethod::Atkinson,
            clock: clock.with_weekday(weekday),
        });
    }
    jobs
}

/// Render the preview set into `out_dir`, one blocking task per image.
///
/// Weekday previews keep the hour of `clock`, so the Friday preview shows the
/// photo view when generated after the cutoff.
pub async fn generate_previews(
    config: &Config,
    events: Vec<Event>,
    photo: DynamicImage,
    out_dir: &Path,
    clock: ViewClock,
) -> Result<Vec<PathBuf>, CalendarError> {
    std::fs::create_dir_all(out_dir).map_err(|e| CalendarError::Output {
        path: out_dir.to_path_buf(),
        source: image::ImageError::IoError(e),
    })?;

    let events = Arc::new(events);
    let photo = Arc::new(photo);
    let renderer = CalendarRenderer::new(config);
    let mut tasks = JoinSet::new();

    for job in preview_jobs(clock) {
        let events = Arc::clone(&events);
        let photo = Arc::clone(&photo);
        let renderer = renderer.clone().with_dithering(job.dithering);
        let path = out_dir.join(&job.file_name);
        tasks.spawn_blocking(move || -> Result<PathBuf, CalendarError> {
            let image = renderer.render(&events, &photo, job.clock)?;
            image.save(&path)?;
            Ok(path)
        });
    }

    let mut written = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let path = joined
            .map_err(|e| CalendarError::RenderFailure(format!("preview task failed: {}", e)))??;
        info!("Wrote preview {}", path.display());
        written.push(path);
    }
    written.sort();
    Ok(written)
}
