//! # Weekly E-Paper Calendar Entry Point
//!
//! Renders this week's calendar (or the weekend photo) to a PNG and pushes
//! it to the panel. Without `--events` the week is rendered empty.
//!
//! ```text
//! epaper-calendar --events data/events.json
//! epaper-calendar --events data/events.json --weekday 2 --no-upload
//! epaper-calendar --upload-only data/calendar.png --device 192.168.1.200
//! epaper-calendar --examples example-calendars
//! ```

use anyhow::Context;
use chrono::{Datelike, Duration, Local};
use clap::Parser;
use env_logger::Env;
use epaper_calendar_lib::calendar_image::{save_calendar_image, ViewClock};
use epaper_calendar_lib::config::Config;
use epaper_calendar_lib::dither::{load_bitmap, DitherMethod, MonoImage};
use epaper_calendar_lib::events::load_events;
use epaper_calendar_lib::sample_week::{generate_previews, synthetic_events};
use epaper_calendar_lib::uploader::{upload_bitmap, HttpTransport};
use epaper_calendar_lib::weekly_photo::{load_weekly_photo, week_index};
use epaper_calendar_lib::WeekIndex;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "epaper-calendar", version, about = "Weekly calendar for an 800x480 e-paper panel")]
struct Cli {
    /// Configuration file (default: calendar-config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON file with this week's events
    #[arg(long, value_name = "JSON")]
    events: Option<PathBuf>,

    /// Where the rendered image is written
    #[arg(long, value_name = "PNG", default_value = "data/calendar.png")]
    output: PathBuf,

    /// Render as if today were this weekday (0 = Monday ... 6 = Sunday)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
    weekday: Option<u8>,

    /// Week index for photo selection (default: current week)
    #[arg(long, allow_negative_numbers = true)]
    week: Option<WeekIndex>,

    /// Dithering method: atkinson or floyd-steinberg
    #[arg(long)]
    dithering: Option<DitherMethod>,

    /// Panel address, overriding the configuration
    #[arg(long, value_name = "IP")]
    device: Option<String>,

    /// Render and save only
    #[arg(long)]
    no_upload: bool,

    /// Skip rendering and send an existing image
    #[arg(long, value_name = "PNG", conflicts_with_all = ["events", "examples", "no_upload"])]
    upload_only: Option<PathBuf>,

    /// Write the preview set for a synthetic week into DIR and exit
    #[arg(long, value_name = "DIR", conflicts_with = "events")]
    examples: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

async fn upload(config: &Config, bitmap: &MonoImage) -> anyhow::Result<()> {
    let mut transport = HttpTransport::new(&config.device.address)?;
    let report = upload_bitmap(&mut transport, bitmap, &config.device)
        .await
        .with_context(|| format!("uploading to {}", transport.base_url()))?;
    info!(
        "Panel accepted {} chunks ({} encoded characters)",
        report.data_chunks, report.encoded_chars
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(if cli.verbose {
        "debug"
    } else {
        "info"
    }))
    .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::load().context("loading configuration")?,
    };
    if let Some(method) = cli.dithering {
        config.render.dithering = method;
    }
    if let Some(address) = cli.device.clone() {
        config.device.address = address;
    }

    let rt = tokio::runtime::Runtime::new()?;

    if let Some(path) = &cli.upload_only {
        let bitmap = load_bitmap(
            path,
            config.panel.width,
            config.panel.height,
            config.render.dithering,
        )
        .with_context(|| format!("loading {}", path.display()))?;
        return rt.block_on(upload(&config, &bitmap));
    }

    let now = Local::now();
    let today = now.date_naive();
    let week = cli.week.unwrap_or_else(|| week_index(today));
    let mut clock = ViewClock::now();
    if let Some(weekday) = cli.weekday {
        clock = clock.with_weekday(weekday);
    }

    if let Some(dir) = &cli.examples {
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let events = synthetic_events(monday, *now.offset());
        let photo = load_weekly_photo(&config.photos.dir, week).context("loading weekly photo")?;
        let written = rt
            .block_on(generate_previews(&config, events, photo, dir, clock))
            .context("generating previews")?;
        info!("Wrote {} previews to {}", written.len(), dir.display());
        return Ok(());
    }

    let events = match &cli.events {
        Some(path) => load_events(path)?,
        None => {
            warn!("No events file given, rendering an empty week");
            Vec::new()
        }
    };

    let bitmap = save_calendar_image(&config, &events, week, clock, &cli.output)
        .context("rendering calendar")?;

    if cli.no_upload {
        info!("Upload disabled, image left at {}", cli.output.display());
        return Ok(());
    }
    rt.block_on(upload(&config, &bitmap))
}
