use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;

use dayplan_calendar::{parse_day_key, week_view, Event, ExpansionCache, Week};
use dayplan_core::{AppError, Config};

const USAGE: &str = "usage: dayplan <events.json> [YYYY-MM-DD]";

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(events_path) = args.next() else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };
    let anchor = args.next();

    match run(&events_path, anchor.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}\n  {}", e.user_message(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(events_path: &str, anchor: Option<&str>) -> Result<(), AppError> {
    dayplan_core::init()?;

    let (config, _) = Config::load_validated()?;

    let anchor = match anchor {
        Some(key) => parse_day_key(key)?,
        None => Local::now().date_naive(),
    };

    tracing::debug!("Reading events from {}", events_path);
    let contents = std::fs::read_to_string(events_path)?;
    let events: Vec<Event> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse events file {}", events_path))?;

    let week = Week::containing(anchor, config.calendar.week_start)?;
    let cache = ExpansionCache::new(config.calendar.cache_capacity);
    let positioned = week_view(&events, &week, config.calendar.lookahead_days, Some(&cache))?;

    tracing::info!(
        "Loaded {} events, {} visible in week of {}",
        events.len(),
        positioned.len(),
        week.first_day()
    );

    println!("Week of {}", week.first_day().format("%A %Y-%m-%d"));
    for (index, day) in week.days().iter().enumerate() {
        println!("\n{}", day.format("%a %d %b"));
        for item in positioned.iter().filter(|p| p.day_index == index) {
            let offset = item.vertical_slot as u64 * u64::from(config.ui.slot_height_px);
            println!(
                "  [slot {} @ {}px] {} ({} day{})",
                item.vertical_slot,
                offset,
                if item.event.title.is_empty() {
                    item.event.id.as_str()
                } else {
                    item.event.title.as_str()
                },
                item.column_span,
                if item.column_span == 1 { "" } else { "s" }
            );
        }
    }

    Ok(())
}
