use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use lunar_birthday::{Anchor, Birthday, Converter, DateParts, EventSink, IcsCalendar, RecurrenceOptions};

use crate::cli::GenerateArgs;

/// Generate one person's birthday calendar.
pub fn run(args: &GenerateArgs) -> Result<()> {
    let converter = Converter::chinese();
    let parts = DateParts {
        leap: args.date.leap || args.leap,
        ..args.date
    };
    let anchor = Anchor::from_parts(converter.table(), args.calendar, parts)
        .with_context(|| format!("invalid birth date for {}", args.name))?;
    let birthday = Birthday::new(args.name.clone(), anchor, args.follow.unwrap_or(args.calendar));

    let summary = write_calendar(
        &converter,
        &[birthday],
        &args.recurrence.options(),
        &args.output.output,
        args.output.append,
    )?;
    println!("{summary}");
    Ok(())
}

/// Expands `birthdays` into the calendar at `path` and returns a summary.
///
/// With `append`, everything already in the file is kept, including events
/// and components from other applications; birthday events with the same UID
/// are replaced.
pub fn write_calendar(
    converter: &Converter<'_>,
    birthdays: &[Birthday],
    options: &RecurrenceOptions,
    path: &Path,
    append: bool,
) -> Result<String> {
    let mut calendar = if append && path.exists() {
        IcsCalendar::load(path).with_context(|| format!("failed to read calendar: {}", path.display()))?
    } else {
        IcsCalendar::new()
    };
    let existing = calendar.len();

    let mut lines = Vec::with_capacity(birthdays.len() + 1);
    for birthday in birthdays {
        let report = birthday
            .events(converter, options)
            .with_context(|| format!("failed to generate events for {}", birthday.name))?;
        info!(
            name = %birthday.name,
            events = report.events.len(),
            skipped = report.skipped.len(),
            "generated birthday events"
        );
        lines.push(format!(
            "{}: {} events, {} years skipped",
            birthday.title(),
            report.events.len(),
            report.skipped.len()
        ));
        calendar.extend_events(report.events);
    }

    calendar
        .save(path, Utc::now())
        .with_context(|| format!("failed to write calendar: {}", path.display()))?;
    lines.push(format!(
        "Calendar file '{}' written with {} events ({} kept from before)",
        path.display(),
        calendar.len(),
        existing
    ));
    Ok(lines.join("\n"))
}
