use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::info;

use lunar_birthday::{BatchConfig, Birthday, Converter};

use crate::cli::{BatchArgs, DEFAULT_OUTPUT};
use crate::generate_cmd::write_calendar;

/// Generate one calendar for every person in a batch file.
pub fn run(args: &BatchArgs) -> Result<()> {
    let toml_str = fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read batch file: {}", args.config.display()))?;
    let config = BatchConfig::from_toml_str(&toml_str).context("failed to parse batch TOML")?;

    let converter = Converter::chinese();
    let birthdays = birthdays(&converter, &config)?;
    let output = args
        .output
        .clone()
        .or_else(|| config.output.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    info!(people = birthdays.len(), path = %output.display(), "running batch");

    let summary = write_calendar(&converter, &birthdays, &config.recurrence(), &output, args.append)?;
    println!("{summary}");
    Ok(())
}

fn birthdays(converter: &Converter<'_>, config: &BatchConfig) -> Result<Vec<Birthday>> {
    if config.people.is_empty() {
        bail!("no [[person]] entries in batch file");
    }
    config
        .people
        .iter()
        .map(|person| {
            person
                .birthday(converter.table())
                .with_context(|| format!("invalid entry for {}", person.name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use lunar_birthday::{CalendarKind, IcsCalendar};

    use super::*;

    #[test]
    fn test_batch_run_writes_configured_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("family.ics");
        let config_path = dir.path().join("family.toml");
        fs::write(
            &config_path,
            format!(
                "output = {:?}\nyears = 4\n\n\
                 [[person]]\nname = \"Mei\"\ncalendar = \"lunar\"\ndate = \"1990-L05-10\"\n\n\
                 [[person]]\nname = \"Jun\"\ncalendar = \"solar\"\nfollow = \"lunar\"\ndate = \"2000-01-01\"\n",
                output.display().to_string()
            ),
        )
        .unwrap();

        let args = BatchArgs {
            config: config_path,
            output: None,
            append: false,
        };
        run(&args).unwrap();
        assert_eq!(IcsCalendar::load(&output).unwrap().len(), 8);
    }

    #[test]
    fn test_birthdays_report_bad_entry() {
        let converter = Converter::chinese();
        let config = BatchConfig::from_toml_str(
            "[[person]]\nname = \"Mei\"\ncalendar = \"lunar\"\ndate = \"2000-L01-01\"\n",
        )
        .unwrap();
        let err = birthdays(&converter, &config).unwrap_err();
        assert!(format!("{err:#}").contains("invalid entry for Mei"));

        let empty = BatchConfig::from_toml_str("years = 3").unwrap();
        assert!(birthdays(&converter, &empty).is_err());
    }

    #[test]
    fn test_birthdays_follow_defaults_to_calendar() {
        let converter = Converter::chinese();
        let config = BatchConfig::from_toml_str(
            "[[person]]\nname = \"Jun\"\ncalendar = \"solar\"\ndate = \"1991-08-15\"\n",
        )
        .unwrap();
        let people = birthdays(&converter, &config).unwrap();
        assert_eq!(people[0].follow, CalendarKind::Solar);
    }
}
