use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lunar_birthday::{
    CalendarKind, DEFAULT_RECURRENCE_YEARS, DateParts, LeapPolicy, RecurrenceOptions, ShortMonthPolicy,
};

/// Calendar file written when no path is given.
pub const DEFAULT_OUTPUT: &str = "birthdays.ics";

/// Lunar and solar birthday calendar generator.
#[derive(Parser)]
#[command(
    name = "lunar-birthday",
    version,
    about = "Convert Chinese lunar dates and generate birthday calendars"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Convert a date between the solar and lunar calendars.
    Convert(ConvertArgs),
    /// Generate a birthday calendar for one person.
    Generate(GenerateArgs),
    /// Generate a calendar for everyone listed in a TOML file.
    Batch(BatchArgs),
}

/// Arguments for the `convert` subcommand.
#[derive(clap::Args)]
pub struct ConvertArgs {
    /// Calendar the input date is written in [default: solar]. Requires DATE.
    #[arg(long)]
    pub from: Option<CalendarKind>,

    /// Date as YYYY-MM-DD, or YYYY-LMM-DD for a lunar leap month. Defaults
    /// to today's solar date.
    pub date: Option<DateParts>,

    /// The lunar month is a leap month. Requires DATE.
    #[arg(long)]
    pub leap: bool,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `generate` subcommand.
#[derive(clap::Args)]
pub struct GenerateArgs {
    /// Name used in event titles.
    #[arg(short, long)]
    pub name: String,

    /// Calendar the birth date is written in.
    #[arg(long, default_value = "solar")]
    pub calendar: CalendarKind,

    /// Calendar the reminders follow; defaults to --calendar.
    #[arg(long)]
    pub follow: Option<CalendarKind>,

    /// Birth date as YYYY-MM-DD, or YYYY-LMM-DD for a lunar leap month.
    pub date: DateParts,

    /// The lunar birth month is a leap month.
    #[arg(long)]
    pub leap: bool,

    #[command(flatten)]
    pub recurrence: RecurrenceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the `batch` subcommand.
#[derive(clap::Args)]
pub struct BatchArgs {
    /// Path to TOML file listing people.
    pub config: PathBuf,

    /// Override output path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Merge into an existing calendar file instead of replacing it.
    #[arg(long)]
    pub append: bool,
}

/// Recurrence flags shared by generating commands.
#[derive(clap::Args)]
pub struct RecurrenceArgs {
    /// Number of years to generate.
    #[arg(long, default_value_t = DEFAULT_RECURRENCE_YEARS)]
    pub years: u16,

    /// First year to generate, in the followed calendar. Defaults to the
    /// birth year.
    #[arg(long)]
    pub start_year: Option<u16>,

    /// Only repeat a leap-month birthday in years with the same leap month.
    #[arg(long)]
    pub exact_leap: bool,

    /// Use the month's last day when the birthday does not exist that year.
    #[arg(long)]
    pub clamp: bool,
}

impl RecurrenceArgs {
    pub const fn options(&self) -> RecurrenceOptions {
        RecurrenceOptions {
            years:       self.years,
            start_year:  self.start_year,
            leap_policy: if self.exact_leap {
                LeapPolicy::Exact
            } else {
                LeapPolicy::OrdinaryFallback
            },
            short_month: if self.clamp {
                ShortMonthPolicy::LastDay
            } else {
                ShortMonthPolicy::Skip
            },
        }
    }
}

/// Output flags shared by generating commands.
#[derive(clap::Args)]
pub struct OutputArgs {
    /// Path for the calendar file.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Merge into an existing calendar file instead of replacing it.
    #[arg(long)]
    pub append: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["lunar-birthday", "generate", "-n", "Mei", "1990-L05-10"]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.calendar, CalendarKind::Solar);
        assert!(args.date.leap);
        assert_eq!(args.recurrence.options(), RecurrenceOptions::default());
        assert_eq!(args.output.output, PathBuf::from("birthdays.ics"));
        assert!(!args.output.append);
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "lunar-birthday",
            "-vv",
            "generate",
            "--name",
            "Mei",
            "--calendar",
            "lunar",
            "--follow",
            "solar",
            "1990-05-10",
            "--leap",
            "--years",
            "5",
            "--start-year",
            "2030",
            "--exact-leap",
            "--clamp",
            "-o",
            "mei.ics",
            "--append",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.follow, Some(CalendarKind::Solar));
        assert!(args.leap);
        assert_eq!(
            args.recurrence.options(),
            RecurrenceOptions {
                years:       5,
                start_year:  Some(2030),
                leap_policy: LeapPolicy::Exact,
                short_month: ShortMonthPolicy::LastDay,
            }
        );
        assert_eq!(args.output.output, PathBuf::from("mei.ics"));
        assert!(args.output.append);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["lunar-birthday", "convert", "--from", "julian", "2000-01-01"]).is_err());
        assert!(Cli::try_parse_from(["lunar-birthday", "convert", "2000/01/01"]).is_err());
    }
}
