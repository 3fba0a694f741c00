use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use lunar_birthday::{Anchor, CalendarKind, Converter, DateParts, LunarDate, SolarDate};

use crate::cli::ConvertArgs;

/// Both forms of one day.
#[derive(Debug, PartialEq, Eq, Serialize)]
struct Conversion {
    solar:      SolarDate,
    lunar:      LunarDate,
    leap_month: bool,
}

/// Convert a date and print both forms.
pub fn run(args: &ConvertArgs) -> Result<()> {
    let converter = Converter::chinese();
    let (kind, parts) = match input(args)? {
        Some(input) => input,
        None => {
            let today = SolarDate::today().context("failed to read today's date")?;
            info!(%today, "no date given, using today");
            (CalendarKind::Solar, solar_parts(today))
        }
    };

    let conversion = convert(&converter, kind, parts)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&conversion)?);
    } else {
        println!("{}", describe(&conversion));
    }
    Ok(())
}

/// Calendar and components of the given date, or `None` to use today.
fn input(args: &ConvertArgs) -> Result<Option<(CalendarKind, DateParts)>> {
    let Some(parts) = args.date else {
        if args.from.is_some() || args.leap {
            bail!("--from and --leap need a DATE; without one, today's solar date is converted");
        }
        return Ok(None);
    };
    let parts = DateParts {
        leap: parts.leap || args.leap,
        ..parts
    };
    Ok(Some((args.from.unwrap_or(CalendarKind::Solar), parts)))
}

const fn solar_parts(date: SolarDate) -> DateParts {
    DateParts {
        year:  date.year(),
        month: date.month(),
        day:   date.day(),
        leap:  false,
    }
}

fn convert(converter: &Converter<'_>, kind: CalendarKind, parts: DateParts) -> Result<Conversion> {
    let anchor = Anchor::from_parts(converter.table(), kind, parts).context("invalid input date")?;
    let (solar, lunar) = match anchor {
        Anchor::Solar(solar) => (solar, converter.solar_to_lunar(solar)?),
        Anchor::Lunar(lunar) => (converter.lunar_to_solar(lunar)?, lunar),
    };
    Ok(Conversion {
        solar,
        lunar,
        leap_month: lunar.is_leap_month(),
    })
}

fn describe(conversion: &Conversion) -> String {
    let lunar = conversion.lunar;
    format!(
        "Solar: {}\nLunar: {} (year {}, month {}, day {})",
        conversion.solar,
        lunar,
        lunar.year(),
        lunar.month(),
        lunar.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(s: &str) -> DateParts {
        s.parse().unwrap()
    }

    #[test]
    fn test_convert_both_directions() {
        let converter = Converter::chinese();
        let from_solar = convert(&converter, CalendarKind::Solar, parts("2017-07-23")).unwrap();
        let from_lunar = convert(&converter, CalendarKind::Lunar, parts("2017-L06-01")).unwrap();
        assert_eq!(from_solar, from_lunar);
        assert!(from_solar.leap_month);
        assert_eq!(
            describe(&from_solar),
            "Solar: 2017-07-23\nLunar: 2017-L06-01 (year 2017, month leap 6, day 1)"
        );
    }

    #[test]
    fn test_json_output() {
        let converter = Converter::chinese();
        let conversion = convert(&converter, CalendarKind::Solar, parts("2000-01-01")).unwrap();
        let json: serde_json::Value = serde_json::to_value(&conversion).unwrap();
        assert_eq!(json["solar"], "2000-01-01");
        assert_eq!(json["lunar"], "1999-11-25");
        assert_eq!(json["leap_month"], false);
    }

    #[test]
    fn test_convert_errors() {
        let converter = Converter::chinese();
        assert!(convert(&converter, CalendarKind::Solar, parts("1899-12-31")).is_err());
        assert!(convert(&converter, CalendarKind::Lunar, parts("2000-L01-01")).is_err());
        assert!(convert(&converter, CalendarKind::Solar, parts("2000-L01-01")).is_err());
    }

    fn args(from: Option<CalendarKind>, date: Option<&str>, leap: bool) -> ConvertArgs {
        ConvertArgs {
            from,
            date: date.map(parts),
            leap,
            json: false,
        }
    }

    #[test]
    fn test_input_resolution() {
        assert_eq!(input(&args(None, None, false)).unwrap(), None);
        assert_eq!(
            input(&args(None, Some("2000-01-01"), false)).unwrap(),
            Some((CalendarKind::Solar, parts("2000-01-01")))
        );
        assert_eq!(
            input(&args(Some(CalendarKind::Lunar), Some("2017-06-01"), true)).unwrap(),
            Some((CalendarKind::Lunar, parts("2017-L06-01")))
        );
    }

    #[test]
    fn test_flags_without_date_are_rejected() {
        for (from, leap) in [(Some(CalendarKind::Lunar), false), (Some(CalendarKind::Solar), false), (None, true)] {
            let err = input(&args(from, None, leap)).unwrap_err();
            assert!(err.to_string().contains("need a DATE"));
        }
    }

    #[test]
    fn test_solar_parts() {
        let date = SolarDate::new(2024, 2, 10).unwrap();
        assert_eq!(solar_parts(date), parts("2024-02-10"));
    }
}
