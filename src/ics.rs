//! iCalendar output for birthday events.
//!
//! Birthday events are written as all-day `VEVENT`s: CRLF-terminated lines,
//! escaped text values, and long lines folded at 75 octets. When an existing
//! calendar is read back, events this crate generated are recognised by their
//! UID; every other property and component is kept verbatim and written out
//! again, so appending to a calendar exported from elsewhere loses nothing.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::IcsError;
use crate::solar::SolarDate;

const PRODID: &str = "-//lunar_birthday//Birthday Calendar//EN";
const UID_DOMAIN: &str = "lunar-birthday";
/// Namespace for name-based event UIDs.
const UID_NAMESPACE: Uuid = Uuid::from_u128(0x9b6f_2c1e_4d3a_5b87_a1e0_7c4f_3d2b_6e91);
const MAX_LINE_OCTETS: usize = 75;
const CRLF: &str = "\r\n";

/// One all-day reminder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BirthdayEvent {
    uid:     String,
    summary: String,
    date:    SolarDate,
}

impl BirthdayEvent {
    /// Creates an event whose UID is a version 5 UUID of the date and summary,
    /// so the same birthday always produces the same UID.
    pub fn new(summary: impl Into<String>, date: SolarDate) -> Self {
        let summary = summary.into();
        let name = Uuid::new_v5(&UID_NAMESPACE, format!("{date}/{summary}").as_bytes());
        Self {
            uid: format!("{name}@{UID_DOMAIN}"),
            summary,
            date,
        }
    }

    pub fn with_uid(uid: impl Into<String>, summary: impl Into<String>, date: SolarDate) -> Self {
        Self {
            uid: uid.into(),
            summary: summary.into(),
            date,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub const fn date(&self) -> SolarDate {
        self.date
    }
}

/// Destination for generated events.
pub trait EventSink {
    fn add_event(&mut self, event: BirthdayEvent);

    fn extend_events<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = BirthdayEvent>,
        Self: Sized,
    {
        for event in events {
            self.add_event(event);
        }
    }
}

impl EventSink for Vec<BirthdayEvent> {
    fn add_event(&mut self, event: BirthdayEvent) {
        self.push(event);
    }
}

/// A calendar of birthday events keyed by UID, plus any content read from an
/// existing file that this crate did not generate.
///
/// Adding an event whose UID is already present replaces it, which makes
/// regenerating a birthday into an existing calendar idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcsCalendar {
    events:    BTreeMap<String, BirthdayEvent>,
    /// Unfolded lines of foreign calendar properties and components, in
    /// input order.
    preserved: Vec<String>,
}

impl EventSink for IcsCalendar {
    fn add_event(&mut self, event: BirthdayEvent) {
        self.events.insert(event.uid.clone(), event);
    }
}

impl IcsCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of birthday events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Birthday events ordered by date, then UID.
    pub fn events(&self) -> Vec<&BirthdayEvent> {
        let mut events: Vec<_> = self.events.values().collect();
        events.sort_by(|a, b| (a.date, &a.uid).cmp(&(b.date, &b.uid)));
        events
    }

    /// Foreign content carried over from a parsed calendar, one unfolded
    /// line per entry.
    pub fn preserved_lines(&self) -> &[String] {
        &self.preserved
    }

    /// Adds every event of `other`; events from `other` win on UID clashes.
    /// Foreign content of `other` is appended after this calendar's.
    pub fn merge(&mut self, other: Self) {
        self.events.extend(other.events);
        self.preserved.extend(other.preserved);
    }

    /// Writes the calendar, stamping every birthday event with `stamp`.
    ///
    /// # Errors
    /// Any error from `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W, stamp: DateTime<Utc>) -> io::Result<()> {
        let stamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();
        write_line(&mut writer, "BEGIN:VCALENDAR")?;
        write_line(&mut writer, "VERSION:2.0")?;
        write_line(&mut writer, &format!("PRODID:{PRODID}"))?;
        write_line(&mut writer, "CALSCALE:GREGORIAN")?;
        for line in &self.preserved {
            write_line(&mut writer, line)?;
        }
        for event in self.events() {
            let end = event.date.succ().unwrap_or(event.date);
            write_line(&mut writer, "BEGIN:VEVENT")?;
            write_line(&mut writer, &format!("UID:{}", escape_text(&event.uid)))?;
            write_line(&mut writer, &format!("DTSTAMP:{stamp}"))?;
            write_line(&mut writer, &format!("SUMMARY:{}", escape_text(&event.summary)))?;
            write_line(&mut writer, &format!("DTSTART;VALUE=DATE:{}", ics_date(event.date)))?;
            write_line(&mut writer, &format!("DTEND;VALUE=DATE:{}", ics_date(end)))?;
            write_line(&mut writer, "TRANSP:TRANSPARENT")?;
            write_line(&mut writer, "END:VEVENT")?;
        }
        write_line(&mut writer, "END:VCALENDAR")?;
        writer.flush()
    }

    pub fn to_ics_string(&self, stamp: DateTime<Utc>) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf, stamp);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Writes the calendar to `path`, replacing any existing file.
    ///
    /// # Errors
    /// `IcsError::Io` if the file cannot be created or written.
    pub fn save(&self, path: impl AsRef<Path>, stamp: DateTime<Utc>) -> Result<(), IcsError> {
        let path = path.as_ref();
        let file = fs::File::create(path)?;
        self.write_to(io::BufWriter::new(file), stamp)?;
        debug!(
            path = %path.display(),
            events = self.len(),
            preserved = self.preserved.len(),
            "wrote calendar"
        );
        Ok(())
    }

    /// Reads an existing calendar file.
    ///
    /// # Errors
    /// `IcsError::Io` if the file cannot be read, `IcsError::Malformed` if it
    /// does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IcsError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses iCalendar text.
    ///
    /// `VEVENT`s whose UID was generated by [`BirthdayEvent::new`] become
    /// birthday events. `VERSION`, `PRODID` and `CALSCALE` are dropped since
    /// they are written again. Everything else is preserved verbatim.
    ///
    /// # Errors
    /// `IcsError::Malformed` when the text is not a single `VCALENDAR`, a
    /// component is unterminated, a line has no `:`, or a birthday event
    /// lacks a valid `DTSTART` date.
    pub fn parse(input: &str) -> Result<Self, IcsError> {
        let mut lines = unfold(input).into_iter().filter(|(_, line)| !line.is_empty());

        match lines.next() {
            Some((_, line)) if line.eq_ignore_ascii_case("BEGIN:VCALENDAR") => {}
            Some((number, _)) => return Err(malformed(number, "expected BEGIN:VCALENDAR")),
            None => return Err(malformed(0, "empty calendar")),
        }

        let mut calendar = Self::new();
        let mut component: Option<RawComponent> = None;
        let mut closed = false;
        for (number, line) in lines {
            let (name, value) = property(number, &line)?;

            if component.is_some() {
                if let Some(raw) = component.take_if(|raw| raw.push(number, &name, line)) {
                    calendar.absorb(raw)?;
                }
                continue;
            }

            match name.as_str() {
                "BEGIN" => component = Some(RawComponent::new(number, &value, line)),
                "END" if value.eq_ignore_ascii_case("VCALENDAR") => {
                    closed = true;
                    break;
                }
                "END" => return Err(malformed(number, format!("unexpected END:{value}"))),
                "VERSION" | "PRODID" | "CALSCALE" => {}
                _ => calendar.preserved.push(line),
            }
        }

        if let Some(raw) = component {
            return Err(malformed(raw.start, format!("unterminated {}", raw.kind)));
        }
        if !closed {
            return Err(malformed(input.lines().count(), "missing END:VCALENDAR"));
        }
        Ok(calendar)
    }

    /// Files a completed component as a birthday event or as foreign content.
    fn absorb(&mut self, raw: RawComponent) -> Result<(), IcsError> {
        if raw.kind == "VEVENT" {
            if let Some(event) = raw.birthday_event()? {
                self.add_event(event);
                return Ok(());
            }
        }
        self.preserved.extend(raw.lines.into_iter().map(|(_, line)| line));
        Ok(())
    }
}

/// A component read line by line, nested components included.
struct RawComponent {
    start: usize,
    kind:  String,
    depth: usize,
    lines: Vec<(usize, String)>,
}

impl RawComponent {
    fn new(start: usize, kind: &str, line: String) -> Self {
        Self {
            start,
            kind: kind.to_ascii_uppercase(),
            depth: 1,
            lines: vec![(start, line)],
        }
    }

    /// Adds a line; returns `true` once the component's own `END` is reached.
    fn push(&mut self, number: usize, name: &str, line: String) -> bool {
        self.lines.push((number, line));
        match name {
            "BEGIN" => self.depth += 1,
            "END" => self.depth -= 1,
            _ => {}
        }
        self.depth == 0
    }

    /// Reads the event as a [`BirthdayEvent`] if its UID marks it as one.
    fn birthday_event(&self) -> Result<Option<BirthdayEvent>, IcsError> {
        let mut uid = None;
        let mut summary = None;
        let mut date = None;
        let mut depth = 0_usize;
        for (number, line) in &self.lines {
            let (name, value) = property(*number, line)?;
            match name.as_str() {
                "BEGIN" => depth += 1,
                "END" => depth = depth.saturating_sub(1),
                _ if depth != 1 => {}
                "UID" => uid = Some(unescape_text(&value)),
                "SUMMARY" => summary = Some(unescape_text(&value)),
                "DTSTART" => date = Some((*number, value)),
                _ => {}
            }
        }

        let Some(uid) = uid.filter(|uid| is_generated_uid(uid)) else {
            return Ok(None);
        };
        let end = self.lines.last().map_or(self.start, |(number, _)| *number);
        let (line, value) = date.ok_or_else(|| malformed(end, "birthday event without DTSTART"))?;
        let date = parse_date(line, &value)?;
        Ok(Some(BirthdayEvent::with_uid(uid, summary.unwrap_or_default(), date)))
    }
}

/// Splits a content line into its upper-cased name, without parameters, and
/// its value.
fn property(number: usize, line: &str) -> Result<(String, String), IcsError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| malformed(number, "missing ':' separator"))?;
    let name = name.split(';').next().unwrap_or(name).to_ascii_uppercase();
    Ok((name, value.to_owned()))
}

fn is_generated_uid(uid: &str) -> bool {
    uid.strip_suffix(UID_DOMAIN)
        .and_then(|rest| rest.strip_suffix('@'))
        .is_some_and(|name| Uuid::parse_str(name).is_ok())
}

fn malformed(line: usize, reason: impl Into<String>) -> IcsError {
    IcsError::Malformed {
        line,
        reason: reason.into(),
    }
}

fn ics_date(date: SolarDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}

/// Reads `YYYYMMDD`, ignoring any time part that follows.
fn parse_date(line: usize, value: &str) -> Result<SolarDate, IcsError> {
    let digits = value.trim().get(..8).filter(|d| d.bytes().all(|b| b.is_ascii_digit()));
    let Some(digits) = digits else {
        return Err(malformed(line, format!("invalid date value {value:?}")));
    };
    let field = |range: std::ops::Range<usize>| digits[range].parse::<u16>().unwrap_or_default();
    let (year, month, day) = (field(0..4), field(4..6), field(6..8));
    // Both values come from two ASCII digits, so they are below 100.
    SolarDate::new(year, month as u8, day as u8).map_err(|e| malformed(line, e.to_string()))
}

fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(fold_line(line).as_bytes())?;
    writer.write_all(CRLF.as_bytes())
}

/// Splits `line` into chunks of at most 75 octets, joined by CRLF and a
/// leading space. Never splits inside a UTF-8 sequence.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_owned();
    }
    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    for ch in line.chars() {
        // Continuation lines spend one octet on the leading space.
        if width + ch.len_utf8() > MAX_LINE_OCTETS {
            folded.push_str(CRLF);
            folded.push(' ');
            width = 1;
        }
        folded.push(ch);
        width += ch.len_utf8();
    }
    folded
}

/// Joins folded lines, keeping the 1-based number of each logical line's
/// first physical line.
fn unfold(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        match (raw.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(rest), Some((_, last))) => last.push_str(rest),
            _ => lines.push((index + 1, raw.to_owned())),
        }
    }
    lines
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn unescape_text(value: &str) -> String {
    let mut text = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            text.push(ch);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => text.push('\n'),
            Some(other) => text.push(other),
            None => text.push('\\'),
        }
    }
    text
}
