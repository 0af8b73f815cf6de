//! A single labeled span of time.
//!
//! Intervals are the agenda equivalent of an appointment: a begin and end
//! instant on a calendar day plus free-form label text. They are immutable;
//! `intersect` and `union` build new values.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, AgendaResult};

/// A calendar date combined with a wall-clock time of day.
pub type Instant = NaiveDateTime;

const DATE_FORMAT: &str = "%Y.%m.%d";
const TIME_FORMAT: &str = "%H:%M";

/// A labeled, non-empty time span.
///
/// Instants are kept to the minute: seconds are truncated on construction.
/// Labels are trimmed, `|` becomes `/` and control characters (line breaks,
/// tabs) become spaces, so every interval prints as a line that parses back
/// to an equal interval.
///
/// Equality compares begin, end and label. Use [`Interval::same_span`] to
/// compare time coverage only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalRepr")]
pub struct Interval {
    begin: Instant,
    end: Instant,
    label: String,
}

/// Unchecked wire form, validated through [`Interval::from_instants`].
#[derive(Deserialize)]
struct IntervalRepr {
    begin: Instant,
    end: Instant,
    #[serde(default)]
    label: String,
}

impl TryFrom<IntervalRepr> for Interval {
    type Error = AgendaError;

    fn try_from(repr: IntervalRepr) -> AgendaResult<Self> {
        Interval::from_instants(repr.begin, repr.end, repr.label)
    }
}

impl Interval {
    /// Create an interval on `day` from `begin` to `end`.
    ///
    /// Fails with [`AgendaError::InvalidRange`] unless `begin < end`.
    pub fn new(
        day: NaiveDate,
        begin: NaiveTime,
        end: NaiveTime,
        label: impl Into<String>,
    ) -> AgendaResult<Self> {
        Self::from_instants(day.and_time(begin), day.and_time(end), label)
    }

    /// Create an interval from two full instants. The endpoints may fall on
    /// different days (e.g. a block ending at the following midnight).
    ///
    /// Both instants are truncated to the minute before `begin < end` is
    /// checked, so a span shorter than a minute is an invalid range.
    pub fn from_instants(
        begin: Instant,
        end: Instant,
        label: impl Into<String>,
    ) -> AgendaResult<Self> {
        let (begin, end) = (to_minute(begin), to_minute(end));
        if begin >= end {
            return Err(AgendaError::InvalidRange { begin, end });
        }
        Ok(Self::spanning(begin, end, label.into()))
    }

    /// Caller guarantees `begin < end`, both on whole minutes.
    pub(crate) fn spanning(begin: Instant, end: Instant, label: String) -> Self {
        debug_assert!(begin < end, "interval must be non-empty");
        Interval {
            begin,
            end,
            label: clean_label(label),
        }
    }

    /// Parse the canonical text form `YYYY.MM.DD HH:MM HH:MM | label`.
    pub fn parse(line: &str) -> AgendaResult<Self> {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() != 2 {
            return Err(AgendaError::parse(
                line,
                "interval literal requires exactly one '|' before the label",
            ));
        }
        let label = fields[1].trim();

        let timespec: Vec<&str> = fields[0].split_whitespace().collect();
        let [date_text, begin_text, end_text] = timespec[..] else {
            return Err(AgendaError::parse(
                line,
                "interval literal must start with date, time, time separated by blanks",
            ));
        };

        let day = parse_day(date_text).ok_or_else(|| {
            AgendaError::parse(
                line,
                format!("date '{date_text}' should be YYYY.MM.DD (year.month.day)"),
            )
        })?;
        let begin = parse_clock(line, begin_text)?;
        let end = parse_clock(line, end_text)?;

        Interval::new(day, begin, end, label)
            .map_err(|_| AgendaError::parse(line, "interval end must be after begin"))
    }

    pub fn begin(&self) -> Instant {
        self.begin
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Calendar day the interval begins on.
    pub fn day(&self) -> NaiveDate {
        self.begin.date()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.begin
    }

    /// True iff this interval is done by the time `other` begins.
    /// Touching endpoints count as preceding.
    pub fn precedes(&self, other: &Interval) -> bool {
        self.end <= other.begin
    }

    /// True iff `other` is done by the time this interval begins.
    pub fn follows(&self, other: &Interval) -> bool {
        other.precedes(self)
    }

    /// True iff the two spans share a non-zero duration.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.precedes(other) && !other.precedes(self)
    }

    /// Compare time coverage, ignoring labels.
    pub fn same_span(&self, other: &Interval) -> bool {
        self.begin == other.begin && self.end == other.end
    }

    /// The period common to both intervals.
    ///
    /// Labeled `label` when given, otherwise with this interval's label.
    /// Requires `self.overlaps(other)`.
    pub fn intersect(&self, other: &Interval, label: Option<&str>) -> AgendaResult<Interval> {
        self.require_overlap(other, "intersect")?;
        Ok(self.common(other, label.unwrap_or(&self.label)))
    }

    /// The period spanning both intervals.
    ///
    /// Labeled `label` when given, otherwise with both labels joined by a
    /// space. Requires `self.overlaps(other)`.
    pub fn union(&self, other: &Interval, label: Option<&str>) -> AgendaResult<Interval> {
        self.require_overlap(other, "union")?;
        Ok(self.hull(other, label))
    }

    /// Intersection without the overlap check. Caller guarantees overlap.
    pub(crate) fn common(&self, other: &Interval, label: &str) -> Interval {
        Interval::spanning(
            self.begin.max(other.begin),
            self.end.min(other.end),
            label.to_string(),
        )
    }

    /// Union without the overlap check. Caller guarantees overlap.
    pub(crate) fn hull(&self, other: &Interval, label: Option<&str>) -> Interval {
        let label = match label {
            Some(label) => label.to_string(),
            None => format!("{} {}", self.label, other.label),
        };
        Interval::spanning(
            self.begin.min(other.begin),
            self.end.max(other.end),
            label,
        )
    }

    fn require_overlap(&self, other: &Interval, op: &str) -> AgendaResult<()> {
        if self.overlaps(other) {
            Ok(())
        } else {
            Err(AgendaError::PreconditionViolation(format!(
                "cannot {op} '{self}' with non-overlapping '{other}'"
            )))
        }
    }
}

fn to_minute(instant: Instant) -> Instant {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

/// Make `label` safe to print after the `|` separator of the text form.
fn clean_label(label: String) -> String {
    let needs_cleaning = label.trim().len() != label.len()
        || label.chars().any(|c| c == '|' || c.is_control());
    if !needs_cleaning {
        return label;
    }

    label
        .chars()
        .map(|c| match c {
            '|' => '/',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn parse_day(text: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split('.').collect();
    let [year, month, day] = parts[..] else {
        return None;
    };
    NaiveDate::from_ymd_opt(
        year.trim().parse().ok()?,
        month.trim().parse().ok()?,
        day.trim().parse().ok()?,
    )
}

fn parse_clock(line: &str, text: &str) -> AgendaResult<NaiveTime> {
    NaiveTime::parse_from_str(text, TIME_FORMAT).map_err(|_| {
        AgendaError::parse(line, format!("time '{text}' should be HH:MM (24-hour clock)"))
    })
}

impl fmt::Display for Interval {
    /// Example: `2012.10.31 13:00 13:50 | CIS 210 lecture`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} | {}",
            self.begin.format(DATE_FORMAT),
            self.begin.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT),
            self.label
        )
    }
}

impl FromStr for Interval {
    type Err = AgendaError;

    fn from_str(s: &str) -> AgendaResult<Self> {
        Interval::parse(s)
    }
}
