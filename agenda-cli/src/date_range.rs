//! Date ranges and daily time windows for free-time searches.

use agenda_core::{AgendaResult, Interval};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Parse `--from` / `--to` arguments relative to today.
    /// - `from`: YYYY-MM-DD or MM/DD/YYYY, defaults to today
    /// - `to`: same formats, defaults to `from + default_days - 1`
    pub fn from_args(from: Option<&str>, to: Option<&str>, default_days: u32) -> Result<Self> {
        Self::from_args_at(Local::now().date_naive(), from, to, default_days)
    }

    pub fn from_args_at(
        today: NaiveDate,
        from: Option<&str>,
        to: Option<&str>,
        default_days: u32,
    ) -> Result<Self> {
        let from = match from {
            Some(s) => parse_date(s)?,
            None => today,
        };

        let to = match to {
            Some(s) => parse_date(s)?,
            None => {
                let span = Duration::days(i64::from(default_days.max(1)) - 1);
                match from.checked_add_signed(span) {
                    Some(to) => to,
                    None => anyhow::bail!("Date range starting {from} runs past the last supported date"),
                }
            }
        };

        if to < from {
            anyhow::bail!("End date {to} must not be before start date {from}");
        }

        Ok(DateRange { from, to })
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let to = self.to;
        self.from.iter_days().take_while(move |day| *day <= to)
    }

    /// The range as UTC instants in `tz`: from midnight on the first day to
    /// midnight after the last.
    pub fn to_utc(&self, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = local_midnight(self.from, tz);
        let end = match self.to.succ_opt() {
            Some(next) => local_midnight(next, tz),
            None => DateTime::<Utc>::MAX_UTC,
        };
        (start, end)
    }
}

fn local_midnight(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// The part of each day searched for free time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DayWindow {
    /// Parse `START-END`, e.g. `09:00-17:00` or `9am-5pm`.
    pub fn parse(spec: &str) -> Result<Self> {
        let (start, end) = spec
            .split_once('-')
            .with_context(|| format!("Invalid window '{spec}'. Expected START-END, e.g. 09:00-17:00"))?;
        Self::from_bounds(start, end)
    }

    pub fn from_bounds(start: &str, end: &str) -> Result<Self> {
        let start = parse_clock(start)?;
        let end = parse_clock(end)?;

        if end <= start {
            anyhow::bail!(
                "Window end {} must be after start {}",
                end.format("%H:%M"),
                start.format("%H:%M")
            );
        }

        Ok(DayWindow { start, end })
    }

    /// The window on `day`, as the bounding interval for a complement.
    pub fn bound(&self, day: NaiveDate, label: &str) -> AgendaResult<Interval> {
        Interval::new(day, self.start, self.end, label)
    }
}

/// Parse YYYY-MM-DD or MM/DD/YYYY.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .map_err(|_| {
            anyhow::anyhow!("Invalid date format '{s}'. Expected YYYY-MM-DD or MM/DD/YYYY")
        })
}

/// Parse a time of day: `13:30`, `1:30pm`, `1:30 pm` or `9am`.
pub fn parse_clock(s: &str) -> Result<NaiveTime> {
    let compact = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let twelve_hour = compact.ends_with("am") || compact.ends_with("pm");
    let parsed = if twelve_hour {
        let (clock, meridiem) = compact.split_at(compact.len() - 2);
        let clock = if clock.contains(':') {
            clock.to_string()
        } else {
            format!("{clock}:00")
        };
        NaiveTime::parse_from_str(
            &format!("{clock}{}", meridiem.to_ascii_uppercase()),
            "%I:%M%p",
        )
    } else {
        NaiveTime::parse_from_str(&compact, "%H:%M")
    };

    parsed.map_err(|_| anyhow::anyhow!("Invalid time '{}'. Expected 13:30 or 1:30pm", s.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_range_defaults_from_today() {
        let today = date(2017, 11, 16);
        let range = DateRange::from_args_at(today, None, None, 7).unwrap();

        assert_eq!(range.from, today);
        assert_eq!(range.to, date(2017, 11, 22));
        assert_eq!(range.days().count(), 7);
    }

    #[test]
    fn test_range_accepts_both_date_formats() {
        let today = date(2017, 11, 1);
        let range =
            DateRange::from_args_at(today, Some("11/16/2017"), Some("2017-12-29"), 7).unwrap();

        assert_eq!(range.from, date(2017, 11, 16));
        assert_eq!(range.to, date(2017, 12, 29));
        assert_eq!(range.days().last(), Some(date(2017, 12, 29)));
    }

    #[test]
    fn test_range_rejects_backwards_dates() {
        let today = date(2017, 11, 1);
        let err = DateRange::from_args_at(today, Some("2017-11-16"), Some("2017-11-15"), 7)
            .unwrap_err();
        assert!(err.to_string().contains("must not be before"));
    }

    #[test]
    fn test_default_range_past_last_date_is_an_error() {
        let err = DateRange::from_args_at(date(2017, 11, 1), None, None, u32::MAX).unwrap_err();
        assert!(err.to_string().contains("past the last supported date"));

        let last = DateRange {
            from: NaiveDate::MAX,
            to: NaiveDate::MAX,
        };
        assert_eq!(last.days().count(), 1);
        assert_eq!(last.to_utc(Tz::UTC).1, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_single_day_range() {
        let today = date(2017, 11, 1);
        let range = DateRange::from_args_at(today, Some("2017-11-16"), Some("2017-11-16"), 7)
            .unwrap();
        assert_eq!(range.days().collect::<Vec<_>>(), [date(2017, 11, 16)]);
    }

    #[test]
    fn test_to_utc_uses_local_midnights() {
        let range = DateRange {
            from: date(2017, 11, 16),
            to: date(2017, 11, 16),
        };
        let (start, end) = range.to_utc(chrono_tz::America::Los_Angeles);

        assert_eq!(start.to_rfc3339(), "2017-11-16T08:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2017-11-17T08:00:00+00:00");
    }

    #[test]
    fn test_parse_clock_formats() {
        assert_eq!(parse_clock("13:30").unwrap(), clock(13, 30));
        assert_eq!(parse_clock("9:05").unwrap(), clock(9, 5));
        assert_eq!(parse_clock("1:30pm").unwrap(), clock(13, 30));
        assert_eq!(parse_clock("1:30 PM").unwrap(), clock(13, 30));
        assert_eq!(parse_clock("8am").unwrap(), clock(8, 0));
        assert_eq!(parse_clock("12am").unwrap(), clock(0, 0));
        assert!(parse_clock("25:00").is_err());
        assert!(parse_clock("noon").is_err());
    }

    #[test]
    fn test_window_parse() {
        let window = DayWindow::parse("9am-5pm").unwrap();
        assert_eq!(window.start, clock(9, 0));
        assert_eq!(window.end, clock(17, 0));

        assert!(DayWindow::parse("17:00-09:00").is_err());
        assert!(DayWindow::parse("09:00").is_err());
    }

    #[test]
    fn test_window_bound_is_labeled_interval() {
        let window = DayWindow::parse("08:30-15:00").unwrap();
        let bound = window.bound(date(2017, 11, 16), "Free").unwrap();

        assert_eq!(bound.to_string(), "2017.11.16 08:30 15:00 | Free");
    }
}
