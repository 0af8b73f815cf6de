//! Busy time from iCalendar exports.
//!
//! Each opaque, non-cancelled, timed `VEVENT` becomes one busy interval per
//! calendar day it touches, in the configured local timezone. Recurring
//! events are expanded across the requested date range, honoring EXDATEs
//! and `RECURRENCE-ID` overrides found in the same file.

use std::collections::HashSet;

use agenda_core::{AgendaResult, Interval, IntervalSet};
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use rrule::RRuleSet;

/// Upper bound on instances generated per recurring event.
const MAX_OCCURRENCES: u16 = 365;

pub struct IcsOptions<'a> {
    /// Timezone that event times are converted into.
    pub timezone: Tz,
    /// Recurring events are expanded within this range.
    pub range: (DateTime<Utc>, DateTime<Utc>),
    /// UIDs of events that should not count as busy.
    pub ignore: &'a [String],
}

/// A DTSTART/DTEND/EXDATE value with its timezone information intact.
#[derive(Debug, Clone, PartialEq)]
enum Stamp {
    Utc(DateTime<Utc>),
    Floating(NaiveDateTime),
    Zoned { datetime: NaiveDateTime, tzid: String },
}

impl Stamp {
    /// None for date-only (all-day) values.
    fn from_ics(dpt: DatePerhapsTime) -> Option<Self> {
        match dpt {
            DatePerhapsTime::Date(_) => None,
            DatePerhapsTime::DateTime(cal_dt) => Some(match cal_dt {
                CalendarDateTime::Utc(dt) => Stamp::Utc(dt),
                CalendarDateTime::Floating(naive) => Stamp::Floating(naive),
                CalendarDateTime::WithTimezone { date_time, tzid } => Stamp::Zoned {
                    datetime: date_time,
                    tzid,
                },
            }),
        }
    }

    /// Wall-clock time in `tz`. Floating times and unknown TZIDs are taken
    /// as already local.
    fn to_local(&self, tz: Tz) -> NaiveDateTime {
        match self {
            Stamp::Utc(dt) => dt.with_timezone(&tz).naive_local(),
            Stamp::Floating(naive) => *naive,
            Stamp::Zoned { datetime, tzid } => tzid
                .parse::<Tz>()
                .ok()
                .and_then(|zone| zone.from_local_datetime(datetime).earliest())
                .map(|dt| dt.with_timezone(&tz).naive_local())
                .unwrap_or(*datetime),
        }
    }

    /// iCalendar line for the rrule parser. Floating times are passed as UTC
    /// and read back the same way.
    fn to_rrule_line(&self, name: &str) -> String {
        match self {
            Stamp::Utc(dt) => format!("{name}:{}", dt.format("%Y%m%dT%H%M%SZ")),
            Stamp::Floating(dt) => format!("{name}:{}Z", dt.format("%Y%m%dT%H%M%S")),
            Stamp::Zoned { datetime, tzid } => {
                format!("{name};TZID={tzid}:{}", datetime.format("%Y%m%dT%H%M%S"))
            }
        }
    }

    /// Convert an rrule occurrence back to a stamp of the same kind as `self`.
    fn occurrence(&self, occ: &DateTime<rrule::Tz>) -> Stamp {
        match self {
            Stamp::Utc(_) => Stamp::Utc(occ.with_timezone(&Utc)),
            Stamp::Floating(_) => Stamp::Floating(occ.naive_utc()),
            Stamp::Zoned { tzid, .. } => Stamp::Zoned {
                datetime: occ.naive_local(),
                tzid: tzid.clone(),
            },
        }
    }
}

#[derive(Debug)]
struct IcsEvent {
    uid: String,
    summary: String,
    start: Stamp,
    end: Stamp,
    rrule: Option<String>,
    exdates: Vec<Stamp>,
    recurrence_id: Option<Stamp>,
    cancelled: bool,
    transparent: bool,
}

/// Read busy intervals from `.ics` content.
///
/// Malformed events are skipped with a warning; content that is not an
/// iCalendar document at all is an error.
pub fn busy_intervals(content: &str, opts: &IcsOptions) -> Result<IntervalSet> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| anyhow::anyhow!("Could not parse calendar: {e}"))?;

    let mut events = Vec::new();
    for vevent in calendar.components.iter().filter(|c| c.name == "VEVENT") {
        match parse_event(vevent) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => tracing::debug!("skipping all-day event"),
            Err(reason) => tracing::warn!(%reason, "skipping malformed event"),
        }
    }

    let tz = opts.timezone;
    let overridden: HashSet<(&str, NaiveDateTime)> = events
        .iter()
        .filter_map(|e| Some((e.uid.as_str(), e.recurrence_id.as_ref()?.to_local(tz))))
        .collect();

    let mut busy = IntervalSet::new();
    for event in &events {
        if event.cancelled || event.transparent || opts.ignore.contains(&event.uid) {
            tracing::debug!(uid = %event.uid, summary = %event.summary, "not busy");
            continue;
        }

        let start = event.start.to_local(tz);
        let length = event.end.to_local(tz) - start;
        if length <= Duration::zero() {
            tracing::warn!(uid = %event.uid, "skipping event that ends before it starts");
            continue;
        }

        let starts = match (&event.rrule, &event.recurrence_id) {
            (Some(rrule), None) => match expand(event, rrule, opts) {
                Ok(starts) => starts
                    .into_iter()
                    .filter(|s| !overridden.contains(&(event.uid.as_str(), *s)))
                    .collect(),
                Err(reason) => {
                    tracing::warn!(uid = %event.uid, %reason, "skipping recurring event");
                    continue;
                }
            },
            _ => vec![start],
        };

        for start in starts {
            match split_by_day(start, start + length, &event.summary) {
                Ok(pieces) => busy.extend(pieces),
                Err(e) => tracing::warn!(uid = %event.uid, error = %e, "skipping event"),
            }
        }
    }

    tracing::debug!(count = busy.len(), "read busy intervals from calendar");
    Ok(busy)
}

/// Ok(None) for all-day events.
fn parse_event(vevent: &Component) -> Result<Option<IcsEvent>, String> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_default();
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());

    let start = time_prop(vevent, "DTSTART")?;
    let end = time_prop(vevent, "DTEND")?;
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(None);
    };

    let cancelled = vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref() == "CANCELLED");
    let transparent = vevent
        .find_prop("TRANSP")
        .is_some_and(|p| p.val.as_ref() == "TRANSPARENT");

    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exdates = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_exdate_property)
        .collect();
    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .and_then(Stamp::from_ics);

    Ok(Some(IcsEvent {
        uid,
        summary,
        start,
        end,
        rrule,
        exdates,
        recurrence_id,
        cancelled,
        transparent,
    }))
}

fn time_prop(vevent: &Component, name: &str) -> Result<Option<Stamp>, String> {
    let prop = vevent
        .find_prop(name)
        .ok_or_else(|| format!("missing {name}"))?;
    let dpt = DatePerhapsTime::try_from(prop).map_err(|_| format!("invalid {name}"))?;
    Ok(Stamp::from_ics(dpt))
}

/// Parse an EXDATE property, which may carry several comma-separated values.
/// Date-only values are ignored since all-day events are never busy here.
fn parse_exdate_property(prop: &Property) -> Vec<Stamp> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    prop.val
        .as_ref()
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            let naive = NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), "%Y%m%dT%H%M%S")
                .ok()?;
            Some(match (&tzid, s.ends_with('Z')) {
                (Some(tz), _) => Stamp::Zoned {
                    datetime: naive,
                    tzid: tz.clone(),
                },
                (None, true) => Stamp::Utc(naive.and_utc()),
                (None, false) => Stamp::Floating(naive),
            })
        })
        .collect()
}

/// Local start times of every instance of a recurring event in range.
fn expand(event: &IcsEvent, rrule: &str, opts: &IcsOptions) -> Result<Vec<NaiveDateTime>, String> {
    let mut lines = vec![event.start.to_rrule_line("DTSTART"), format!("RRULE:{rrule}")];
    lines.extend(event.exdates.iter().map(|d| d.to_rrule_line("EXDATE")));

    let rrule_set: RRuleSet = lines
        .join("\n")
        .parse()
        .map_err(|e| format!("invalid RRULE '{rrule}': {e}"))?;

    // Widen the range so instances starting just before it still count,
    // and so the exclusive after/before bounds include the edges.
    let length = event.end.to_local(opts.timezone) - event.start.to_local(opts.timezone);
    let tz: rrule::Tz = Utc.into();
    let after = (opts.range.0 - length - Duration::seconds(1)).with_timezone(&tz);
    let before = (opts.range.1 + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);

    Ok(result
        .dates
        .iter()
        .map(|occ| event.start.occurrence(occ).to_local(opts.timezone))
        .collect())
}

/// Split `[start, end)` at local midnights so each piece lies on one day.
/// A piece that runs to midnight ends at 00:00 of the following day.
fn split_by_day(start: NaiveDateTime, end: NaiveDateTime, label: &str) -> AgendaResult<Vec<Interval>> {
    let mut pieces = Vec::new();
    let mut cursor = start;

    while cursor < end {
        let piece_end = cursor
            .date()
            .succ_opt()
            .map(|next| next.and_time(chrono::NaiveTime::MIN))
            .map_or(end, |midnight| midnight.min(end));
        pieces.push(Interval::from_instants(cursor, piece_end, label)?);
        cursor = piece_end;
    }

    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn options(ignore: &[String]) -> IcsOptions<'_> {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        IcsOptions {
            timezone: chrono_tz::America::New_York,
            range: (
                from.and_hms_opt(5, 0, 0).unwrap().and_utc(),
                to.and_hms_opt(5, 0, 0).unwrap().and_utc(),
            ),
            ignore,
        }
    }

    fn calendar(events: &str) -> String {
        format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\n{events}END:VCALENDAR\r\n")
    }

    fn lines(set: &IntervalSet) -> Vec<String> {
        set.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_utc_event_converted_to_local_time() {
        let ics = calendar(
            "BEGIN:VEVENT\r\nUID:a\r\nSUMMARY:Standup\r\n\
             DTSTART:20240108T150000Z\r\nDTEND:20240108T153000Z\r\nEND:VEVENT\r\n",
        );
        let busy = busy_intervals(&ics, &options(&[])).unwrap();
        assert_eq!(lines(&busy), ["2024.01.08 10:00 10:30 | Standup"]);
    }

    #[test]
    fn test_zoned_and_floating_events() {
        let ics = calendar(
            "BEGIN:VEVENT\r\nUID:a\r\nSUMMARY:Call\r\n\
             DTSTART;TZID=Europe/London:20240108T150000\r\n\
             DTEND;TZID=Europe/London:20240108T160000\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:b\r\nSUMMARY:Gym\r\n\
             DTSTART:20240108T070000\r\nDTEND:20240108T080000\r\nEND:VEVENT\r\n",
        );
        let busy = busy_intervals(&ics, &options(&[])).unwrap();
        assert_eq!(
            lines(&busy),
            ["2024.01.08 10:00 11:00 | Call", "2024.01.08 07:00 08:00 | Gym"]
        );
    }

    #[test]
    fn test_free_cancelled_ignored_and_all_day_events_are_skipped() {
        let ics = calendar(
            "BEGIN:VEVENT\r\nUID:free\r\nSUMMARY:Maybe\r\nTRANSP:TRANSPARENT\r\n\
             DTSTART:20240108T150000Z\r\nDTEND:20240108T160000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:gone\r\nSUMMARY:Cancelled\r\nSTATUS:CANCELLED\r\n\
             DTSTART:20240108T150000Z\r\nDTEND:20240108T160000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:holiday\r\nSUMMARY:Holiday\r\n\
             DTSTART;VALUE=DATE:20240108\r\nDTEND;VALUE=DATE:20240109\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:marked\r\nSUMMARY:Optional\r\n\
             DTSTART:20240108T170000Z\r\nDTEND:20240108T180000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:busy\r\nSUMMARY:Review\r\n\
             DTSTART:20240108T190000Z\r\nDTEND:20240108T200000Z\r\nEND:VEVENT\r\n",
        );
        let ignore = vec!["marked".to_string()];
        let busy = busy_intervals(&ics, &options(&ignore)).unwrap();
        assert_eq!(lines(&busy), ["2024.01.08 14:00 15:00 | Review"]);
    }

    #[test]
    fn test_event_without_end_is_skipped_not_fatal() {
        let ics = calendar(
            "BEGIN:VEVENT\r\nUID:a\r\nSUMMARY:Broken\r\nDTSTART:20240108T150000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:b\r\nSUMMARY:Fine\r\n\
             DTSTART:20240108T160000Z\r\nDTEND:20240108T170000Z\r\nEND:VEVENT\r\n",
        );
        let busy = busy_intervals(&ics, &options(&[])).unwrap();
        assert_eq!(lines(&busy), ["2024.01.08 11:00 12:00 | Fine"]);
    }

    #[test]
    fn test_seconds_and_separator_in_summary_still_print_as_agenda_lines() {
        let ics = calendar(
            "BEGIN:VEVENT\r\nUID:a\r\nSUMMARY:Team | Standup\r\n\
             DTSTART:20240108T150030Z\r\nDTEND:20240108T153045Z\r\nEND:VEVENT\r\n",
        );
        let busy = busy_intervals(&ics, &options(&[])).unwrap();
        assert_eq!(lines(&busy), ["2024.01.08 10:00 10:30 | Team / Standup"]);

        let reread = IntervalSet::parse(&busy.to_string(), &mut agenda_core::IgnoreDiagnostics);
        assert_eq!(reread.len(), 1);
        assert_eq!(reread, busy);
    }

    #[test]
    fn test_overnight_event_split_at_midnight() {
        let ics = calendar(
            "BEGIN:VEVENT\r\nUID:a\r\nSUMMARY:Deploy\r\n\
             DTSTART:20240108T220000\r\nDTEND:20240109T020000\r\nEND:VEVENT\r\n",
        );
        let busy = busy_intervals(&ics, &options(&[])).unwrap();

        assert_eq!(busy.len(), 2);
        let pieces: Vec<&Interval> = busy.iter().collect();
        assert_eq!(pieces[0].day(), NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(pieces[0].duration(), Duration::hours(2));
        assert_eq!(pieces[1].to_string(), "2024.01.09 00:00 02:00 | Deploy");
    }

    #[test]
    fn test_recurring_event_expands_with_exdate_and_override() {
        let ics = calendar(
            "BEGIN:VEVENT\r\nUID:weekly\r\nSUMMARY:Sync\r\n\
             DTSTART;TZID=America/New_York:20240101T090000\r\n\
             DTEND;TZID=America/New_York:20240101T100000\r\n\
             RRULE:FREQ=WEEKLY;COUNT=4\r\n\
             EXDATE;TZID=America/New_York:20240108T090000\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:weekly\r\nSUMMARY:Sync (moved)\r\n\
             RECURRENCE-ID;TZID=America/New_York:20240115T090000\r\n\
             DTSTART;TZID=America/New_York:20240115T130000\r\n\
             DTEND;TZID=America/New_York:20240115T140000\r\nEND:VEVENT\r\n",
        );
        let busy = busy_intervals(&ics, &options(&[])).unwrap();

        let mut found = lines(&busy);
        found.sort();
        assert_eq!(
            found,
            [
                "2024.01.01 09:00 10:00 | Sync",
                "2024.01.15 13:00 14:00 | Sync (moved)",
                "2024.01.22 09:00 10:00 | Sync",
            ]
        );
    }
}
