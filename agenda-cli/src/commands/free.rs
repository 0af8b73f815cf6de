use agenda_core::{AgendaResult, IntervalSet};
use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::print_json;
use crate::date_range::{DateRange, DayWindow};
use crate::render::{Render, Tone, format_date_label};

/// Free (and optionally busy) time for one day.
#[derive(Debug, Serialize)]
pub struct DayAgenda {
    pub date: NaiveDate,
    pub free: IntervalSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy: Option<IntervalSet>,
}

/// Free time inside `window` on every day of `range`, given the busy
/// intervals of all calendars combined.
pub fn free_time(
    busy: &IntervalSet,
    range: &DateRange,
    window: &DayWindow,
    label: &str,
    include_busy: bool,
) -> AgendaResult<Vec<DayAgenda>> {
    range
        .days()
        .map(|date| -> AgendaResult<DayAgenda> {
            let bound = window.bound(date, label)?;
            let day_busy = busy.on_day(date).normalized();
            let free = day_busy.complement(&bound);
            tracing::debug!(%date, busy = day_busy.len(), free = free.len(), "computed free time");

            Ok(DayAgenda {
                date,
                free,
                busy: include_busy.then_some(day_busy),
            })
        })
        .collect()
}

pub fn run(
    busy: &IntervalSet,
    range: &DateRange,
    window: &DayWindow,
    label: &str,
    show_busy: bool,
    json: bool,
) -> Result<()> {
    let days = free_time(busy, range, window, label, show_busy)?;

    if json {
        return print_json(&days);
    }

    for (i, day) in days.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", format_date_label(day.date).bold());

        let mut entries: Vec<_> = day.free.iter().map(|interval| (interval, Tone::Free)).collect();
        if let Some(busy) = &day.busy {
            entries.extend(busy.iter().map(|interval| (interval, Tone::Busy)));
        }
        entries.sort_by_key(|(interval, _)| interval.begin());

        for (interval, tone) in entries {
            println!("{}", interval.render(tone));
        }
        if day.free.is_empty() {
            println!("  {}", "No free time".dimmed());
        }
    }

    Ok(())
}
