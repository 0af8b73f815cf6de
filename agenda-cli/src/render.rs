//! Terminal rendering for agendas.
//!
//! This module provides extension traits that add colored terminal rendering
//! to agenda-core types using owo_colors.

use agenda_core::Interval;
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;

/// How an interval should be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Busy,
    Free,
    Plain,
}

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self, tone: Tone) -> String;
}

impl Render for Interval {
    fn render(&self, tone: Tone) -> String {
        let span = format_span(self);
        let span = match tone {
            Tone::Busy => span.red().to_string(),
            Tone::Free => span.green().to_string(),
            Tone::Plain => span,
        };
        format!("  {} {}", span, self.label())
    }
}

/// `09:00-10:30`, with the end shown as `24:00` when it is the next midnight.
pub fn format_span(interval: &Interval) -> String {
    let end = interval.end();
    let end = if end.date() > interval.day() && end.time() == chrono::NaiveTime::MIN {
        "24:00".to_string()
    } else {
        end.format("%H:%M").to_string()
    };
    format!("{}-{}", interval.begin().format("%H:%M"), end)
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(date: NaiveDate) -> String {
    format_date_label_at(date, Local::now().date_naive())
}

fn format_date_label_at(date: NaiveDate, today: NaiveDate) -> String {
    let diff = (date - today).num_days();
    match diff {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// An interval to print, with its coloring and an optional source tag.
pub struct Entry<'a> {
    pub interval: &'a Interval,
    pub tone: Tone,
    pub tag: Option<&'a str>,
}

/// Render entries grouped under a bold heading per day. Entries are shown
/// in the order given; callers sort them first.
pub fn render_by_day(entries: &[Entry]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_date: Option<NaiveDate> = None;

    for entry in entries {
        let day = entry.interval.day();
        if current_date != Some(day) {
            if current_date.is_some() {
                lines.push(String::new());
            }
            lines.push(format_date_label(day).bold().to_string());
            current_date = Some(day);
        }

        let mut line = entry.interval.render(entry.tone);
        if let Some(tag) = entry.tag {
            line.push_str(&format!(" {}", format!("[{tag}]").dimmed()));
        }
        lines.push(line);
    }

    lines
}
