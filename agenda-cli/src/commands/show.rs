use anyhow::Result;
use owo_colors::OwoColorize;

use crate::render::{Entry, Tone, render_by_day};
use crate::sources::Source;

pub fn run(sources: Vec<Source>) -> Result<()> {
    let tagged = sources.len() > 1;
    let mut entries: Vec<Entry> = sources
        .iter()
        .flat_map(|source| {
            source.intervals.iter().map(move |interval| Entry {
                interval,
                tone: Tone::Plain,
                tag: tagged.then_some(source.name.as_str()),
            })
        })
        .collect();

    if entries.is_empty() {
        println!("{}", "No intervals found".dimmed());
        return Ok(());
    }

    entries.sort_by_key(|entry| entry.interval.begin());

    for line in render_by_day(&entries) {
        println!("{line}");
    }

    Ok(())
}
