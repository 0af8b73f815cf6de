use agenda_core::IntervalSet;
use anyhow::Result;

use super::print_json;

pub fn run(mut intervals: IntervalSet, json: bool) -> Result<()> {
    let before = intervals.len();
    intervals.normalize();
    tracing::debug!(before, after = intervals.len(), "normalized");

    if json {
        return print_json(&intervals);
    }

    if !intervals.is_empty() {
        println!("{intervals}");
    }
    Ok(())
}
