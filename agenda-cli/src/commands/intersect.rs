use agenda_core::IntervalSet;
use anyhow::Result;

use super::print_json;

pub fn run(left: &IntervalSet, right: &IntervalSet, label: Option<&str>, json: bool) -> Result<()> {
    let common = left.intersect(right, label);
    tracing::debug!(
        left = left.len(),
        right = right.len(),
        common = common.len(),
        "intersected"
    );

    if json {
        return print_json(&common);
    }

    if !common.is_empty() {
        println!("{common}");
    }
    Ok(())
}
