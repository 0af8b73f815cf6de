//! Agenda files in the line-oriented interval format.

use agenda_core::IntervalSet;
use owo_colors::OwoColorize;

/// Parse agenda text, printing a warning for every line that was skipped.
pub fn parse_agenda(content: &str, source: &str) -> IntervalSet {
    let mut warn = |line: &str, reason: &str| {
        tracing::debug!(source, line, reason, "skipped agenda line");
        eprintln!(
            "{} {}: skipped '{}': {}",
            "warning:".yellow().bold(),
            source,
            line,
            reason
        );
    };

    IntervalSet::parse(content, &mut warn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agenda_keeps_good_lines() {
        let text = "\
# Weekly office hours
2017.11.16 10:00 11:00 | office hours
2017.11.16 14:00 | missing end
2017.11.17 10:00 11:00 | office hours
";
        let set = parse_agenda(text, "hours.agenda");
        assert_eq!(set.len(), 2);
    }
}
