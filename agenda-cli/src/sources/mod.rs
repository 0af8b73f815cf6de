//! Loading intervals from files on disk.
//!
//! `.ics` files are read as iCalendar exports of busy time; anything else
//! is read as an agenda text file.

pub mod ics;
pub mod text;

use std::path::{Path, PathBuf};

use agenda_core::IntervalSet;
use anyhow::{Context, Result};

use crate::config::AgendaConfig;
use crate::date_range::DateRange;
use ics::IcsOptions;

/// Intervals read from one file.
pub struct Source {
    pub name: String,
    pub intervals: IntervalSet,
}

pub struct Loader<'a> {
    config: &'a AgendaConfig,
    ics: IcsOptions<'a>,
}

impl<'a> Loader<'a> {
    pub fn new(config: &'a AgendaConfig, range: &DateRange, ignore: &'a [String]) -> Result<Self> {
        let timezone = config.timezone()?;
        Ok(Loader {
            config,
            ics: IcsOptions {
                timezone,
                range: range.to_utc(timezone),
                ignore,
            },
        })
    }

    pub fn load(&self, path: &Path) -> Result<Source> {
        let resolved = self.config.resolve(path);
        let content = std::fs::read_to_string(&resolved)
            .with_context(|| format!("Could not read {}", resolved.display()))?;
        let name = source_name(path);

        let intervals = if is_ics(&resolved) {
            ics::busy_intervals(&content, &self.ics)
                .with_context(|| format!("Could not read calendar {}", resolved.display()))?
        } else {
            text::parse_agenda(&content, &name)
        };

        tracing::debug!(source = %resolved.display(), count = intervals.len(), "loaded source");
        Ok(Source { name, intervals })
    }

    pub fn load_all(&self, paths: &[PathBuf]) -> Result<Vec<Source>> {
        paths.iter().map(|path| self.load(path)).collect()
    }

    /// All intervals from all files, in file order.
    pub fn load_merged(&self, paths: &[PathBuf]) -> Result<IntervalSet> {
        let mut merged = IntervalSet::new();
        for source in self.load_all(paths)? {
            merged.extend(source.intervals);
        }
        Ok(merged)
    }
}

fn is_ics(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ics"))
}

/// Short tag for a source: the file stem, e.g. `work` for `~/agenda/work.ics`.
fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange {
            from: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        }
    }

    fn utc_config() -> AgendaConfig {
        AgendaConfig {
            timezone: Some("UTC".to_string()),
            ..AgendaConfig::default()
        }
    }

    #[test]
    fn test_load_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let agenda = dir.path().join("me.agenda");
        let calendar = dir.path().join("work.ICS");
        std::fs::write(&agenda, "2024.01.08 09:00 10:00 | gym\n").unwrap();
        std::fs::write(
            &calendar,
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\n\
             BEGIN:VEVENT\r\nUID:a\r\nSUMMARY:Review\r\n\
             DTSTART:20240108T130000Z\r\nDTEND:20240108T140000Z\r\nEND:VEVENT\r\n\
             END:VCALENDAR\r\n",
        )
        .unwrap();

        let config = utc_config();
        let loader = Loader::new(&config, &range(), &[]).unwrap();
        let sources = loader.load_all(&[agenda.clone(), calendar.clone()]).unwrap();

        assert_eq!(sources[0].name, "me");
        assert_eq!(sources[1].name, "work");
        assert_eq!(
            sources[1].intervals.to_string(),
            "2024.01.08 13:00 14:00 | Review"
        );

        let merged = loader.load_merged(&[agenda, calendar]).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let config = utc_config();
        let loader = Loader::new(&config, &range(), &[]).unwrap();
        let err = loader.load(Path::new("/definitely/not/here.agenda")).err().unwrap();
        assert!(err.to_string().contains("Could not read"));
    }
}
