//! Global agenda configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::date_range::DayWindow;

static DEFAULT_AGENDA_PATH: &str = "~/agenda";
static DEFAULT_DAY_START: &str = "08:00";
static DEFAULT_DAY_END: &str = "17:00";
static DEFAULT_FREE_LABEL: &str = "Free";
const DEFAULT_DAYS: u32 = 7;

fn default_agenda_dir() -> PathBuf {
    PathBuf::from(DEFAULT_AGENDA_PATH)
}

fn default_day_start() -> String {
    DEFAULT_DAY_START.to_string()
}

fn default_day_end() -> String {
    DEFAULT_DAY_END.to_string()
}

fn default_free_label() -> String {
    DEFAULT_FREE_LABEL.to_string()
}

fn default_days() -> u32 {
    DEFAULT_DAYS
}

/// Global configuration at ~/.config/agenda/config.toml
///
/// Every key can be overridden with an `AGENDA_`-prefixed environment
/// variable, e.g. `AGENDA_DAY_START=09:00`.
#[derive(Deserialize, Clone, Debug)]
pub struct AgendaConfig {
    #[serde(default = "default_agenda_dir")]
    pub agenda_dir: PathBuf,

    #[serde(default = "default_day_start")]
    pub day_start: String,

    #[serde(default = "default_day_end")]
    pub day_end: String,

    #[serde(default = "default_days")]
    pub default_days: u32,

    #[serde(default = "default_free_label")]
    pub free_label: String,

    pub timezone: Option<String>,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        AgendaConfig {
            agenda_dir: default_agenda_dir(),
            day_start: default_day_start(),
            day_end: default_day_end(),
            default_days: default_days(),
            free_label: default_free_label(),
            timezone: None,
        }
    }
}

impl AgendaConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("agenda");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file (creating a commented default on first run),
    /// then apply `AGENDA_*` environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: AgendaConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("AGENDA"))
            .build()
            .context("Could not read config")?
            .try_deserialize()
            .context("Invalid config")?;

        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# agenda configuration

# Where relative agenda files are looked up:
# agenda_dir = \"{DEFAULT_AGENDA_PATH}\"

# Window searched for free time each day:
# day_start = \"{DEFAULT_DAY_START}\"
# day_end = \"{DEFAULT_DAY_END}\"

# Number of days covered when --to is not given:
# default_days = {DEFAULT_DAYS}

# Label for computed free blocks:
# free_label = \"{DEFAULT_FREE_LABEL}\"

# Timezone for .ics times (defaults to the system timezone):
# timezone = \"America/Los_Angeles\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Could not create config directory")?;
        }

        std::fs::write(path, contents).context("Could not write config file")?;

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        let full_path_str =
            shellexpand::tilde(&self.agenda_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// Resolve a source path: as given if it exists, otherwise relative to
    /// `agenda_dir` when the file is found there.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.exists() || path.is_absolute() {
            return path.to_path_buf();
        }

        let in_data_dir = self.data_path().join(path);
        if in_data_dir.exists() {
            in_data_dir
        } else {
            path.to_path_buf()
        }
    }

    /// The default free-time window.
    pub fn window(&self) -> Result<DayWindow> {
        DayWindow::from_bounds(&self.day_start, &self.day_end)
            .context("Invalid day_start/day_end in config")
    }

    /// Timezone that .ics times are converted into.
    pub fn timezone(&self) -> Result<Tz> {
        if let Some(name) = &self.timezone {
            return name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Unknown timezone '{name}' in config: {e}"));
        }

        let zone = iana_time_zone::get_timezone()
            .ok()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(Tz::UTC);
        Ok(zone)
    }
}
