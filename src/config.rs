use std::{env, fmt, time::Duration};

use crate::util::{is_falsy, is_truthy};

pub const MAX_PAGES_ENV: &str = "GRIDMATE_MAX_PAGES";
pub const PAGE_SIZE_ENV: &str = "GRIDMATE_PAGE_SIZE";
pub const CONSISTENT_READ_ENV: &str = "GRIDMATE_CONSISTENT_READ";
pub const FETCH_TIMEOUT_ENV: &str = "GRIDMATE_FETCH_TIMEOUT_MS";

pub const DEFAULT_MAX_PAGES: usize = 11;
pub const DEFAULT_PAGE_SIZE: i32 = 2500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { name: String, value: String },
    InvalidFlag { name: String, value: String },
    OutOfRange { name: String, value: String, min: u64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a number, got {value:?}")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be a boolean flag, got {value:?}")
            }
            ConfigError::OutOfRange { name, value, min } => {
                write!(f, "{name} must be at least {min}, got {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Knobs for one item listing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Ceiling on page fetches per listing.
    pub max_pages: usize,
    /// Items requested per page.
    pub page_size: i32,
    pub consistent_read: bool,
    /// Bound on each page fetch; `None` waits as long as the store does.
    pub fetch_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            page_size: DEFAULT_PAGE_SIZE,
            consistent_read: true,
            fetch_timeout: None,
        }
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_pages: Option<usize>,
    pub page_size: Option<i32>,
    pub eventual_read: bool,
    pub fetch_timeout_ms: Option<u64>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults, then any variables `lookup` returns. Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut settings = Settings::default();
        if let Some(raw) = get(MAX_PAGES_ENV) {
            settings.max_pages = parse_number::<usize>(MAX_PAGES_ENV, &raw)?;
        }
        if let Some(raw) = get(PAGE_SIZE_ENV) {
            settings.page_size = parse_number::<i32>(PAGE_SIZE_ENV, &raw)?;
        }
        if let Some(raw) = get(CONSISTENT_READ_ENV) {
            settings.consistent_read = if is_truthy(&raw) {
                true
            } else if is_falsy(&raw) {
                false
            } else {
                return Err(ConfigError::InvalidFlag {
                    name: CONSISTENT_READ_ENV.to_string(),
                    value: raw,
                });
            };
        }
        if let Some(raw) = get(FETCH_TIMEOUT_ENV) {
            let ms = parse_number::<u64>(FETCH_TIMEOUT_ENV, &raw)?;
            settings.fetch_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply(mut self, overrides: &Overrides) -> Result<Self, ConfigError> {
        if let Some(max_pages) = overrides.max_pages {
            self.max_pages = max_pages;
        }
        if let Some(page_size) = overrides.page_size {
            self.page_size = page_size;
        }
        if overrides.eventual_read {
            self.consistent_read = false;
        }
        if let Some(ms) = overrides.fetch_timeout_ms {
            self.fetch_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages < 1 {
            return Err(ConfigError::OutOfRange {
                name: "max pages".to_string(),
                value: self.max_pages.to_string(),
                min: 1,
            });
        }
        if self.page_size < 1 {
            return Err(ConfigError::OutOfRange {
                name: "page size".to_string(),
                value: self.page_size.to_string(),
                min: 1,
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        name: name.to_string(),
        value: raw.to_string(),
    })
}
