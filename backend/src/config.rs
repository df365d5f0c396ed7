//! Runtime settings.
//!
//! Read from the environment after `dotenvy` has loaded any `.env` file.
//! Unset or unparsable variables fall back to the defaults below.
//!
//! | Variable                     | Default  |
//! |------------------------------|----------|
//! | `SCHOOLBOARD_PORT`           | `3000`   |
//! | `SCHOOLBOARD_MIN_PROPORTION` | `0.0005` |
//! | `SCHOOLBOARD_LOG_CAPACITY`   | `100`    |

use std::str::FromStr;

pub const PORT_VAR: &str = "SCHOOLBOARD_PORT";
pub const MIN_PROPORTION_VAR: &str = "SCHOOLBOARD_MIN_PROPORTION";
pub const LOG_CAPACITY_VAR: &str = "SCHOOLBOARD_LOG_CAPACITY";

pub const DEFAULT_PORT: u16 = 3000;
/// Enrollment shares below this are reported as "Less than .05%".
pub const DEFAULT_MIN_PROPORTION: f64 = 0.0005;
pub const DEFAULT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub min_proportion: f64,
    /// Buffered log entries per SSE subscriber.
    pub log_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            min_proportion: DEFAULT_MIN_PROPORTION,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let min_proportion = parse_or(lookup(MIN_PROPORTION_VAR), defaults.min_proportion);
        let min_proportion = if (0.0..=1.0).contains(&min_proportion) {
            min_proportion
        } else {
            defaults.min_proportion
        };

        let log_capacity = parse_or(lookup(LOG_CAPACITY_VAR), defaults.log_capacity);

        Self {
            port: parse_or(lookup(PORT_VAR), defaults.port),
            min_proportion,
            // broadcast channels need a non-zero capacity
            log_capacity: log_capacity.max(1),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}
