use core::fmt;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use duration_string::DurationString;
use serde::{Deserialize, Serialize};

use crate::retry::RetryBudget;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// How often the host re-invokes a disk conversion check.
    #[serde(default = "default_transformation_check_interval")]
    pub transformation_check_interval: DurationString,
    /// How often the host re-invokes a power-off check.
    #[serde(default = "default_poweroff_check_interval")]
    pub poweroff_check_interval: DurationString,
    /// Transient query failures tolerated before re-raising.
    #[serde(default = "default_max_query_attempts")]
    pub max_query_attempts: u32,
}

fn default_transformation_check_interval() -> DurationString {
    DurationString::from(Duration::from_secs(15))
}

fn default_poweroff_check_interval() -> DurationString {
    DurationString::from(Duration::from_secs(30))
}

fn default_max_query_attempts() -> u32 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transformation_check_interval: default_transformation_check_interval(),
            poweroff_check_interval: default_poweroff_check_interval(),
            max_query_attempts: default_max_query_attempts(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Polling every {} (transformation) / {} (poweroff), {} query attempts",
            self.transformation_check_interval, self.poweroff_check_interval,
            self.max_query_attempts
        )
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let contents = fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn retry_budget(&self) -> RetryBudget {
        RetryBudget::new(self.max_query_attempts)
    }
}
