use crate::domain::ports::Clock;
use crate::utils::error::{Result, VessError};
use chrono::{Local, NaiveDateTime};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant. Used to replay or backfill evaluations.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Parses `YYYY-MM-DD HH:MM`.
    pub fn parse(value: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
            .map(FixedClock)
            .map_err(|e| VessError::InvalidConfigValue {
                field: "clock".to_string(),
                value: value.to_string(),
                reason: format!("expected YYYY-MM-DD HH:MM ({})", e),
            })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
