use jiff::civil::Time;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A daily time-of-day interval in local time, e.g. `07:00–09:00`.
/// A window whose end is before its start wraps past midnight.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub struct ClockWindow {
    #[schemars(with = "String")]
    pub start: Time,
    #[schemars(with = "String")]
    pub end: Time,
}

impl ClockWindow {
    pub const fn new(start: Time, end: Time) -> Self {
        ClockWindow { start, end }
    }

    pub fn contains(&self, time: Time) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }

    pub fn label(&self) -> String {
        format!("{}-{}", format_clock(self.start), format_clock(self.end))
    }
}

pub fn format_clock(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}
