use jiff::{SignedDuration, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Permitted arrival interval at a stop. Either bound may be open.
#[derive(Deserialize, Debug, Serialize, Clone, Copy, PartialEq, JsonSchema)]
pub struct TimeWindow {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindow {
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        TimeWindow { start, end }
    }

    pub fn start(&self) -> Option<Timestamp> {
        self.start
    }

    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A window is malformed when its start lies after its end.
    pub fn is_well_formed(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    pub fn is_satisfied(&self, arrival: Timestamp) -> bool {
        match self.end {
            Some(end) => arrival <= end,
            None => true,
        }
    }

    /// How late `arrival` is past the end of the window, zero when on time.
    pub fn overtime(&self, arrival: Timestamp) -> SignedDuration {
        match self.end {
            Some(end) if arrival > end => arrival.duration_since(end),
            _ => SignedDuration::ZERO,
        }
    }

    /// When service can begin for a vehicle arriving at `arrival`.
    pub fn service_start(&self, arrival: Timestamp) -> Timestamp {
        match self.start {
            Some(start) if arrival < start => start,
            _ => arrival,
        }
    }
}

#[derive(Default)]
pub struct TimeWindowBuilder {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindowBuilder {
    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: Timestamp) -> Self {
        self.end = Some(end);
        self
    }

    pub fn build(self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }
}
