use std::fmt::Display;

use jiff::civil::{Time, time};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::clock_window::ClockWindow;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
pub enum ContainerClass {
    #[serde(rename = "20ft")]
    TwentyFoot,
    #[serde(rename = "40ft")]
    FortyFoot,
    #[serde(rename = "45ft")]
    FortyFiveFoot,
}

impl Display for ContainerClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TwentyFoot => write!(f, "20ft"),
            Self::FortyFoot => write!(f, "40ft"),
            Self::FortyFiveFoot => write!(f, "45ft"),
        }
    }
}

/// Regulatory limits attached to a container class.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRestriction {
    pub class: ContainerClass,
    /// Local times during which the class may not enter city stops.
    #[serde(default)]
    pub restricted_windows: Vec<ClockWindow>,
    /// When non-empty, city stops are only allowed inside one of these windows.
    #[serde(default)]
    pub allowed_windows: Vec<ClockWindow>,
    pub max_weight_kg: Option<f64>,
    pub max_height_m: Option<f64>,
    #[serde(default)]
    pub permit_required: bool,
}

/// Result of checking a local arrival time against a restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestrictedHours {
    pub window: ClockWindow,
    /// Earliest local time at which the restriction lifts.
    pub lifts_at: Time,
}

impl ContainerRestriction {
    pub fn restricted_at(&self, local_time: Time) -> Option<RestrictedHours> {
        if let Some(window) = self
            .restricted_windows
            .iter()
            .find(|window| window.contains(local_time))
        {
            return Some(RestrictedHours {
                window: *window,
                lifts_at: window.end,
            });
        }

        if self.allowed_windows.is_empty()
            || self
                .allowed_windows
                .iter()
                .any(|window| window.contains(local_time))
        {
            return None;
        }

        // Outside every allowed window: the restriction lifts at the next allowed start.
        let next_start = self
            .allowed_windows
            .iter()
            .map(|window| window.start)
            .filter(|start| *start > local_time)
            .min()
            .or_else(|| self.allowed_windows.iter().map(|window| window.start).min())?;

        Some(RestrictedHours {
            window: ClockWindow::new(local_time, next_start),
            lifts_at: next_start,
        })
    }
}

/// Read-only reference table of restrictions per container class.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRestrictions {
    restrictions: Vec<ContainerRestriction>,
}

impl ContainerRestrictions {
    pub fn new(restrictions: Vec<ContainerRestriction>) -> Self {
        ContainerRestrictions { restrictions }
    }

    pub fn for_class(&self, class: ContainerClass) -> Option<&ContainerRestriction> {
        self.restrictions
            .iter()
            .find(|restriction| restriction.class == class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContainerRestriction> {
        self.restrictions.iter()
    }
}

impl Default for ContainerRestrictions {
    fn default() -> Self {
        let daytime = ClockWindow::new(time(6, 0, 0, 0), time(22, 0, 0, 0));

        ContainerRestrictions::new(vec![
            ContainerRestriction {
                class: ContainerClass::TwentyFoot,
                restricted_windows: vec![],
                allowed_windows: vec![],
                max_weight_kg: Some(24_000.0),
                max_height_m: Some(4.0),
                permit_required: false,
            },
            ContainerRestriction {
                class: ContainerClass::FortyFoot,
                restricted_windows: vec![daytime],
                allowed_windows: vec![],
                max_weight_kg: Some(30_480.0),
                max_height_m: Some(4.0),
                permit_required: false,
            },
            ContainerRestriction {
                class: ContainerClass::FortyFiveFoot,
                restricted_windows: vec![daytime],
                allowed_windows: vec![],
                max_weight_kg: Some(30_480.0),
                max_height_m: Some(4.3),
                permit_required: true,
            },
        ])
    }
}
