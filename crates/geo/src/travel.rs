//! Driving-time estimates.
//!
//! Until a routed answer arrives, cards show an estimate derived from the
//! straight-line distance with a speed tier per distance band: short urban
//! hops average slower speeds than highway stretches.

use serde::{Deserialize, Serialize};

/// Estimated driving time for a distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelEstimate {
    /// Whole minutes, rounded
    pub minutes: u32,
    /// Compact display text, e.g. `12 min` or `1h 5min`
    pub text: String,
}

impl TravelEstimate {
    fn from_minutes(minutes: u32) -> Self {
        let text = if minutes >= 60 {
            let hours = minutes / 60;
            let rest = minutes % 60;
            if rest == 0 {
                format!("{}h", hours)
            } else {
                format!("{}h {}min", hours, rest)
            }
        } else {
            format!("{} min", minutes)
        };

        Self { minutes, text }
    }

    /// Long-form display text, e.g. `1 hour 5 minutes`.
    pub fn long_text(&self) -> String {
        let hours = self.minutes / 60;
        let minutes = self.minutes % 60;

        match (hours, minutes) {
            (0, m) => format!("{} minute{}", m, plural(m)),
            (h, 0) => format!("{} hour{}", h, plural(h)),
            (h, m) => format!(
                "{} hour{} {} minute{}",
                h,
                plural(h),
                m,
                plural(m)
            ),
        }
    }
}

fn plural(n: u32) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Average speed assumed for a given distance band, in km/h.
fn speed_for_distance(distance_km: f64) -> f64 {
    if distance_km < 5.0 {
        30.0
    } else if distance_km < 15.0 {
        45.0
    } else if distance_km < 40.0 {
        60.0
    } else {
        75.0
    }
}

/// Estimate driving time from a straight-line distance in kilometers.
///
/// Negative or non-finite distances clamp to zero.
///
/// # Example
/// ```
/// use findixi_geo::estimate_travel;
///
/// let estimate = estimate_travel(10.0);
/// assert_eq!(estimate.minutes, 13);
/// assert_eq!(estimate.text, "13 min");
/// ```
pub fn estimate_travel(distance_km: f64) -> TravelEstimate {
    let distance = if distance_km.is_finite() {
        distance_km.max(0.0)
    } else {
        0.0
    };
    let speed = speed_for_distance(distance);
    let minutes = ((distance / speed) * 60.0).round() as u32;

    TravelEstimate::from_minutes(minutes)
}

/// Build an estimate from a routed duration in seconds.
pub fn travel_from_route(duration_secs: f64) -> TravelEstimate {
    let minutes = if duration_secs.is_finite() && duration_secs > 0.0 {
        (duration_secs / 60.0).round() as u32
    } else {
        0
    };
    TravelEstimate::from_minutes(minutes)
}
