//! Elapsed-time alerting
//!
//! Alerts are pure presentation state recomputed every tick from stored
//! timestamps; nothing here is persisted. Thresholds:
//!
//! - Preparing for 30 minutes: yellow, blinking
//! - Preparing for 55 minutes: red, blinking
//! - Ready (since last update) for 20 minutes: green, blinking
//!   (the food is going cold on the counter)

use crate::status::Stage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minutes in Preparing before the yellow alert
pub const PREPARING_WARN_MINS: u64 = 30;

/// Minutes in Preparing before the red alert
pub const PREPARING_CRITICAL_MINS: u64 = 55;

/// Minutes in Ready before the pickup reminder
pub const READY_REMINDER_MINS: u64 = 20;

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Preparing is taking long
    Yellow,
    /// Preparing is taking far too long
    Red,
    /// Ready order waiting for pickup
    Green,
}

impl AlertLevel {
    /// Severity rank for aggregation (higher is worse)
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            Self::Green => 0,
            Self::Yellow => 1,
            Self::Red => 2,
        }
    }
}

/// Alert state of one order at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert level, when any threshold was crossed
    pub level: Option<AlertLevel>,
    /// Whether the alert should blink
    pub blink: bool,
}

impl Alert {
    const NONE: Alert = Alert {
        level: None,
        blink: false,
    };

    /// Merge another alert in, keeping the worse severity
    pub fn escalate(&mut self, other: Alert) {
        let mine = self.level.map_or(-1, |l| i8::try_from(l.severity()).unwrap_or(0));
        let theirs = other.level.map_or(-1, |l| i8::try_from(l.severity()).unwrap_or(0));
        if theirs > mine {
            self.level = other.level;
        }
        self.blink = self.blink || other.blink;
    }
}

/// Compute the alert for an order.
///
/// `elapsed_total` counts from order creation; `elapsed_since_update`
/// from the last status change (falling back to creation when the row
/// has no update timestamp).
#[must_use]
pub fn alert_for(stage: Stage, elapsed_total: Duration, elapsed_since_update: Duration) -> Alert {
    match stage {
        Stage::Preparing => {
            let mins = elapsed_total.as_secs() / 60;
            if mins >= PREPARING_CRITICAL_MINS {
                Alert {
                    level: Some(AlertLevel::Red),
                    blink: true,
                }
            } else if mins >= PREPARING_WARN_MINS {
                Alert {
                    level: Some(AlertLevel::Yellow),
                    blink: true,
                }
            } else {
                Alert::NONE
            }
        }
        Stage::Ready => {
            let mins = elapsed_since_update.as_secs() / 60;
            if mins >= READY_REMINDER_MINS {
                Alert {
                    level: Some(AlertLevel::Green),
                    blink: true,
                }
            } else {
                Alert::NONE
            }
        }
        Stage::Sent | Stage::Delivered => Alert::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mins(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    #[test]
    fn test_preparing_thresholds() {
        assert_eq!(alert_for(Stage::Preparing, mins(29), mins(29)), Alert::NONE);

        let warn = alert_for(Stage::Preparing, mins(30), mins(30));
        assert_eq!(warn.level, Some(AlertLevel::Yellow));
        assert!(warn.blink);

        let critical = alert_for(Stage::Preparing, mins(55), mins(10));
        assert_eq!(critical.level, Some(AlertLevel::Red));
    }

    #[test]
    fn test_ready_counts_from_last_update() {
        // Order is old, but only just became ready: no alert yet
        assert_eq!(alert_for(Stage::Ready, mins(90), mins(5)), Alert::NONE);

        let reminder = alert_for(Stage::Ready, mins(90), mins(20));
        assert_eq!(reminder.level, Some(AlertLevel::Green));
    }

    #[test]
    fn test_sent_and_delivered_never_alert() {
        assert_eq!(alert_for(Stage::Sent, mins(120), mins(120)), Alert::NONE);
        assert_eq!(alert_for(Stage::Delivered, mins(120), mins(120)), Alert::NONE);
    }

    #[test]
    fn test_escalate_keeps_worst() {
        let mut alert = Alert {
            level: Some(AlertLevel::Yellow),
            blink: false,
        };
        alert.escalate(Alert {
            level: Some(AlertLevel::Red),
            blink: true,
        });
        assert_eq!(alert.level, Some(AlertLevel::Red));
        assert!(alert.blink);

        // Lower severity does not downgrade
        alert.escalate(Alert {
            level: Some(AlertLevel::Green),
            blink: false,
        });
        assert_eq!(alert.level, Some(AlertLevel::Red));
    }

    #[test]
    fn test_escalate_from_empty() {
        let mut alert = Alert::NONE;
        alert.escalate(Alert {
            level: Some(AlertLevel::Green),
            blink: true,
        });
        assert_eq!(alert.level, Some(AlertLevel::Green));
    }
}
