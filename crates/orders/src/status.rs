//! Order status parsing and the stage state machine
//!
//! The wire carries several historical status strings; the board works in
//! four stages. Transitions exposed to staff form a strict linear chain
//! with no skipping and no backward moves:
//!
//! ```text
//! Sent -> Preparing -> Ready -> Delivered
//! ```

use serde::{Deserialize, Serialize};

/// Stage of an order on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Placed and paid for, waiting for the kitchen to accept
    Sent,
    /// Accepted and being prepared
    Preparing,
    /// Ready for pickup
    Ready,
    /// Handed to the customer; drops off the board
    Delivered,
}

impl Stage {
    /// Parse a wire status string into a stage.
    ///
    /// `paid`, `sent` and `confirmed` all map to [`Stage::Sent`]; they
    /// are pre-acceptance variations the board does not distinguish.
    #[must_use]
    pub fn from_wire(status: &str) -> Option<Self> {
        match status.trim().to_lowercase().as_str() {
            "paid" | "sent" | "confirmed" => Some(Self::Sent),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Wire value written when transitioning into this stage
    #[must_use]
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
        }
    }

    /// The only transition offered from this stage, if any.
    ///
    /// Delivered is terminal. There is deliberately no way to express a
    /// skip or a backward move here; the one action per stage is the
    /// whole interface.
    #[must_use]
    pub fn next_action(self) -> Option<StageAction> {
        match self {
            Self::Sent => Some(StageAction {
                next: Self::Preparing,
                label: "Accept order",
            }),
            Self::Preparing => Some(StageAction {
                next: Self::Ready,
                label: "Mark ready",
            }),
            Self::Ready => Some(StageAction {
                next: Self::Delivered,
                label: "Mark delivered",
            }),
            Self::Delivered => None,
        }
    }

    /// Stages that keep an order on the board
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Delivered)
    }

    /// Display label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Sent => "Sent",
            Self::Preparing => "Preparing",
            Self::Ready => "Ready",
            Self::Delivered => "Delivered",
        }
    }
}

/// The single action offered from a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageAction {
    /// Stage the action transitions into
    pub next: Stage,
    /// Button label
    pub label: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_acceptance_statuses_collapse_to_sent() {
        assert_eq!(Stage::from_wire("paid"), Some(Stage::Sent));
        assert_eq!(Stage::from_wire("sent"), Some(Stage::Sent));
        assert_eq!(Stage::from_wire("CONFIRMED"), Some(Stage::Sent));
    }

    #[test]
    fn test_unknown_status_is_none() {
        assert_eq!(Stage::from_wire("refunded"), None);
        assert_eq!(Stage::from_wire(""), None);
    }

    #[test]
    fn test_chain_is_strictly_linear() {
        assert_eq!(Stage::Sent.next_action().unwrap().next, Stage::Preparing);
        assert_eq!(Stage::Preparing.next_action().unwrap().next, Stage::Ready);
        assert_eq!(Stage::Ready.next_action().unwrap().next, Stage::Delivered);
        assert!(Stage::Delivered.next_action().is_none());
    }

    #[test]
    fn test_no_transition_skips_or_goes_backward() {
        // Walk the chain from Sent; each step advances exactly one stage
        let chain = [Stage::Sent, Stage::Preparing, Stage::Ready, Stage::Delivered];
        for window in chain.windows(2) {
            let action = window[0].next_action().unwrap();
            assert_eq!(action.next, window[1]);
        }
    }

    #[test]
    fn test_active_stages() {
        assert!(Stage::Sent.is_active());
        assert!(Stage::Preparing.is_active());
        assert!(Stage::Ready.is_active());
        assert!(!Stage::Delivered.is_active());
    }

    #[test]
    fn test_wire_round_trip() {
        for stage in [Stage::Sent, Stage::Preparing, Stage::Ready, Stage::Delivered] {
            assert_eq!(Stage::from_wire(stage.wire_value()), Some(stage));
        }
    }
}
