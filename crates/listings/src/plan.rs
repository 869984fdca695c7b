//! Plan tiers and capability gating
//!
//! Every merchant carries a plan tier that gates which modules are
//! enabled for it. Tier data arrives in several historical forms: a
//! numeric level, a slug, a display name, or explicit boolean capability
//! columns. Explicit booleans always win over tier-derived defaults.

use serde::{Deserialize, Serialize};

/// Plan tiers, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Free tier: profile basics only
    Basic = 0,
    /// Paid tier: public profile, gallery, nearby placement
    Regular = 1,
    /// Adds menu and daily specials
    Plus = 2,
    /// Adds online pickup orders
    Premium = 3,
}

impl PlanTier {
    /// Numeric level of the tier
    #[must_use]
    pub fn level(self) -> i32 {
        self as i32
    }

    /// Tier from a numeric level, clamped to the known range
    #[must_use]
    pub fn from_level(level: i32) -> Self {
        match level.clamp(0, 3) {
            0 => Self::Basic,
            1 => Self::Regular,
            2 => Self::Plus,
            _ => Self::Premium,
        }
    }

    /// Tier from a free-form slug or display name
    ///
    /// Historical rows store anything from `plus` to `Findixi Plus
    /// (monthly)`; match on the tier word anywhere in the string.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.contains("premium") {
            Some(Self::Premium)
        } else if name.contains("plus") {
            Some(Self::Plus)
        } else if name.contains("regular") {
            Some(Self::Regular)
        } else if name.contains("basic") {
            Some(Self::Basic)
        } else {
            None
        }
    }
}

/// Capability flags derived from (or overriding) a plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCapabilities {
    /// Public profile page enabled
    pub profile: bool,
    /// Eligible for nearby-suggestion placement
    pub nearby: bool,
    /// Menu module enabled
    pub menu: bool,
    /// Daily specials module enabled
    pub specials: bool,
    /// Online pickup orders enabled
    pub orders: bool,
}

impl PlanCapabilities {
    /// Default capabilities for a tier
    #[must_use]
    pub fn for_tier(tier: PlanTier) -> Self {
        let level = tier.level();
        Self {
            profile: level >= 1,
            nearby: level >= 1,
            menu: level >= 2,
            specials: level >= 2,
            orders: level >= 3,
        }
    }
}

/// Resolved plan for one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Tier the listing is on
    pub tier: PlanTier,
    /// Effective capabilities after explicit overrides
    pub capabilities: PlanCapabilities,
}

impl Plan {
    /// Resolve a plan from whatever the row carries.
    ///
    /// A listing with neither an explicit tier nor explicit capability
    /// flags predates the plan system and is treated as Regular.
    #[must_use]
    pub fn resolve(level: Option<i32>, nearby_override: Option<bool>) -> Self {
        let tier = match level {
            Some(level) => PlanTier::from_level(level),
            None => PlanTier::Regular,
        };

        let mut capabilities = PlanCapabilities::for_tier(tier);
        if let Some(nearby) = nearby_override {
            capabilities.nearby = nearby;
        }

        Self { tier, capabilities }
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}
