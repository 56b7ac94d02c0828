//! Tier-based feature gating.
//!
//! Tiers are strictly additive supersets: Basic ⊂ Pro ⊂ Enterprise. The
//! table is built once and never mutated at runtime; issued licenses carry
//! a snapshot of their tier's feature set, so later changes to this table
//! never retroactively alter keys that are already in the field.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Basic,
    Pro,
    Enterprise,
}

const BASIC_FEATURES: &[&str] = &[
    "assets",
    "work-orders",
    "pm-scheduling",
    "mobile-app",
];

const PRO_EXTRAS: &[&str] = &[
    "inventory",
    "purchase-orders",
    "reporting",
    "api-access",
];

const ENTERPRISE_EXTRAS: &[&str] = &[
    "multi-site",
    "custom-fields",
    "sso",
    "audit-export",
];

fn feature_table() -> &'static [BTreeSet<&'static str>; 3] {
    static TABLE: OnceLock<[BTreeSet<&'static str>; 3]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let basic: BTreeSet<&str> = BASIC_FEATURES.iter().copied().collect();

        let mut pro = basic.clone();
        pro.extend(PRO_EXTRAS);

        let mut enterprise = pro.clone();
        enterprise.extend(ENTERPRISE_EXTRAS);

        [basic, pro, enterprise]
    })
}

/// The full feature set enabled for a tier, sorted for deterministic
/// serialization into signed license payloads.
pub fn features_for_tier(tier: Tier) -> Vec<String> {
    let idx = match tier {
        Tier::Basic => 0,
        Tier::Pro => 1,
        Tier::Enterprise => 2,
    };
    feature_table()[idx].iter().map(|s| s.to_string()).collect()
}

/// Check whether a capability key is enabled for a tier.
pub fn tier_has_feature(tier: Tier, feature: &str) -> bool {
    let idx = match tier {
        Tier::Basic => 0,
        Tier::Pro => 1,
        Tier::Enterprise => 2,
    };
    feature_table()[idx].contains(feature)
}
