//! Prefixed ID generation for Ratchet entities.
//!
//! All IDs use an `rl_` brand prefix so a license id can never be confused
//! with a customer-supplied hardware fingerprint or an external identifier.
//!
//! Format: `rl_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &["rl_cust_", "rl_lic_", "rl_act_", "rl_rel_", "rl_aud_"];

/// Validate that a string is a valid Ratchet prefixed ID.
///
/// This is a cheap check to reject garbage before hitting the database.
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs in Ratchet.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Customer,
    License,
    Activation,
    Release,
    AuditLog,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Customer => "rl_cust",
            Self::License => "rl_lic",
            Self::Activation => "rl_act",
            Self::Release => "rl_rel",
            Self::AuditLog => "rl_aud",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}
