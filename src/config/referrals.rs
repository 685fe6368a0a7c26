//! Referral and campaign settings loaded from the `[referrals]` table of config.toml.

use crate::errors::{Error, Result};
use serde::Deserialize;

/// Longest random suffix a generated campaign slug may carry.
pub const MAX_SLUG_SUFFIX_LENGTH: usize = 16;

/// Tunables for generated identifiers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ReferralSettings {
    /// Random characters appended to a slugified campaign label
    pub slug_suffix_length: usize,
    /// Generation attempts for slugs and referral codes before a collision is surfaced
    pub slug_attempts: u32,
    /// Length of a shop's generated referral code
    pub referral_code_length: usize,
}

impl Default for ReferralSettings {
    fn default() -> Self {
        Self {
            slug_suffix_length: 4,
            slug_attempts: 3,
            referral_code_length: 8,
        }
    }
}

impl ReferralSettings {
    /// Rejects settings that could never produce a valid identifier.
    ///
    /// # Errors
    /// Returns a `Config` error for an oversized slug suffix or an empty referral code.
    pub fn validate(&self) -> Result<()> {
        if self.slug_suffix_length > MAX_SLUG_SUFFIX_LENGTH {
            return Err(Error::Config {
                message: format!(
                    "referrals.slug_suffix_length must be at most {MAX_SLUG_SUFFIX_LENGTH}, got {}",
                    self.slug_suffix_length
                ),
            });
        }
        if self.referral_code_length == 0 {
            return Err(Error::Config {
                message: "referrals.referral_code_length must be positive".to_string(),
            });
        }
        Ok(())
    }
}
