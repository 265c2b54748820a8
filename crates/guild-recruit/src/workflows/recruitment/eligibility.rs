use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::domain::{GuildId, UserId};
use crate::storage::{RecruitmentStore, StoreError};

/// Outcome of an eligibility check for a new application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Blocklisted users never recover eligibility by waiting.
    Blocked,
    OnCooldown {
        remaining: Duration,
    },
}

/// Outcome of an operator cooldown reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownReset {
    Cleared,
    NeverApplied,
}

/// Render a remaining cooldown as whole hours and minutes.
pub fn format_remaining(remaining: Duration) -> String {
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    format!("{hours} hours and {minutes} minutes")
}

/// Decides whether a user may submit a new application: blocklist first, then
/// the elapsed-time window since the last submission. The cooldown window is
/// the sole re-application gate; a pending review does not block a new apply.
pub struct EligibilityEngine<S> {
    store: Arc<S>,
    cooldown: Duration,
}

impl<S> Clone for EligibilityEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cooldown: self.cooldown,
        }
    }
}

impl<S: RecruitmentStore> EligibilityEngine<S> {
    /// `cooldown` comes pre-validated against [`crate::config::MAX_COOLDOWN`];
    /// a window beyond chrono's range is treated as never elapsing.
    pub fn new(store: Arc<S>, cooldown: std::time::Duration) -> Self {
        let cooldown = Duration::from_std(cooldown).unwrap_or(Duration::MAX);
        Self { store, cooldown }
    }

    pub async fn check(
        &self,
        guild: &GuildId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Eligibility, StoreError> {
        if self.store.is_blocked(guild, user).await? {
            return Ok(Eligibility::Blocked);
        }

        // Missing record means an epoch-zero baseline, so the window has
        // always elapsed.
        let last_application_at = self
            .store
            .applicant(user)
            .await?
            .map(|record| record.last_application_at)
            .unwrap_or(DateTime::UNIX_EPOCH);

        let remaining = last_application_at
            .checked_add_signed(self.cooldown)
            .map(|expires_at| expires_at - now)
            .unwrap_or(Duration::MAX);
        if remaining > Duration::zero() {
            Ok(Eligibility::OnCooldown { remaining })
        } else {
            Ok(Eligibility::Eligible)
        }
    }

    /// Unconditionally clear a user's cooldown without altering status or
    /// history. Reports `NeverApplied` (and creates nothing) when the user
    /// has no record.
    pub async fn clear_cooldown(&self, user: &UserId) -> Result<CooldownReset, StoreError> {
        if self.store.reset_cooldown(user).await? {
            Ok(CooldownReset::Cleared)
        } else {
            Ok(CooldownReset::NeverApplied)
        }
    }
}
