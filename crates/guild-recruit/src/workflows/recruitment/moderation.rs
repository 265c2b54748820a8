use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::audit::{AuditKind, AuditTrail};
use super::domain::{Actor, ApplicationStatus, CounterField, GuildCounters, GuildId, UserId};
use super::eligibility::{CooldownReset, EligibilityEngine};
use crate::platform::Messenger;
use crate::storage::{RecruitmentStore, StoreError};

/// Outcome of a manual `block` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Blocked,
    AlreadyBlocked,
}

/// Outcome of a `remove-block` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnblockOutcome {
    Removed,
    NotBlocked,
}

/// Stats view rendered for reviewers: the monotonic counters plus a live
/// count of the guild's blocklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildStats {
    pub counters: GuildCounters,
    pub blocklisted: u64,
}

/// A user's standing as reported by `check-user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStanding {
    pub blocked: bool,
    pub history: Option<UserHistory>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserHistory {
    pub submissions: usize,
    pub last_application_at: DateTime<Utc>,
    pub last_status: Option<ApplicationStatus>,
}

/// Administrative commands over the blocklist, counters, and cooldowns.
/// Authorization is resolved by the caller before these run.
pub struct ModerationService<S, M> {
    store: Arc<S>,
    audit: AuditTrail<S, M>,
    eligibility: EligibilityEngine<S>,
}

impl<S, M> ModerationService<S, M>
where
    S: RecruitmentStore,
    M: Messenger,
{
    pub fn new(store: Arc<S>, messenger: Arc<M>, cooldown: std::time::Duration) -> Self {
        let audit = AuditTrail::new(store.clone(), messenger);
        let eligibility = EligibilityEngine::new(store.clone(), cooldown);
        Self {
            store,
            audit,
            eligibility,
        }
    }

    pub async fn block(
        &self,
        guild: &GuildId,
        target: &UserId,
        moderator: &Actor,
    ) -> Result<BlockOutcome, StoreError> {
        if !self.store.insert_block(guild, target).await? {
            return Ok(BlockOutcome::AlreadyBlocked);
        }

        if let Err(error) = self
            .store
            .increment_counter(guild, CounterField::BlockedUsers)
            .await
        {
            warn!(%guild, %error, "blocked-users counter not incremented");
        }

        self.audit
            .record(
                guild,
                AuditKind::UserBlocked,
                format!(
                    "{target} blocked from the application system by {}",
                    moderator.user
                ),
            )
            .await;

        Ok(BlockOutcome::Blocked)
    }

    pub async fn remove_block(
        &self,
        guild: &GuildId,
        target: &UserId,
        moderator: &Actor,
    ) -> Result<UnblockOutcome, StoreError> {
        if !self.store.remove_block(guild, target).await? {
            return Ok(UnblockOutcome::NotBlocked);
        }

        self.audit
            .record(
                guild,
                AuditKind::BlockRemoved,
                format!("Block removed from {target} by {}", moderator.user),
            )
            .await;

        Ok(UnblockOutcome::Removed)
    }

    pub async fn stats(&self, guild: &GuildId) -> Result<GuildStats, StoreError> {
        let counters = self.store.counters(guild).await?;
        let blocklisted = self.store.blocked_count(guild).await?;
        Ok(GuildStats {
            counters,
            blocklisted,
        })
    }

    pub async fn check_user(
        &self,
        guild: &GuildId,
        target: &UserId,
    ) -> Result<UserStanding, StoreError> {
        let blocked = self.store.is_blocked(guild, target).await?;
        let history = self
            .store
            .applicant(target)
            .await?
            .map(|record| UserHistory {
                submissions: record.submissions.len(),
                last_application_at: record.last_application_at,
                last_status: record.last_status,
            });
        Ok(UserStanding { blocked, history })
    }

    pub async fn clear_cooldown(
        &self,
        guild: &GuildId,
        target: &UserId,
        moderator: &Actor,
    ) -> Result<CooldownReset, StoreError> {
        let reset = self.eligibility.clear_cooldown(target).await?;

        if reset == CooldownReset::Cleared {
            self.audit
                .record(
                    guild,
                    AuditKind::CooldownCleared,
                    format!("Cooldown cleared for {target} by {}", moderator.user),
                )
                .await;
        }

        Ok(reset)
    }
}
