//! Persistence gateway: typed, entity-scoped access to the five record
//! collections. No business logic lives here; callers compose the atomic
//! operations below and rely on their retry-safety (idempotent upserts,
//! additive increments, append-only history pushes).

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::workflows::recruitment::domain::{
    ApplicantRecord, ApplicationStatus, ChannelId, CounterField, GuildCounters, GuildId,
    GuildSettings, RoleId, StagedSettings, SubmissionEntry, UserId,
};

/// Error enumeration for gateway failures. Logical outcomes (duplicate block,
/// unknown applicant) are expressed in return values, not errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Single-field update applied to a guild's staged settings, mirroring the
/// wizard's step-at-a-time writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedPatch {
    ReviewChannel(ChannelId),
    AdminRoles(std::collections::BTreeSet<RoleId>),
    StaffRoles(std::collections::BTreeSet<RoleId>),
    LogChannel(ChannelId),
}

/// Document-level operations over the recruitment collections. Every write is
/// scoped to a single natural key and safe to retry, except the history push:
/// callers must ensure at-most-once invocation per logical submission.
#[async_trait]
pub trait RecruitmentStore: Send + Sync {
    async fn guild_settings(&self, guild: &GuildId) -> Result<Option<GuildSettings>, StoreError>;

    /// Upsert the committed settings for a guild.
    async fn put_guild_settings(&self, settings: GuildSettings) -> Result<(), StoreError>;

    async fn staged_settings(&self, guild: &GuildId) -> Result<Option<StagedSettings>, StoreError>;

    /// Replace any staged record wholesale (last wizard run wins).
    async fn replace_staged_settings(&self, staged: StagedSettings) -> Result<(), StoreError>;

    /// Upsert a single staged field, creating the record if absent.
    async fn patch_staged_settings(
        &self,
        guild: &GuildId,
        patch: StagedPatch,
    ) -> Result<(), StoreError>;

    async fn delete_staged_settings(&self, guild: &GuildId) -> Result<(), StoreError>;

    async fn applicant(&self, user: &UserId) -> Result<Option<ApplicantRecord>, StoreError>;

    /// Atomically push a submission onto the applicant's history, stamp the
    /// last-application time, and mark the record pending (upsert).
    async fn append_submission(
        &self,
        user: &UserId,
        entry: SubmissionEntry,
    ) -> Result<(), StoreError>;

    /// Set the applicant's current status (upsert; a record created here gets
    /// an empty history and `now` as its last-application time).
    async fn set_last_status(
        &self,
        user: &UserId,
        status: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Operator reset: rewind the last-application time to epoch zero without
    /// touching status or history. Returns false when the user never applied
    /// (no record is created in that case).
    async fn reset_cooldown(&self, user: &UserId) -> Result<bool, StoreError>;

    async fn is_blocked(&self, guild: &GuildId, user: &UserId) -> Result<bool, StoreError>;

    /// Insert a blocklist entry; returns false when the pair already exists.
    async fn insert_block(&self, guild: &GuildId, user: &UserId) -> Result<bool, StoreError>;

    /// Remove a blocklist entry; returns false when the pair was absent.
    async fn remove_block(&self, guild: &GuildId, user: &UserId) -> Result<bool, StoreError>;

    async fn blocked_count(&self, guild: &GuildId) -> Result<u64, StoreError>;

    /// Current counters for a guild, zeroed when none were recorded yet.
    async fn counters(&self, guild: &GuildId) -> Result<GuildCounters, StoreError>;

    /// Atomic upsert-and-increment of a single counter field.
    async fn increment_counter(
        &self,
        guild: &GuildId,
        field: CounterField,
    ) -> Result<(), StoreError>;
}
