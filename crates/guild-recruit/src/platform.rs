//! Ports onto the chat platform. The platform client itself (session,
//! reconnects, rendering) is an external collaborator; the workflow only
//! depends on these seams.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::recruitment::domain::{
    ApplicationAnswers, ChannelId, GuildId, MessageId, RoleId, UserId,
};

/// Error enumeration for platform calls. Deliveries are best-effort at the
/// call sites; these errors are logged, never escalated past the owning
/// transition.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// Live registry of a guild's channels, roles, and memberships.
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    async fn channel_exists(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
    ) -> Result<bool, PlatformError>;

    async fn role_exists(&self, guild: &GuildId, role: &RoleId) -> Result<bool, PlatformError>;

    async fn grant_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
    ) -> Result<(), PlatformError>;
}

/// Content for a review card posted to the review channel. The applicant
/// reference travels on the card itself so a later decision binds to the
/// exact submission that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCardDraft {
    pub applicant: UserId,
    pub submitted_at: DateTime<Utc>,
    pub answers: ApplicationAnswers,
}

/// Content for the public apply control created on wizard commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryControlDraft {
    pub title: String,
    pub accent: String,
}

/// One embed-style post to a guild's log channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPost {
    pub text: String,
    pub accent: String,
}

/// Outbound messaging surface of the platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn direct_message(&self, user: &UserId, text: &str) -> Result<(), PlatformError>;

    async fn post_review_card(
        &self,
        channel: &ChannelId,
        draft: ReviewCardDraft,
    ) -> Result<MessageId, PlatformError>;

    /// Disable the three decision controls on a posted review card. This write
    /// is the de facto decision mutex: late reviewers see a disabled card.
    async fn disable_review_controls(&self, message: &MessageId) -> Result<(), PlatformError>;

    async fn post_entry_control(
        &self,
        channel: &ChannelId,
        draft: EntryControlDraft,
    ) -> Result<(), PlatformError>;

    async fn post_log(&self, channel: &ChannelId, post: LogPost) -> Result<(), PlatformError>;
}
