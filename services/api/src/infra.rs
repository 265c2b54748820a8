use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use guild_recruit::platform::{
    EntryControlDraft, GuildDirectory, LogPost, Messenger, PlatformError, ReviewCardDraft,
};
use guild_recruit::workflows::recruitment::domain::{
    ChannelId, GuildId, MessageId, RoleId, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Directory stand-in for running without a connected chat platform: every
/// channel and role resolves, and grants are recorded in the logs only.
#[derive(Default)]
pub(crate) struct InProcessDirectory;

#[async_trait]
impl GuildDirectory for InProcessDirectory {
    async fn channel_exists(
        &self,
        _guild: &GuildId,
        _channel: &ChannelId,
    ) -> Result<bool, PlatformError> {
        Ok(true)
    }

    async fn role_exists(&self, _guild: &GuildId, _role: &RoleId) -> Result<bool, PlatformError> {
        Ok(true)
    }

    async fn grant_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
    ) -> Result<(), PlatformError> {
        info!(%guild, %user, %role, "role granted");
        Ok(())
    }
}

/// Messenger stand-in that renders every outbound delivery as a log line and
/// hands out locally sequenced message ids.
#[derive(Default)]
pub(crate) struct LoggingMessenger {
    sequence: AtomicU64,
}

#[async_trait]
impl Messenger for LoggingMessenger {
    async fn direct_message(&self, user: &UserId, text: &str) -> Result<(), PlatformError> {
        info!(%user, text, "direct message sent");
        Ok(())
    }

    async fn post_review_card(
        &self,
        channel: &ChannelId,
        draft: ReviewCardDraft,
    ) -> Result<MessageId, PlatformError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        info!(%channel, applicant = %draft.applicant, "review card posted");
        Ok(MessageId(format!("local-{id}")))
    }

    async fn disable_review_controls(&self, message: &MessageId) -> Result<(), PlatformError> {
        info!(message = %message.0, "review controls disabled");
        Ok(())
    }

    async fn post_entry_control(
        &self,
        channel: &ChannelId,
        draft: EntryControlDraft,
    ) -> Result<(), PlatformError> {
        info!(%channel, title = draft.title, "apply control posted");
        Ok(())
    }

    async fn post_log(&self, channel: &ChannelId, post: LogPost) -> Result<(), PlatformError> {
        info!(%channel, text = post.text, "log entry posted");
        Ok(())
    }
}
