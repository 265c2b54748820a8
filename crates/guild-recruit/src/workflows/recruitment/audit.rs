use std::sync::Arc;

use tracing::warn;

use super::domain::GuildId;
use crate::platform::{LogPost, Messenger};
use crate::storage::RecruitmentStore;

/// Categories of administrative events posted to a guild's log channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    SubmissionReceived,
    ApplicationAccepted,
    ApplicationRejected,
    UserBlocked,
    BlockRemoved,
    CooldownCleared,
    SetupCompleted,
}

impl AuditKind {
    /// Accent color rendered on the log embed.
    pub const fn accent(self) -> &'static str {
        match self {
            AuditKind::SubmissionReceived => "#0099ff",
            AuditKind::ApplicationAccepted | AuditKind::SetupCompleted => "#00ff00",
            AuditKind::ApplicationRejected | AuditKind::UserBlocked => "#ff0000",
            AuditKind::BlockRemoved => "#00ff00",
            AuditKind::CooldownCleared => "#00ffff",
        }
    }
}

/// Best-effort delivery of administrative events to the guild's configured
/// log channel. Missing configuration or a failed post never fails the
/// owning operation; both are logged and swallowed here.
pub struct AuditTrail<S, M> {
    store: Arc<S>,
    messenger: Arc<M>,
}

impl<S, M> Clone for AuditTrail<S, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            messenger: self.messenger.clone(),
        }
    }
}

impl<S: RecruitmentStore, M: Messenger> AuditTrail<S, M> {
    pub fn new(store: Arc<S>, messenger: Arc<M>) -> Self {
        Self { store, messenger }
    }

    pub async fn record(&self, guild: &GuildId, kind: AuditKind, text: String) {
        let log_channel = match self.store.guild_settings(guild).await {
            Ok(Some(settings)) => settings.log_channel,
            Ok(None) => None,
            Err(error) => {
                warn!(%guild, %error, "audit log skipped: settings unavailable");
                return;
            }
        };

        let Some(channel) = log_channel else {
            return;
        };

        let post = LogPost {
            text,
            accent: kind.accent().to_string(),
        };
        if let Err(error) = self.messenger.post_log(&channel, post).await {
            warn!(%guild, %channel, %error, "audit log delivery failed");
        }
    }
}
