use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use super::audit::{AuditKind, AuditTrail};
use super::domain::{Actor, ChannelId, GuildId, GuildSettings, RoleId, StagedSettings};
use crate::config::FormConfig;
use crate::platform::{EntryControlDraft, GuildDirectory, Messenger, PlatformError};
use crate::storage::{RecruitmentStore, StagedPatch, StoreError};

/// The control enabling the next wizard step, in strict sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPrompt {
    SelectReviewChannel,
    AdminRoles,
    StaffRoles,
    LogChannel,
    Commit,
}

impl SetupPrompt {
    pub const fn control_id(self) -> &'static str {
        match self {
            SetupPrompt::SelectReviewChannel => "setup_channel_select",
            SetupPrompt::AdminRoles => "setup_next_admin_roles",
            SetupPrompt::StaffRoles => "setup_next_staff_roles",
            SetupPrompt::LogChannel => "setup_next_log_channel",
            SetupPrompt::Commit => "complete_setup",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Commit was attempted without a staged record (crash, duplicate commit).
    /// The actor is told to restart setup; nothing is modified.
    #[error("no staged settings found; setup must be restarted")]
    RestartRequired,
    #[error("channel {0} does not resolve in this guild")]
    UnknownChannel(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result of a single-channel wizard step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStep {
    pub channel: ChannelId,
    pub next: SetupPrompt,
}

/// Result of a role-list wizard step. Unresolvable ids are dropped with a
/// warning rather than aborting the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleStep {
    pub accepted: usize,
    pub dropped: Vec<String>,
    pub next: SetupPrompt,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub settings: GuildSettings,
    pub entry_posted: bool,
}

/// Drives the four-step guild configuration sequence, holding in-progress
/// state in `StagedSettings` until an explicit commit promotes it.
pub struct SetupWizard<S, D, M> {
    store: Arc<S>,
    directory: Arc<D>,
    messenger: Arc<M>,
    audit: AuditTrail<S, M>,
    form: FormConfig,
}

impl<S, D, M> SetupWizard<S, D, M>
where
    S: RecruitmentStore,
    D: GuildDirectory,
    M: Messenger,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, messenger: Arc<M>, form: FormConfig) -> Self {
        let audit = AuditTrail::new(store.clone(), messenger.clone());
        Self {
            store,
            directory,
            messenger,
            audit,
            form,
        }
    }

    /// Start (or restart) a wizard run. Any prior staged record is replaced
    /// wholesale: the last wizard run wins, partial runs are never merged.
    pub async fn begin(&self, guild: &GuildId) -> Result<SetupPrompt, SetupError> {
        self.store
            .replace_staged_settings(StagedSettings::fresh(guild.clone()))
            .await?;
        Ok(SetupPrompt::SelectReviewChannel)
    }

    pub async fn set_review_channel(
        &self,
        guild: &GuildId,
        raw_id: &str,
    ) -> Result<ChannelStep, SetupError> {
        let channel = self.resolve_channel(guild, raw_id).await?;
        self.store
            .patch_staged_settings(guild, StagedPatch::ReviewChannel(channel.clone()))
            .await?;
        Ok(ChannelStep {
            channel,
            next: SetupPrompt::AdminRoles,
        })
    }

    pub async fn set_admin_roles(
        &self,
        guild: &GuildId,
        raw_ids: &str,
    ) -> Result<RoleStep, SetupError> {
        let (roles, dropped) = self.resolve_roles(guild, raw_ids).await?;
        let accepted = roles.len();
        self.store
            .patch_staged_settings(guild, StagedPatch::AdminRoles(roles))
            .await?;
        Ok(RoleStep {
            accepted,
            dropped,
            next: SetupPrompt::StaffRoles,
        })
    }

    pub async fn set_staff_roles(
        &self,
        guild: &GuildId,
        raw_ids: &str,
    ) -> Result<RoleStep, SetupError> {
        let (roles, dropped) = self.resolve_roles(guild, raw_ids).await?;
        let accepted = roles.len();
        self.store
            .patch_staged_settings(guild, StagedPatch::StaffRoles(roles))
            .await?;
        Ok(RoleStep {
            accepted,
            dropped,
            next: SetupPrompt::LogChannel,
        })
    }

    pub async fn set_log_channel(
        &self,
        guild: &GuildId,
        raw_id: &str,
    ) -> Result<ChannelStep, SetupError> {
        let channel = self.resolve_channel(guild, raw_id).await?;
        self.store
            .patch_staged_settings(guild, StagedPatch::LogChannel(channel.clone()))
            .await?;
        Ok(ChannelStep {
            channel,
            next: SetupPrompt::Commit,
        })
    }

    /// Promote the staged record into committed settings, create the public
    /// apply control in the review channel, delete the staged record, and log
    /// completion. A missing staged record terminates with `RestartRequired`.
    pub async fn commit(&self, guild: &GuildId, actor: &Actor) -> Result<CommitOutcome, SetupError> {
        let staged = self
            .store
            .staged_settings(guild)
            .await?
            .ok_or(SetupError::RestartRequired)?;

        let settings = staged.into_settings();
        self.store.put_guild_settings(settings.clone()).await?;

        let entry_posted = match &settings.review_channel {
            Some(channel) => {
                let draft = EntryControlDraft {
                    title: self.form.title.clone(),
                    accent: self.form.accent.clone(),
                };
                match self.messenger.post_entry_control(channel, draft).await {
                    Ok(()) => true,
                    Err(error) => {
                        warn!(%guild, %channel, %error, "apply control could not be posted");
                        false
                    }
                }
            }
            None => {
                warn!(%guild, "setup committed without a review channel; apply control skipped");
                false
            }
        };

        self.store.delete_staged_settings(guild).await?;

        self.audit
            .record(
                guild,
                AuditKind::SetupCompleted,
                format!("Recruitment setup completed by {}", actor.user),
            )
            .await;

        Ok(CommitOutcome {
            settings,
            entry_posted,
        })
    }

    async fn resolve_channel(
        &self,
        guild: &GuildId,
        raw_id: &str,
    ) -> Result<ChannelId, SetupError> {
        let candidate = ChannelId(raw_id.trim().to_string());
        if candidate.0.is_empty() || !self.directory.channel_exists(guild, &candidate).await? {
            return Err(SetupError::UnknownChannel(candidate.0));
        }
        Ok(candidate)
    }

    async fn resolve_roles(
        &self,
        guild: &GuildId,
        raw_ids: &str,
    ) -> Result<(BTreeSet<RoleId>, Vec<String>), SetupError> {
        let mut roles = BTreeSet::new();
        let mut dropped = Vec::new();

        for raw in raw_ids.split(',') {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let candidate = RoleId(trimmed.to_string());
            if self.directory.role_exists(guild, &candidate).await? {
                roles.insert(candidate);
            } else {
                dropped.push(candidate.0);
            }
        }

        if !dropped.is_empty() {
            warn!(%guild, dropped = ?dropped, "unresolvable role ids dropped during setup");
        }

        Ok((roles, dropped))
    }
}
