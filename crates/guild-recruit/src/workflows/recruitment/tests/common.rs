use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::config::{FormConfig, RecruitmentConfig, ReplyMessages};
use crate::platform::{
    EntryControlDraft, GuildDirectory, LogPost, Messenger, PlatformError, ReviewCardDraft,
};
use crate::storage::{MemoryStore, RecruitmentStore, StagedPatch, StoreError};
use crate::workflows::recruitment::domain::{
    Actor, ApplicantRecord, ApplicationAnswers, ApplicationStatus, ChannelId, CounterField,
    GuildCounters, GuildId, GuildSettings, MessageId, RoleId, StagedSettings, SubmissionEntry,
    UserId,
};
use crate::workflows::recruitment::events::Dispatcher;

pub(super) fn guild() -> GuildId {
    GuildId("guild-1".to_string())
}

pub(super) fn applicant() -> UserId {
    UserId("user-7".to_string())
}

pub(super) fn admin() -> Actor {
    Actor {
        user: UserId("admin-1".to_string()),
        roles: BTreeSet::new(),
        is_administrator: true,
    }
}

pub(super) fn member(user: &str, roles: &[&str]) -> Actor {
    Actor {
        user: UserId(user.to_string()),
        roles: roles.iter().map(|role| RoleId(role.to_string())).collect(),
        is_administrator: false,
    }
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp")
}

pub(super) fn answers() -> ApplicationAnswers {
    ApplicationAnswers([
        "Jordan".to_string(),
        "21".to_string(),
        "I want to help keep the community welcoming.".to_string(),
        "Two years moderating a mid-size community.".to_string(),
        "Around 15 hours per week, mostly evenings.".to_string(),
    ])
}

pub(super) fn recruitment_config() -> RecruitmentConfig {
    RecruitmentConfig {
        cooldown: Duration::from_secs(24 * 3600),
        form: FormConfig {
            title: "Staff Application".to_string(),
            accent: "#0099ff".to_string(),
            prompts: [
                "What should we call you?".to_string(),
                "How old are you?".to_string(),
                "Why do you want to join the staff team?".to_string(),
                "What relevant experience do you have?".to_string(),
                "How many hours per week can you be active?".to_string(),
            ],
        },
        messages: ReplyMessages {
            submitted: "Your application has been submitted for review.".to_string(),
            accepted: "Application accepted:".to_string(),
            rejected: "Application rejected:".to_string(),
        },
    }
}

pub(super) async fn seed_settings(
    store: &MemoryStore,
    review_channel: Option<&str>,
    admin_roles: &[&str],
    staff_roles: &[&str],
    log_channel: Option<&str>,
) {
    store
        .put_guild_settings(GuildSettings {
            guild: guild(),
            review_channel: review_channel.map(|id| ChannelId(id.to_string())),
            admin_roles: admin_roles
                .iter()
                .map(|role| RoleId(role.to_string()))
                .collect(),
            staff_roles: staff_roles
                .iter()
                .map(|role| RoleId(role.to_string()))
                .collect(),
            log_channel: log_channel.map(|id| ChannelId(id.to_string())),
        })
        .await
        .expect("settings seeded");
}

/// Store double where every operation fails, for exercising outage paths.
#[derive(Default)]
pub(super) struct UnavailableStore;

impl UnavailableStore {
    fn outage<T>() -> Result<T, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

#[async_trait]
impl RecruitmentStore for UnavailableStore {
    async fn guild_settings(&self, _guild: &GuildId) -> Result<Option<GuildSettings>, StoreError> {
        Self::outage()
    }

    async fn put_guild_settings(&self, _settings: GuildSettings) -> Result<(), StoreError> {
        Self::outage()
    }

    async fn staged_settings(
        &self,
        _guild: &GuildId,
    ) -> Result<Option<StagedSettings>, StoreError> {
        Self::outage()
    }

    async fn replace_staged_settings(&self, _staged: StagedSettings) -> Result<(), StoreError> {
        Self::outage()
    }

    async fn patch_staged_settings(
        &self,
        _guild: &GuildId,
        _patch: StagedPatch,
    ) -> Result<(), StoreError> {
        Self::outage()
    }

    async fn delete_staged_settings(&self, _guild: &GuildId) -> Result<(), StoreError> {
        Self::outage()
    }

    async fn applicant(&self, _user: &UserId) -> Result<Option<ApplicantRecord>, StoreError> {
        Self::outage()
    }

    async fn append_submission(
        &self,
        _user: &UserId,
        _entry: SubmissionEntry,
    ) -> Result<(), StoreError> {
        Self::outage()
    }

    async fn set_last_status(
        &self,
        _user: &UserId,
        _status: ApplicationStatus,
        _now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Self::outage()
    }

    async fn reset_cooldown(&self, _user: &UserId) -> Result<bool, StoreError> {
        Self::outage()
    }

    async fn is_blocked(&self, _guild: &GuildId, _user: &UserId) -> Result<bool, StoreError> {
        Self::outage()
    }

    async fn insert_block(&self, _guild: &GuildId, _user: &UserId) -> Result<bool, StoreError> {
        Self::outage()
    }

    async fn remove_block(&self, _guild: &GuildId, _user: &UserId) -> Result<bool, StoreError> {
        Self::outage()
    }

    async fn blocked_count(&self, _guild: &GuildId) -> Result<u64, StoreError> {
        Self::outage()
    }

    async fn counters(&self, _guild: &GuildId) -> Result<GuildCounters, StoreError> {
        Self::outage()
    }

    async fn increment_counter(
        &self,
        _guild: &GuildId,
        _field: CounterField,
    ) -> Result<(), StoreError> {
        Self::outage()
    }
}

/// Directory double backed by static channel/role sets.
#[derive(Default)]
pub(super) struct FakeDirectory {
    channels: HashSet<String>,
    roles: HashSet<String>,
    failing_roles: HashSet<String>,
    grants: Mutex<Vec<(UserId, RoleId)>>,
}

impl FakeDirectory {
    pub(super) fn with(channels: &[&str], roles: &[&str]) -> Self {
        Self {
            channels: channels.iter().map(|id| id.to_string()).collect(),
            roles: roles.iter().map(|id| id.to_string()).collect(),
            failing_roles: HashSet::new(),
            grants: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing_role(mut self, role: &str) -> Self {
        self.failing_roles.insert(role.to_string());
        self
    }

    pub(super) fn grants(&self) -> Vec<(UserId, RoleId)> {
        self.grants.lock().expect("grants mutex poisoned").clone()
    }
}

#[async_trait]
impl GuildDirectory for FakeDirectory {
    async fn channel_exists(
        &self,
        _guild: &GuildId,
        channel: &ChannelId,
    ) -> Result<bool, PlatformError> {
        Ok(self.channels.contains(&channel.0))
    }

    async fn role_exists(&self, _guild: &GuildId, role: &RoleId) -> Result<bool, PlatformError> {
        Ok(self.roles.contains(&role.0))
    }

    async fn grant_role(
        &self,
        _guild: &GuildId,
        user: &UserId,
        role: &RoleId,
    ) -> Result<(), PlatformError> {
        if self.failing_roles.contains(&role.0) {
            return Err(PlatformError::Delivery(format!(
                "role {role} cannot be granted"
            )));
        }
        self.grants
            .lock()
            .expect("grants mutex poisoned")
            .push((user.clone(), role.clone()));
        Ok(())
    }
}

/// Messenger double recording every outbound delivery.
#[derive(Default)]
pub(super) struct RecordingMessenger {
    sequence: AtomicU64,
    fail_direct_messages: bool,
    dms: Mutex<Vec<(UserId, String)>>,
    cards: Mutex<Vec<(ChannelId, ReviewCardDraft)>>,
    disabled: Mutex<Vec<MessageId>>,
    entry_controls: Mutex<Vec<(ChannelId, EntryControlDraft)>>,
    logs: Mutex<Vec<(ChannelId, LogPost)>>,
}

impl RecordingMessenger {
    pub(super) fn failing_dms() -> Self {
        Self {
            fail_direct_messages: true,
            ..Self::default()
        }
    }

    pub(super) fn dms(&self) -> Vec<(UserId, String)> {
        self.dms.lock().expect("dm mutex poisoned").clone()
    }

    pub(super) fn cards(&self) -> Vec<(ChannelId, ReviewCardDraft)> {
        self.cards.lock().expect("card mutex poisoned").clone()
    }

    pub(super) fn disabled(&self) -> Vec<MessageId> {
        self.disabled.lock().expect("disabled mutex poisoned").clone()
    }

    pub(super) fn entry_controls(&self) -> Vec<(ChannelId, EntryControlDraft)> {
        self.entry_controls
            .lock()
            .expect("entry mutex poisoned")
            .clone()
    }

    pub(super) fn logs(&self) -> Vec<(ChannelId, LogPost)> {
        self.logs.lock().expect("log mutex poisoned").clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn direct_message(&self, user: &UserId, text: &str) -> Result<(), PlatformError> {
        if self.fail_direct_messages {
            return Err(PlatformError::Delivery("dms closed".to_string()));
        }
        self.dms
            .lock()
            .expect("dm mutex poisoned")
            .push((user.clone(), text.to_string()));
        Ok(())
    }

    async fn post_review_card(
        &self,
        channel: &ChannelId,
        draft: ReviewCardDraft,
    ) -> Result<MessageId, PlatformError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.cards
            .lock()
            .expect("card mutex poisoned")
            .push((channel.clone(), draft));
        Ok(MessageId(format!("msg-{id}")))
    }

    async fn disable_review_controls(&self, message: &MessageId) -> Result<(), PlatformError> {
        self.disabled
            .lock()
            .expect("disabled mutex poisoned")
            .push(message.clone());
        Ok(())
    }

    async fn post_entry_control(
        &self,
        channel: &ChannelId,
        draft: EntryControlDraft,
    ) -> Result<(), PlatformError> {
        self.entry_controls
            .lock()
            .expect("entry mutex poisoned")
            .push((channel.clone(), draft));
        Ok(())
    }

    async fn post_log(&self, channel: &ChannelId, post: LogPost) -> Result<(), PlatformError> {
        self.logs
            .lock()
            .expect("log mutex poisoned")
            .push((channel.clone(), post));
        Ok(())
    }
}

pub(super) type TestDispatcher = Dispatcher<MemoryStore, FakeDirectory, RecordingMessenger>;

pub(super) fn build_dispatcher(
    directory: FakeDirectory,
    messenger: RecordingMessenger,
) -> (
    TestDispatcher,
    Arc<MemoryStore>,
    Arc<FakeDirectory>,
    Arc<RecordingMessenger>,
) {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(directory);
    let messenger = Arc::new(messenger);
    let dispatcher = Dispatcher::new(
        store.clone(),
        directory.clone(),
        messenger.clone(),
        recruitment_config(),
    );
    (dispatcher, store, directory, messenger)
}
