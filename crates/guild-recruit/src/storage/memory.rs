use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{RecruitmentStore, StagedPatch, StoreError};
use crate::workflows::recruitment::domain::{
    ApplicantRecord, ApplicationStatus, CounterField, GuildCounters, GuildId, GuildSettings,
    StagedSettings, SubmissionEntry, UserId,
};

/// In-memory document store keyed the same way the real collections are.
/// The production driver is a deployment concern behind [`RecruitmentStore`];
/// this implementation backs the service binary and the test suites.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
}

#[derive(Default)]
struct Collections {
    settings: HashMap<GuildId, GuildSettings>,
    staged: HashMap<GuildId, StagedSettings>,
    applicants: HashMap<UserId, ApplicantRecord>,
    blocklist: HashSet<(GuildId, UserId)>,
    counters: HashMap<GuildId, GuildCounters>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

#[async_trait]
impl RecruitmentStore for MemoryStore {
    async fn guild_settings(&self, guild: &GuildId) -> Result<Option<GuildSettings>, StoreError> {
        Ok(self.lock().settings.get(guild).cloned())
    }

    async fn put_guild_settings(&self, settings: GuildSettings) -> Result<(), StoreError> {
        self.lock()
            .settings
            .insert(settings.guild.clone(), settings);
        Ok(())
    }

    async fn staged_settings(&self, guild: &GuildId) -> Result<Option<StagedSettings>, StoreError> {
        Ok(self.lock().staged.get(guild).cloned())
    }

    async fn replace_staged_settings(&self, staged: StagedSettings) -> Result<(), StoreError> {
        self.lock().staged.insert(staged.guild.clone(), staged);
        Ok(())
    }

    async fn patch_staged_settings(
        &self,
        guild: &GuildId,
        patch: StagedPatch,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let staged = guard
            .staged
            .entry(guild.clone())
            .or_insert_with(|| StagedSettings::fresh(guild.clone()));
        match patch {
            StagedPatch::ReviewChannel(channel) => staged.review_channel = Some(channel),
            StagedPatch::AdminRoles(roles) => staged.admin_roles = roles,
            StagedPatch::StaffRoles(roles) => staged.staff_roles = roles,
            StagedPatch::LogChannel(channel) => staged.log_channel = Some(channel),
        }
        Ok(())
    }

    async fn delete_staged_settings(&self, guild: &GuildId) -> Result<(), StoreError> {
        self.lock().staged.remove(guild);
        Ok(())
    }

    async fn applicant(&self, user: &UserId) -> Result<Option<ApplicantRecord>, StoreError> {
        Ok(self.lock().applicants.get(user).cloned())
    }

    async fn append_submission(
        &self,
        user: &UserId,
        entry: SubmissionEntry,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let record = guard
            .applicants
            .entry(user.clone())
            .or_insert_with(|| ApplicantRecord::baseline(user.clone()));
        record.last_application_at = entry.submitted_at;
        record.last_status = Some(ApplicationStatus::Pending);
        record.submissions.push(entry);
        Ok(())
    }

    async fn set_last_status(
        &self,
        user: &UserId,
        status: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let record = guard.applicants.entry(user.clone()).or_insert_with(|| {
            let mut baseline = ApplicantRecord::baseline(user.clone());
            baseline.last_application_at = now;
            baseline
        });
        record.last_status = Some(status);
        Ok(())
    }

    async fn reset_cooldown(&self, user: &UserId) -> Result<bool, StoreError> {
        let mut guard = self.lock();
        match guard.applicants.get_mut(user) {
            Some(record) => {
                record.last_application_at = DateTime::UNIX_EPOCH;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn is_blocked(&self, guild: &GuildId, user: &UserId) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .blocklist
            .contains(&(guild.clone(), user.clone())))
    }

    async fn insert_block(&self, guild: &GuildId, user: &UserId) -> Result<bool, StoreError> {
        Ok(self.lock().blocklist.insert((guild.clone(), user.clone())))
    }

    async fn remove_block(&self, guild: &GuildId, user: &UserId) -> Result<bool, StoreError> {
        Ok(self.lock().blocklist.remove(&(guild.clone(), user.clone())))
    }

    async fn blocked_count(&self, guild: &GuildId) -> Result<u64, StoreError> {
        Ok(self
            .lock()
            .blocklist
            .iter()
            .filter(|(entry_guild, _)| entry_guild == guild)
            .count() as u64)
    }

    async fn counters(&self, guild: &GuildId) -> Result<GuildCounters, StoreError> {
        Ok(self
            .lock()
            .counters
            .get(guild)
            .cloned()
            .unwrap_or_else(|| GuildCounters::zeroed(guild.clone())))
    }

    async fn increment_counter(
        &self,
        guild: &GuildId,
        field: CounterField,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let counters = guard
            .counters
            .entry(guild.clone())
            .or_insert_with(|| GuildCounters::zeroed(guild.clone()));
        match field {
            CounterField::TotalApplications => counters.total_applications += 1,
            CounterField::AcceptedApplications => counters.accepted_applications += 1,
            CounterField::RejectedApplications => counters.rejected_applications += 1,
            CounterField::BlockedUsers => counters.blocked_users += 1,
        }
        Ok(())
    }
}
