use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::access::AccessPolicy;
use super::audit::{AuditKind, AuditTrail};
use super::domain::{
    Actor, AnswerViolation, ApplicationAnswers, CounterField, GuildId, ReviewCardRef,
    ReviewVerdict, SubmissionEntry, UserId,
};
use super::eligibility::{Eligibility, EligibilityEngine};
use crate::platform::{GuildDirectory, Messenger, ReviewCardDraft};
use crate::storage::{RecruitmentStore, StoreError};

const ACCEPTED_DM: &str = "Congratulations! Your staff application has been accepted.";
const REJECTED_DM: &str =
    "Unfortunately your staff application was rejected. Better luck next time.";
const BLOCKED_DM: &str = "You have been blocked from the staff application system.";

/// Gate outcome for the apply control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyGate {
    Open,
    Blocked,
    OnCooldown { remaining: chrono::Duration },
}

/// Receipt for a recorded submission. `review_posted` is false when the
/// review channel is unset or unresolvable; the submission itself still
/// went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub review_posted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Answers(#[from] AnswerViolation),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a decision attempt on a review card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    Applied(AppliedDecision),
    /// The card's controls were already disabled: a previous decision is
    /// terminal and this attempt is a no-op.
    AlreadyDecided,
    /// The reviewer failed the access policy.
    Denied,
    /// Block verdict on an applicant already present in the blocklist.
    AlreadyBlocked,
}

/// Side-effect summary of an applied decision. Individual effects are
/// best-effort; the flags report what actually landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDecision {
    pub verdict: ReviewVerdict,
    pub applicant: UserId,
    pub applicant_notified: bool,
    pub roles_granted: usize,
    pub roles_failed: usize,
    pub controls_disabled: bool,
}

/// Governs one application's lifecycle from submission to a terminal
/// decision. Decisions are bound to the applicant reference embedded in the
/// review card, and the disable-controls write is the idempotency mechanism:
/// a decided card rejects further transitions.
pub struct ReviewService<S, D, M> {
    store: Arc<S>,
    directory: Arc<D>,
    messenger: Arc<M>,
    audit: AuditTrail<S, M>,
    eligibility: EligibilityEngine<S>,
    access: AccessPolicy<S>,
}

impl<S, D, M> ReviewService<S, D, M>
where
    S: RecruitmentStore,
    D: GuildDirectory,
    M: Messenger,
{
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        messenger: Arc<M>,
        cooldown: std::time::Duration,
    ) -> Self {
        let audit = AuditTrail::new(store.clone(), messenger.clone());
        let eligibility = EligibilityEngine::new(store.clone(), cooldown);
        let access = AccessPolicy::new(store.clone());
        Self {
            store,
            directory,
            messenger,
            audit,
            eligibility,
            access,
        }
    }

    /// Eligibility-gated entry: decides whether the apply control opens the
    /// application form for this user.
    pub async fn apply_gate(
        &self,
        guild: &GuildId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ApplyGate, StoreError> {
        Ok(match self.eligibility.check(guild, user, now).await? {
            Eligibility::Eligible => ApplyGate::Open,
            Eligibility::Blocked => ApplyGate::Blocked,
            Eligibility::OnCooldown { remaining } => ApplyGate::OnCooldown { remaining },
        })
    }

    /// Record a submission and post its review card. The history append is
    /// the at-most-once write; the platform disables the submitting form
    /// while it completes. A missing or unresolvable review channel skips
    /// the card with a warning instead of failing the applicant.
    pub async fn submit(
        &self,
        guild: &GuildId,
        applicant: &UserId,
        answers: ApplicationAnswers,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, SubmitError> {
        answers.validate()?;

        let entry = SubmissionEntry {
            submitted_at: now,
            answers: answers.clone(),
        };
        self.store.append_submission(applicant, entry).await?;

        if let Err(error) = self
            .store
            .increment_counter(guild, CounterField::TotalApplications)
            .await
        {
            warn!(%guild, %error, "total-applications counter not incremented");
        }

        let review_posted = self.post_review_card(guild, applicant, answers, now).await;

        self.audit
            .record(
                guild,
                AuditKind::SubmissionReceived,
                format!("New application received from {applicant}"),
            )
            .await;

        Ok(SubmissionReceipt { review_posted })
    }

    async fn post_review_card(
        &self,
        guild: &GuildId,
        applicant: &UserId,
        answers: ApplicationAnswers,
        now: DateTime<Utc>,
    ) -> bool {
        let settings = match self.store.guild_settings(guild).await {
            Ok(settings) => settings,
            Err(error) => {
                warn!(%guild, %error, "review card skipped: settings unavailable");
                return false;
            }
        };

        let Some(channel) = settings.and_then(|settings| settings.review_channel) else {
            warn!(%guild, "review card skipped: no review channel configured");
            return false;
        };

        match self.directory.channel_exists(guild, &channel).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(%guild, %channel, "review card skipped: review channel unresolvable");
                return false;
            }
            Err(error) => {
                warn!(%guild, %channel, %error, "review card skipped: directory lookup failed");
                return false;
            }
        }

        let draft = ReviewCardDraft {
            applicant: applicant.clone(),
            submitted_at: now,
            answers,
        };
        match self.messenger.post_review_card(&channel, draft).await {
            Ok(_) => true,
            Err(error) => {
                warn!(%guild, %channel, %error, "review card could not be posted");
                false
            }
        }
    }

    /// Apply a terminal decision to the application behind a review card.
    ///
    /// Side effects are each independently best-effort and all attempted even
    /// when an earlier one fails; only the pre-decision reads (authorization,
    /// blocklist probe) can abort with a store error.
    pub async fn decide(
        &self,
        guild: &GuildId,
        reviewer: &Actor,
        card: &ReviewCardRef,
        verdict: ReviewVerdict,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, StoreError> {
        if card.controls_disabled {
            return Ok(DecisionOutcome::AlreadyDecided);
        }

        if !self.access.is_authorized(guild, reviewer).await? {
            return Ok(DecisionOutcome::Denied);
        }

        let applicant = card.applicant.clone();

        if verdict == ReviewVerdict::Block && self.store.is_blocked(guild, &applicant).await? {
            return Ok(DecisionOutcome::AlreadyBlocked);
        }

        let applied = match verdict {
            ReviewVerdict::Accept => self.apply_accept(guild, &applicant, card, now).await,
            ReviewVerdict::Reject => self.apply_reject(guild, &applicant, card, now).await,
            ReviewVerdict::Block => self.apply_block(guild, &applicant, card, now).await,
        };

        let (kind, text) = match verdict {
            ReviewVerdict::Accept => (
                AuditKind::ApplicationAccepted,
                format!("Application from {applicant} accepted by {}", reviewer.user),
            ),
            ReviewVerdict::Reject => (
                AuditKind::ApplicationRejected,
                format!("Application from {applicant} rejected by {}", reviewer.user),
            ),
            ReviewVerdict::Block => (
                AuditKind::UserBlocked,
                format!(
                    "{applicant} blocked from the application system by {}",
                    reviewer.user
                ),
            ),
        };
        self.audit.record(guild, kind, text).await;

        Ok(DecisionOutcome::Applied(applied))
    }

    async fn apply_accept(
        &self,
        guild: &GuildId,
        applicant: &UserId,
        card: &ReviewCardRef,
        now: DateTime<Utc>,
    ) -> AppliedDecision {
        let applicant_notified = self.notify(applicant, ACCEPTED_DM).await;
        self.record_status(guild, applicant, ReviewVerdict::Accept, now)
            .await;
        self.bump_counter(guild, CounterField::AcceptedApplications)
            .await;
        let (roles_granted, roles_failed) = self.grant_staff_roles(guild, applicant).await;
        let controls_disabled = self.disable_controls(card).await;

        AppliedDecision {
            verdict: ReviewVerdict::Accept,
            applicant: applicant.clone(),
            applicant_notified,
            roles_granted,
            roles_failed,
            controls_disabled,
        }
    }

    async fn apply_reject(
        &self,
        guild: &GuildId,
        applicant: &UserId,
        card: &ReviewCardRef,
        now: DateTime<Utc>,
    ) -> AppliedDecision {
        let applicant_notified = self.notify(applicant, REJECTED_DM).await;
        self.record_status(guild, applicant, ReviewVerdict::Reject, now)
            .await;
        self.bump_counter(guild, CounterField::RejectedApplications)
            .await;
        let controls_disabled = self.disable_controls(card).await;

        AppliedDecision {
            verdict: ReviewVerdict::Reject,
            applicant: applicant.clone(),
            applicant_notified,
            roles_granted: 0,
            roles_failed: 0,
            controls_disabled,
        }
    }

    async fn apply_block(
        &self,
        guild: &GuildId,
        applicant: &UserId,
        card: &ReviewCardRef,
        now: DateTime<Utc>,
    ) -> AppliedDecision {
        match self.store.insert_block(guild, applicant).await {
            Ok(true) => {}
            Ok(false) => warn!(%guild, %applicant, "blocklist entry already present"),
            Err(error) => warn!(%guild, %applicant, %error, "blocklist entry not recorded"),
        }
        self.record_status(guild, applicant, ReviewVerdict::Block, now)
            .await;
        self.bump_counter(guild, CounterField::BlockedUsers).await;
        let controls_disabled = self.disable_controls(card).await;
        // Delivery failure here is logged, never surfaced to the reviewer.
        let applicant_notified = self.notify(applicant, BLOCKED_DM).await;

        AppliedDecision {
            verdict: ReviewVerdict::Block,
            applicant: applicant.clone(),
            applicant_notified,
            roles_granted: 0,
            roles_failed: 0,
            controls_disabled,
        }
    }

    async fn notify(&self, applicant: &UserId, text: &str) -> bool {
        match self.messenger.direct_message(applicant, text).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%applicant, %error, "applicant notification failed");
                false
            }
        }
    }

    async fn record_status(
        &self,
        guild: &GuildId,
        applicant: &UserId,
        verdict: ReviewVerdict,
        now: DateTime<Utc>,
    ) {
        if let Err(error) = self
            .store
            .set_last_status(applicant, verdict.decided_status(), now)
            .await
        {
            warn!(%guild, %applicant, %error, "applicant status not updated");
        }
    }

    async fn bump_counter(&self, guild: &GuildId, field: CounterField) {
        if let Err(error) = self.store.increment_counter(guild, field).await {
            warn!(%guild, ?field, %error, "counter not incremented");
        }
    }

    async fn grant_staff_roles(&self, guild: &GuildId, applicant: &UserId) -> (usize, usize) {
        let staff_roles = match self.store.guild_settings(guild).await {
            Ok(Some(settings)) => settings.staff_roles,
            Ok(None) => Default::default(),
            Err(error) => {
                warn!(%guild, %error, "staff roles not granted: settings unavailable");
                return (0, 0);
            }
        };

        let mut granted = 0;
        let mut failed = 0;
        for role in &staff_roles {
            match self.directory.grant_role(guild, applicant, role).await {
                Ok(()) => granted += 1,
                Err(error) => {
                    warn!(%guild, %applicant, %role, %error, "staff role grant failed");
                    failed += 1;
                }
            }
        }
        (granted, failed)
    }

    async fn disable_controls(&self, card: &ReviewCardRef) -> bool {
        match self.messenger.disable_review_controls(&card.message).await {
            Ok(()) => true,
            Err(error) => {
                warn!(message = %card.message.0, %error, "review controls not disabled");
                false
            }
        }
    }
}
