use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for a served guild (one tenant of the recruitment system).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GuildId(pub String);

/// Identifier wrapper for a platform user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for a guild channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub String);

/// Identifier wrapper for a guild role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(pub String);

/// Identifier wrapper for a posted message (e.g., a review card).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The actor behind an inbound interaction, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user: UserId,
    pub roles: BTreeSet<RoleId>,
    pub is_administrator: bool,
}

/// Terminal and in-flight statuses tracked on an applicant's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Blocked,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Blocked => "blocked",
        }
    }
}

/// Length bounds for the five form answers, in question order.
pub const ANSWER_BOUNDS: [(usize, usize); 5] = [(2, 25), (1, 2), (2, 120), (1, 400), (1, 400)];

/// The five free-text answers captured by the application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationAnswers(pub [String; 5]);

impl ApplicationAnswers {
    /// Validate every answer against its configured length bounds.
    pub fn validate(&self) -> Result<(), AnswerViolation> {
        for (index, answer) in self.0.iter().enumerate() {
            let (min, max) = ANSWER_BOUNDS[index];
            let length = answer.chars().count();
            if length < min || length > max {
                return Err(AnswerViolation {
                    question: index + 1,
                    length,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Raised when a form answer falls outside its length bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("answer {question} has length {length}, expected {min}..={max}")]
pub struct AnswerViolation {
    pub question: usize,
    pub length: usize,
    pub min: usize,
    pub max: usize,
}

/// One submitted application, appended to the applicant's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionEntry {
    pub submitted_at: DateTime<Utc>,
    pub answers: ApplicationAnswers,
}

/// Per-user application record. History is append-only; the last-status field
/// tracks only the current outcome and may cycle across re-applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub user: UserId,
    pub submissions: Vec<SubmissionEntry>,
    pub last_application_at: DateTime<Utc>,
    pub last_status: Option<ApplicationStatus>,
}

impl ApplicantRecord {
    /// Baseline record for a user who has never applied: epoch-zero last
    /// submission, so the cooldown window is already elapsed.
    pub fn baseline(user: UserId) -> Self {
        Self {
            user,
            submissions: Vec::new(),
            last_application_at: DateTime::UNIX_EPOCH,
            last_status: None,
        }
    }
}

/// Committed per-guild configuration produced by the setup wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    pub guild: GuildId,
    pub review_channel: Option<ChannelId>,
    pub admin_roles: BTreeSet<RoleId>,
    pub staff_roles: BTreeSet<RoleId>,
    pub log_channel: Option<ChannelId>,
}

/// Wizard-in-progress configuration. Never read outside the setup wizard and
/// deleted on commit or overwritten by a fresh wizard run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedSettings {
    pub guild: GuildId,
    pub review_channel: Option<ChannelId>,
    pub admin_roles: BTreeSet<RoleId>,
    pub staff_roles: BTreeSet<RoleId>,
    pub log_channel: Option<ChannelId>,
}

impl StagedSettings {
    pub fn fresh(guild: GuildId) -> Self {
        Self {
            guild,
            review_channel: None,
            admin_roles: BTreeSet::new(),
            staff_roles: BTreeSet::new(),
            log_channel: None,
        }
    }

    /// Promote the staged fields into committed settings.
    pub fn into_settings(self) -> GuildSettings {
        GuildSettings {
            guild: self.guild,
            review_channel: self.review_channel,
            admin_roles: self.admin_roles,
            staff_roles: self.staff_roles,
            log_channel: self.log_channel,
        }
    }
}

/// Per-guild counters. Created on first increment, monotonic, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildCounters {
    pub guild: GuildId,
    pub total_applications: u64,
    pub accepted_applications: u64,
    pub rejected_applications: u64,
    pub blocked_users: u64,
}

impl GuildCounters {
    pub fn zeroed(guild: GuildId) -> Self {
        Self {
            guild,
            total_applications: 0,
            accepted_applications: 0,
            rejected_applications: 0,
            blocked_users: 0,
        }
    }
}

/// Names a single counter for atomic increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterField {
    TotalApplications,
    AcceptedApplications,
    RejectedApplications,
    BlockedUsers,
}

/// Reviewer verdicts available on a review card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    Accept,
    Reject,
    Block,
}

impl ReviewVerdict {
    pub const fn decided_status(self) -> ApplicationStatus {
        match self {
            ReviewVerdict::Accept => ApplicationStatus::Accepted,
            ReviewVerdict::Reject => ApplicationStatus::Rejected,
            ReviewVerdict::Block => ApplicationStatus::Blocked,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ReviewVerdict::Accept => "accepted",
            ReviewVerdict::Reject => "rejected",
            ReviewVerdict::Block => "blocked",
        }
    }
}

/// Structured reference carried on a posted review card. The applicant for a
/// decision is always resolved from this reference, never from reviewer input,
/// and a card whose controls are already disabled is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCardRef {
    pub message: MessageId,
    pub applicant: UserId,
    #[serde(default)]
    pub controls_disabled: bool,
}
