//! Guild-scoped staff recruitment: application intake, review decisions, and
//! the per-guild setup wizard.
//!
//! Two independent state machines (setup wizard, application review) share
//! only the persistence gateway. Inbound interactions are dispatched as
//! independent tasks; cross-task coordination happens exclusively through the
//! gateway's atomic single-key operations.

pub mod access;
pub mod audit;
pub mod domain;
pub mod eligibility;
pub mod events;
pub mod moderation;
pub mod review;
pub mod router;
pub mod setup;

#[cfg(test)]
mod tests;

pub use access::AccessPolicy;
pub use audit::{AuditKind, AuditTrail};
pub use domain::{
    Actor, AnswerViolation, ApplicantRecord, ApplicationAnswers, ApplicationStatus, ChannelId,
    CounterField, GuildCounters, GuildId, GuildSettings, MessageId, ReviewCardRef, ReviewVerdict,
    RoleId, StagedSettings, SubmissionEntry, UserId, ANSWER_BOUNDS,
};
pub use eligibility::{format_remaining, CooldownReset, Eligibility, EligibilityEngine};
pub use events::{
    ButtonEvent, ButtonPress, CommandInvocation, Dispatcher, FormKind, FormSubmission,
    InboundEvent, ModalSubmit, Reply, StaffCommand,
};
pub use moderation::{
    BlockOutcome, GuildStats, ModerationService, UnblockOutcome, UserHistory, UserStanding,
};
pub use review::{
    AppliedDecision, ApplyGate, DecisionOutcome, ReviewService, SubmissionReceipt, SubmitError,
};
pub use router::interaction_router;
pub use setup::{ChannelStep, CommitOutcome, RoleStep, SetupError, SetupPrompt, SetupWizard};
