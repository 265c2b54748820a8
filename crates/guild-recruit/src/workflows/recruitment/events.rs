use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::access::AccessPolicy;
use super::domain::{Actor, ApplicationAnswers, GuildId, ReviewCardRef, ReviewVerdict, UserId};
use super::eligibility::{format_remaining, CooldownReset};
use super::moderation::{BlockOutcome, ModerationService, UnblockOutcome};
use super::review::{ApplyGate, DecisionOutcome, ReviewService, SubmitError};
use super::setup::{SetupError, SetupWizard};
use crate::config::RecruitmentConfig;
use crate::platform::{GuildDirectory, Messenger};
use crate::storage::RecruitmentStore;

/// Closed taxonomy of inbound platform interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    Command(CommandInvocation),
    Button(ButtonEvent),
    Modal(ModalSubmit),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInvocation {
    pub guild: GuildId,
    pub actor: Actor,
    pub command: StaffCommand,
}

/// Slash commands exposed by the recruitment system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum StaffCommand {
    Setup,
    Block { user: UserId },
    RemoveBlock { user: UserId },
    Stats,
    CheckUser { user: UserId },
    ClearCooldown { user: UserId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub guild: GuildId,
    pub actor: Actor,
    pub button: ButtonPress,
}

/// Button activations, keyed by the control ids rendered on our messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum ButtonPress {
    #[serde(rename = "setup_channel_select")]
    SetupChannelSelect,
    #[serde(rename = "setup_next_admin_roles")]
    SetupNextAdminRoles,
    #[serde(rename = "setup_next_staff_roles")]
    SetupNextStaffRoles,
    #[serde(rename = "setup_next_log_channel")]
    SetupNextLogChannel,
    #[serde(rename = "complete_setup")]
    CompleteSetup,
    #[serde(rename = "apply")]
    Apply,
    #[serde(rename = "staff_accept")]
    StaffAccept { card: ReviewCardRef },
    #[serde(rename = "staff_deny")]
    StaffDeny { card: ReviewCardRef },
    #[serde(rename = "staff_block")]
    StaffBlock { card: ReviewCardRef },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalSubmit {
    pub guild: GuildId,
    pub actor: Actor,
    pub form: FormSubmission,
}

/// Modal submissions, keyed by the form ids we open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum FormSubmission {
    #[serde(rename = "setup_admin_channel_modal")]
    AdminChannel { channel_id: String },
    #[serde(rename = "setup_admin_roles_modal")]
    AdminRoles { role_ids: String },
    #[serde(rename = "setup_staff_roles_modal")]
    StaffRoles { role_ids: String },
    #[serde(rename = "setup_log_channel_modal")]
    LogChannel { channel_id: String },
    #[serde(rename = "staff_apply")]
    Apply { answers: ApplicationAnswers },
}

/// Reply rendered back onto the triggering interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Message {
        content: String,
        ephemeral: bool,
    },
    /// A message carrying the control that enables the next step.
    Prompt {
        content: String,
        control: String,
        ephemeral: bool,
    },
    /// Instruct the platform to open a form for the actor.
    OpenForm {
        form: FormKind,
    },
}

impl Reply {
    fn ephemeral(content: impl Into<String>) -> Self {
        Reply::Message {
            content: content.into(),
            ephemeral: true,
        }
    }

    fn public(content: impl Into<String>) -> Self {
        Reply::Message {
            content: content.into(),
            ephemeral: false,
        }
    }

    fn prompt(content: impl Into<String>, control: &'static str) -> Self {
        Reply::Prompt {
            content: content.into(),
            control: control.to_string(),
            ephemeral: true,
        }
    }
}

/// Forms the platform can be asked to open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum FormKind {
    #[serde(rename = "setup_admin_channel_modal")]
    AdminChannel,
    #[serde(rename = "setup_admin_roles_modal")]
    AdminRoles,
    #[serde(rename = "setup_staff_roles_modal")]
    StaffRoles,
    #[serde(rename = "setup_log_channel_modal")]
    LogChannel,
    #[serde(rename = "staff_apply")]
    Apply { prompts: [String; 5] },
}

const NO_PERMISSION: &str = "You do not have the permissions or roles required to use this.";
const RETRYABLE: &str = "Something went wrong while processing this. Please try again.";

/// Routes every inbound interaction to the recruitment components. Each call
/// is one independent task; failures are isolated to the interaction being
/// processed and rendered per the error taxonomy.
pub struct Dispatcher<S, D, M> {
    access: AccessPolicy<S>,
    wizard: SetupWizard<S, D, M>,
    review: ReviewService<S, D, M>,
    moderation: ModerationService<S, M>,
    config: RecruitmentConfig,
}

impl<S, D, M> Dispatcher<S, D, M>
where
    S: RecruitmentStore,
    D: GuildDirectory,
    M: Messenger,
{
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        messenger: Arc<M>,
        config: RecruitmentConfig,
    ) -> Self {
        let access = AccessPolicy::new(store.clone());
        let wizard = SetupWizard::new(
            store.clone(),
            directory.clone(),
            messenger.clone(),
            config.form.clone(),
        );
        let review = ReviewService::new(
            store.clone(),
            directory,
            messenger.clone(),
            config.cooldown,
        );
        let moderation = ModerationService::new(store, messenger, config.cooldown);
        Self {
            access,
            wizard,
            review,
            moderation,
            config,
        }
    }

    pub async fn dispatch(&self, event: InboundEvent, now: DateTime<Utc>) -> Reply {
        match event {
            InboundEvent::Command(invocation) => self.handle_command(invocation, now).await,
            InboundEvent::Button(event) => self.handle_button(event, now).await,
            InboundEvent::Modal(submit) => self.handle_modal(submit, now).await,
        }
    }

    async fn handle_command(&self, invocation: CommandInvocation, _now: DateTime<Utc>) -> Reply {
        let CommandInvocation {
            guild,
            actor,
            command,
        } = invocation;

        // Every slash command is privileged.
        if let Some(denied) = self.guard(&guild, &actor).await {
            return denied;
        }

        match command {
            StaffCommand::Setup => match self.wizard.begin(&guild).await {
                Ok(prompt) => Reply::prompt(
                    "Welcome to the recruitment setup. Use the button below to start.",
                    prompt.control_id(),
                ),
                Err(error) => self.internal(&guild, "setup could not begin", error),
            },
            StaffCommand::Block { user } => {
                match self.moderation.block(&guild, &user, &actor).await {
                    Ok(BlockOutcome::Blocked) => Reply::ephemeral(format!(
                        "{user} has been blocked from the application system."
                    )),
                    Ok(BlockOutcome::AlreadyBlocked) => {
                        Reply::ephemeral(format!("{user} is already blocked."))
                    }
                    Err(error) => self.internal(&guild, "block failed", error),
                }
            }
            StaffCommand::RemoveBlock { user } => {
                match self.moderation.remove_block(&guild, &user, &actor).await {
                    Ok(UnblockOutcome::Removed) => {
                        Reply::ephemeral(format!("The block on {user} has been removed."))
                    }
                    Ok(UnblockOutcome::NotBlocked) => {
                        Reply::ephemeral(format!("{user} is not blocked."))
                    }
                    Err(error) => self.internal(&guild, "remove-block failed", error),
                }
            }
            StaffCommand::Stats => match self.moderation.stats(&guild).await {
                Ok(stats) => Reply::ephemeral(format!(
                    "Applications: {} total, {} accepted, {} rejected. Blocked users: {}.",
                    stats.counters.total_applications,
                    stats.counters.accepted_applications,
                    stats.counters.rejected_applications,
                    stats.blocklisted,
                )),
                Err(error) => self.internal(&guild, "stats failed", error),
            },
            StaffCommand::CheckUser { user } => {
                match self.moderation.check_user(&guild, &user).await {
                    Ok(standing) => {
                        let blocked = if standing.blocked {
                            "blocked from applying"
                        } else {
                            "not blocked"
                        };
                        let content = match standing.history {
                            Some(history) => format!(
                                "{user} is {blocked}. Applications: {}. Last submitted: {}. Last status: {}.",
                                history.submissions,
                                history.last_application_at.to_rfc3339(),
                                history
                                    .last_status
                                    .map(|status| status.label())
                                    .unwrap_or("unknown"),
                            ),
                            None => format!("{user} is {blocked}. They have never applied."),
                        };
                        Reply::ephemeral(content)
                    }
                    Err(error) => self.internal(&guild, "check-user failed", error),
                }
            }
            StaffCommand::ClearCooldown { user } => {
                match self.moderation.clear_cooldown(&guild, &user, &actor).await {
                    Ok(CooldownReset::Cleared) => Reply::ephemeral(format!(
                        "Cooldown cleared for {user}. They can apply again now."
                    )),
                    Ok(CooldownReset::NeverApplied) => {
                        Reply::ephemeral(format!("{user} has never applied."))
                    }
                    Err(error) => self.internal(&guild, "clear-cooldown failed", error),
                }
            }
        }
    }

    async fn handle_button(&self, event: ButtonEvent, now: DateTime<Utc>) -> Reply {
        let ButtonEvent {
            guild,
            actor,
            button,
        } = event;

        match button {
            ButtonPress::SetupChannelSelect => Reply::OpenForm {
                form: FormKind::AdminChannel,
            },
            ButtonPress::SetupNextAdminRoles => Reply::OpenForm {
                form: FormKind::AdminRoles,
            },
            ButtonPress::SetupNextStaffRoles => Reply::OpenForm {
                form: FormKind::StaffRoles,
            },
            ButtonPress::SetupNextLogChannel => Reply::OpenForm {
                form: FormKind::LogChannel,
            },
            ButtonPress::CompleteSetup => match self.wizard.commit(&guild, &actor).await {
                Ok(outcome) => {
                    let content = if outcome.entry_posted {
                        "Recruitment setup completed. Settings saved and the apply control was created."
                    } else {
                        "Recruitment setup completed. Settings saved, but the apply control could not be posted."
                    };
                    Reply::ephemeral(content)
                }
                Err(SetupError::RestartRequired) => Reply::ephemeral(
                    "No in-progress setup was found. Please restart the setup process.",
                ),
                Err(error) => self.internal(&guild, "setup commit failed", error),
            },
            ButtonPress::Apply => match self.review.apply_gate(&guild, &actor.user, now).await {
                Ok(ApplyGate::Open) => Reply::OpenForm {
                    form: FormKind::Apply {
                        prompts: self.config.form.prompts.clone(),
                    },
                },
                Ok(ApplyGate::Blocked) => {
                    Reply::ephemeral("You are blocked from applying and can never apply.")
                }
                Ok(ApplyGate::OnCooldown { remaining }) => Reply::ephemeral(format!(
                    "You cannot apply right now. Wait {} before applying again.",
                    format_remaining(remaining),
                )),
                Err(error) => self.internal(&guild, "apply gate failed", error),
            },
            ButtonPress::StaffAccept { card } => {
                self.decide(&guild, &actor, card, ReviewVerdict::Accept, now)
                    .await
            }
            ButtonPress::StaffDeny { card } => {
                self.decide(&guild, &actor, card, ReviewVerdict::Reject, now)
                    .await
            }
            ButtonPress::StaffBlock { card } => {
                self.decide(&guild, &actor, card, ReviewVerdict::Block, now)
                    .await
            }
        }
    }

    async fn handle_modal(&self, submit: ModalSubmit, now: DateTime<Utc>) -> Reply {
        let ModalSubmit { guild, actor, form } = submit;

        match form {
            FormSubmission::AdminChannel { channel_id } => {
                match self.wizard.set_review_channel(&guild, &channel_id).await {
                    Ok(step) => Reply::prompt(
                        format!(
                            "Review channel set to {}. Now assign the admin roles.",
                            step.channel
                        ),
                        step.next.control_id(),
                    ),
                    Err(error) => self.setup_step_error(&guild, error),
                }
            }
            FormSubmission::AdminRoles { role_ids } => {
                match self.wizard.set_admin_roles(&guild, &role_ids).await {
                    Ok(step) => Reply::prompt(
                        format!(
                            "{} admin role(s) saved.{} Now assign the staff roles.",
                            step.accepted,
                            dropped_notice(&step.dropped),
                        ),
                        step.next.control_id(),
                    ),
                    Err(error) => self.setup_step_error(&guild, error),
                }
            }
            FormSubmission::StaffRoles { role_ids } => {
                match self.wizard.set_staff_roles(&guild, &role_ids).await {
                    Ok(step) => Reply::prompt(
                        format!(
                            "{} staff role(s) saved.{} Now set the log channel.",
                            step.accepted,
                            dropped_notice(&step.dropped),
                        ),
                        step.next.control_id(),
                    ),
                    Err(error) => self.setup_step_error(&guild, error),
                }
            }
            FormSubmission::LogChannel { channel_id } => {
                match self.wizard.set_log_channel(&guild, &channel_id).await {
                    Ok(step) => Reply::prompt(
                        format!(
                            "Log channel set to {}. Use the button below to complete the setup.",
                            step.channel
                        ),
                        step.next.control_id(),
                    ),
                    Err(error) => self.setup_step_error(&guild, error),
                }
            }
            FormSubmission::Apply { answers } => {
                match self.review.submit(&guild, &actor.user, answers, now).await {
                    Ok(_receipt) => Reply::ephemeral(self.config.messages.submitted.clone()),
                    Err(SubmitError::Answers(violation)) => {
                        Reply::ephemeral(violation.to_string())
                    }
                    Err(SubmitError::Store(error)) => {
                        self.internal(&guild, "submission failed", error)
                    }
                }
            }
        }
    }

    async fn decide(
        &self,
        guild: &GuildId,
        actor: &Actor,
        card: ReviewCardRef,
        verdict: ReviewVerdict,
        now: DateTime<Utc>,
    ) -> Reply {
        match self.review.decide(guild, actor, &card, verdict, now).await {
            Ok(DecisionOutcome::Applied(applied)) => match applied.verdict {
                ReviewVerdict::Accept => Reply::public(format!(
                    "{} {}",
                    self.config.messages.accepted, applied.applicant
                )),
                ReviewVerdict::Reject => Reply::public(format!(
                    "{} {}",
                    self.config.messages.rejected, applied.applicant
                )),
                ReviewVerdict::Block => Reply::public(format!(
                    "{} has been fully blocked from applying.",
                    applied.applicant
                )),
            },
            Ok(DecisionOutcome::AlreadyDecided) => {
                Reply::ephemeral("This application has already been decided.")
            }
            Ok(DecisionOutcome::Denied) => Reply::ephemeral(NO_PERMISSION),
            Ok(DecisionOutcome::AlreadyBlocked) => {
                Reply::ephemeral("This user is already on the blocklist.")
            }
            Err(error) => self.internal(guild, "decision failed", error),
        }
    }

    /// Privilege gate: denial and store failure both stop the command, the
    /// latter with an internal error line (fail closed).
    async fn guard(&self, guild: &GuildId, actor: &Actor) -> Option<Reply> {
        match self.access.is_authorized(guild, actor).await {
            Ok(true) => None,
            Ok(false) => Some(Reply::ephemeral(NO_PERMISSION)),
            Err(error) => {
                error!(%guild, %error, "authorization check failed; denying");
                Some(Reply::ephemeral(RETRYABLE))
            }
        }
    }

    fn internal(&self, guild: &GuildId, context: &str, error: impl std::fmt::Display) -> Reply {
        error!(%guild, %error, "{context}");
        Reply::ephemeral(RETRYABLE)
    }

    fn setup_step_error(&self, guild: &GuildId, error: SetupError) -> Reply {
        match error {
            SetupError::UnknownChannel(raw) => Reply::ephemeral(format!(
                "The channel {raw} could not be found. Check the id and try again."
            )),
            other => self.internal(guild, "setup step failed", other),
        }
    }
}

fn dropped_notice(dropped: &[String]) -> String {
    if dropped.is_empty() {
        String::new()
    } else {
        format!(
            " Warning: some role ids were not found and were skipped: {}.",
            dropped.join(", ")
        )
    }
}
