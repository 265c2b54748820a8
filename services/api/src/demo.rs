use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use guild_recruit::config::RecruitmentConfig;
use guild_recruit::error::AppError;
use guild_recruit::storage::MemoryStore;
use guild_recruit::workflows::recruitment::{
    Actor, ApplicationAnswers, ButtonEvent, ButtonPress, CommandInvocation, Dispatcher,
    FormSubmission, GuildId, InboundEvent, MessageId, ModalSubmit, Reply, ReviewCardRef,
    StaffCommand, UserId,
};

use crate::infra::{InProcessDirectory, LoggingMessenger};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Guild id used for the scripted walkthrough
    #[arg(long, default_value = "demo-guild")]
    pub(crate) guild: String,
}

/// Drives one complete lifecycle through the dispatcher: an administrator
/// runs the setup wizard, a member applies, and the application is accepted.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = RecruitmentConfig::load_from_env()?;
    let dispatcher = Dispatcher::new(
        Arc::new(MemoryStore::default()),
        Arc::new(InProcessDirectory),
        Arc::new(LoggingMessenger::default()),
        config,
    );

    let guild = GuildId(args.guild);
    let admin = Actor {
        user: UserId("demo-admin".to_string()),
        roles: BTreeSet::new(),
        is_administrator: true,
    };
    let applicant = Actor {
        user: UserId("demo-applicant".to_string()),
        roles: BTreeSet::new(),
        is_administrator: false,
    };

    let script: Vec<(&str, InboundEvent)> = vec![
        (
            "admin runs /setup",
            command(&guild, &admin, StaffCommand::Setup),
        ),
        (
            "admin submits the review channel",
            modal(
                &guild,
                &admin,
                FormSubmission::AdminChannel {
                    channel_id: "recruitment-review".to_string(),
                },
            ),
        ),
        (
            "admin submits the admin roles",
            modal(
                &guild,
                &admin,
                FormSubmission::AdminRoles {
                    role_ids: "recruiter".to_string(),
                },
            ),
        ),
        (
            "admin submits the staff roles",
            modal(
                &guild,
                &admin,
                FormSubmission::StaffRoles {
                    role_ids: "staff".to_string(),
                },
            ),
        ),
        (
            "admin submits the log channel",
            modal(
                &guild,
                &admin,
                FormSubmission::LogChannel {
                    channel_id: "recruitment-log".to_string(),
                },
            ),
        ),
        (
            "admin completes the setup",
            button(&guild, &admin, ButtonPress::CompleteSetup),
        ),
        (
            "member presses apply",
            button(&guild, &applicant, ButtonPress::Apply),
        ),
        (
            "member submits the form",
            modal(
                &guild,
                &applicant,
                FormSubmission::Apply {
                    answers: ApplicationAnswers([
                        "Demo Applicant".to_string(),
                        "21".to_string(),
                        "I enjoy helping new members settle in.".to_string(),
                        "Moderated a hobby community for a year.".to_string(),
                        "Ten hours a week.".to_string(),
                    ]),
                },
            ),
        ),
        (
            "reviewer accepts the application",
            button(
                &guild,
                &admin,
                ButtonPress::StaffAccept {
                    card: ReviewCardRef {
                        message: MessageId("local-0".to_string()),
                        applicant: applicant.user.clone(),
                        controls_disabled: false,
                    },
                },
            ),
        ),
        (
            "admin checks the stats",
            command(&guild, &admin, StaffCommand::Stats),
        ),
    ];

    for (label, event) in script {
        let reply = dispatcher.dispatch(event, Utc::now()).await;
        println!("{label}\n  -> {}", describe(&reply));
    }

    Ok(())
}

fn command(guild: &GuildId, actor: &Actor, command: StaffCommand) -> InboundEvent {
    InboundEvent::Command(CommandInvocation {
        guild: guild.clone(),
        actor: actor.clone(),
        command,
    })
}

fn button(guild: &GuildId, actor: &Actor, button: ButtonPress) -> InboundEvent {
    InboundEvent::Button(ButtonEvent {
        guild: guild.clone(),
        actor: actor.clone(),
        button,
    })
}

fn modal(guild: &GuildId, actor: &Actor, form: FormSubmission) -> InboundEvent {
    InboundEvent::Modal(ModalSubmit {
        guild: guild.clone(),
        actor: actor.clone(),
        form,
    })
}

fn describe(reply: &Reply) -> String {
    match reply {
        Reply::Message { content, ephemeral } => {
            let audience = if *ephemeral { "ephemeral" } else { "public" };
            format!("[{audience}] {content}")
        }
        Reply::Prompt {
            content, control, ..
        } => format!("[prompt:{control}] {content}"),
        Reply::OpenForm { form } => format!("[open form] {form:?}"),
    }
}
