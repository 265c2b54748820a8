use std::sync::Arc;
use std::time::Duration as StdDuration;

use super::common::*;
use crate::storage::{MemoryStore, RecruitmentStore};
use crate::workflows::recruitment::domain::{
    ApplicationAnswers, ApplicationStatus, ChannelId, MessageId, ReviewCardRef, ReviewVerdict,
    RoleId,
};
use crate::workflows::recruitment::review::{
    ApplyGate, DecisionOutcome, ReviewService, SubmitError,
};

fn service(
    store: Arc<MemoryStore>,
    directory: Arc<FakeDirectory>,
    messenger: Arc<RecordingMessenger>,
) -> ReviewService<MemoryStore, FakeDirectory, RecordingMessenger> {
    ReviewService::new(store, directory, messenger, StdDuration::from_secs(24 * 3600))
}

fn card() -> ReviewCardRef {
    ReviewCardRef {
        message: MessageId("msg-0".to_string()),
        applicant: applicant(),
        controls_disabled: false,
    }
}

#[tokio::test]
async fn submission_records_history_and_posts_review_card() {
    let store = Arc::new(MemoryStore::default());
    seed_settings(&store, Some("chan-review"), &["role-mod"], &[], None).await;
    let directory = Arc::new(FakeDirectory::with(&["chan-review"], &[]));
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store.clone(), directory, messenger.clone());

    let receipt = service
        .submit(&guild(), &applicant(), answers(), now())
        .await
        .expect("submission recorded");
    assert!(receipt.review_posted);

    let record = store
        .applicant(&applicant())
        .await
        .expect("fetch resolves")
        .expect("record created");
    assert_eq!(record.submissions.len(), 1);
    assert_eq!(record.last_application_at, now());
    assert_eq!(record.last_status, Some(ApplicationStatus::Pending));

    let counters = store.counters(&guild()).await.expect("counters resolve");
    assert_eq!(counters.total_applications, 1);

    let cards = messenger.cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].0, ChannelId("chan-review".into()));
    assert_eq!(cards[0].1.applicant, applicant());
}

#[tokio::test]
async fn missing_review_channel_still_records_the_submission() {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(FakeDirectory::with(&[], &[]));
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store.clone(), directory, messenger.clone());

    let receipt = service
        .submit(&guild(), &applicant(), answers(), now())
        .await
        .expect("submission recorded");
    assert!(!receipt.review_posted);
    assert!(messenger.cards().is_empty());

    let record = store
        .applicant(&applicant())
        .await
        .expect("fetch resolves")
        .expect("record created");
    assert_eq!(record.last_status, Some(ApplicationStatus::Pending));
}

#[tokio::test]
async fn out_of_bounds_answer_rejects_the_submission() {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(FakeDirectory::with(&[], &[]));
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store.clone(), directory, messenger);

    let mut short = answers();
    short.0[0] = "J".to_string();
    let error = service
        .submit(&guild(), &applicant(), short, now())
        .await
        .expect_err("short answer rejected");
    assert!(matches!(error, SubmitError::Answers(violation) if violation.question == 1));
    assert!(store
        .applicant(&applicant())
        .await
        .expect("fetch resolves")
        .is_none());
}

#[tokio::test]
async fn apply_gate_reports_cooldown_after_submission() {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(FakeDirectory::with(&[], &[]));
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store, directory, messenger);

    service
        .submit(&guild(), &applicant(), answers(), now())
        .await
        .expect("submission recorded");

    let gate = service
        .apply_gate(&guild(), &applicant(), now() + chrono::Duration::hours(1))
        .await
        .expect("gate resolves");
    match gate {
        ApplyGate::OnCooldown { remaining } => assert_eq!(remaining.num_hours(), 23),
        other => panic!("expected cooldown, got {other:?}"),
    }
}

#[tokio::test]
async fn accept_updates_status_counters_roles_and_controls() {
    let store = Arc::new(MemoryStore::default());
    seed_settings(
        &store,
        Some("chan-review"),
        &["role-mod"],
        &["role-staff", "role-helper"],
        None,
    )
    .await;
    let directory = Arc::new(FakeDirectory::with(
        &["chan-review"],
        &["role-staff", "role-helper"],
    ));
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store.clone(), directory.clone(), messenger.clone());

    service
        .submit(&guild(), &applicant(), answers(), now())
        .await
        .expect("submission recorded");

    let outcome = service
        .decide(&guild(), &admin(), &card(), ReviewVerdict::Accept, now())
        .await
        .expect("decision resolves");
    let applied = match outcome {
        DecisionOutcome::Applied(applied) => applied,
        other => panic!("expected applied decision, got {other:?}"),
    };
    assert!(applied.applicant_notified);
    assert_eq!(applied.roles_granted, 2);
    assert_eq!(applied.roles_failed, 0);
    assert!(applied.controls_disabled);

    let record = store
        .applicant(&applicant())
        .await
        .expect("fetch resolves")
        .expect("record exists");
    assert_eq!(record.last_status, Some(ApplicationStatus::Accepted));

    let counters = store.counters(&guild()).await.expect("counters resolve");
    assert_eq!(counters.accepted_applications, 1);

    let grants = directory.grants();
    assert_eq!(grants.len(), 2);
    assert!(grants.iter().all(|(user, _)| user == &applicant()));

    assert_eq!(messenger.disabled(), vec![MessageId("msg-0".into())]);
    assert_eq!(messenger.dms().len(), 1);
}

#[tokio::test]
async fn second_decision_on_a_decided_card_is_a_noop() {
    let store = Arc::new(MemoryStore::default());
    seed_settings(&store, Some("chan-review"), &["role-mod"], &[], None).await;
    let directory = Arc::new(FakeDirectory::with(&["chan-review"], &[]));
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store.clone(), directory, messenger.clone());

    service
        .submit(&guild(), &applicant(), answers(), now())
        .await
        .expect("submission recorded");
    service
        .decide(&guild(), &admin(), &card(), ReviewVerdict::Accept, now())
        .await
        .expect("first decision resolves");

    let counters_before = store.counters(&guild()).await.expect("counters resolve");
    let status_before = store
        .applicant(&applicant())
        .await
        .expect("fetch resolves")
        .expect("record exists")
        .last_status;

    // Late reviewers see the card with its controls disabled.
    let decided_card = ReviewCardRef {
        controls_disabled: true,
        ..card()
    };
    let outcome = service
        .decide(&guild(), &admin(), &decided_card, ReviewVerdict::Reject, now())
        .await
        .expect("second decision resolves");
    assert_eq!(outcome, DecisionOutcome::AlreadyDecided);

    let counters_after = store.counters(&guild()).await.expect("counters resolve");
    assert_eq!(counters_before, counters_after);
    let status_after = store
        .applicant(&applicant())
        .await
        .expect("fetch resolves")
        .expect("record exists")
        .last_status;
    assert_eq!(status_before, status_after);
}

#[tokio::test]
async fn unauthorized_reviewer_is_denied_without_side_effects() {
    let store = Arc::new(MemoryStore::default());
    seed_settings(&store, Some("chan-review"), &["role-mod"], &[], None).await;
    let directory = Arc::new(FakeDirectory::with(&["chan-review"], &[]));
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store.clone(), directory, messenger.clone());

    let outcome = service
        .decide(
            &guild(),
            &member("pleb-1", &["role-other"]),
            &card(),
            ReviewVerdict::Accept,
            now(),
        )
        .await
        .expect("decision resolves");
    assert_eq!(outcome, DecisionOutcome::Denied);
    assert!(messenger.dms().is_empty());
    assert!(messenger.disabled().is_empty());
}

#[tokio::test]
async fn block_verdict_inserts_blocklist_entry_once() {
    let store = Arc::new(MemoryStore::default());
    seed_settings(&store, Some("chan-review"), &["role-mod"], &[], None).await;
    let directory = Arc::new(FakeDirectory::with(&["chan-review"], &[]));
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store.clone(), directory, messenger);

    let outcome = service
        .decide(&guild(), &admin(), &card(), ReviewVerdict::Block, now())
        .await
        .expect("decision resolves");
    assert!(matches!(outcome, DecisionOutcome::Applied(_)));
    assert!(store
        .is_blocked(&guild(), &applicant())
        .await
        .expect("probe resolves"));
    let counters = store.counters(&guild()).await.expect("counters resolve");
    assert_eq!(counters.blocked_users, 1);

    // A fresh card for the same applicant cannot block twice.
    let outcome = service
        .decide(&guild(), &admin(), &card(), ReviewVerdict::Block, now())
        .await
        .expect("decision resolves");
    assert_eq!(outcome, DecisionOutcome::AlreadyBlocked);
    let counters = store.counters(&guild()).await.expect("counters resolve");
    assert_eq!(counters.blocked_users, 1);
}

#[tokio::test]
async fn notification_failure_does_not_abort_the_decision() {
    let store = Arc::new(MemoryStore::default());
    seed_settings(&store, Some("chan-review"), &["role-mod"], &[], None).await;
    let directory = Arc::new(FakeDirectory::with(&["chan-review"], &[]));
    let messenger = Arc::new(RecordingMessenger::failing_dms());
    let service = service(store.clone(), directory, messenger.clone());

    let outcome = service
        .decide(&guild(), &admin(), &card(), ReviewVerdict::Reject, now())
        .await
        .expect("decision resolves");
    let applied = match outcome {
        DecisionOutcome::Applied(applied) => applied,
        other => panic!("expected applied decision, got {other:?}"),
    };
    assert!(!applied.applicant_notified);
    assert!(applied.controls_disabled);

    let record = store
        .applicant(&applicant())
        .await
        .expect("fetch resolves")
        .expect("record upserted");
    assert_eq!(record.last_status, Some(ApplicationStatus::Rejected));
}

#[tokio::test]
async fn role_grant_failures_are_counted_not_fatal() {
    let store = Arc::new(MemoryStore::default());
    seed_settings(
        &store,
        Some("chan-review"),
        &["role-mod"],
        &["role-staff", "role-locked"],
        None,
    )
    .await;
    let directory = Arc::new(
        FakeDirectory::with(&["chan-review"], &["role-staff", "role-locked"])
            .failing_role("role-locked"),
    );
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store, directory.clone(), messenger);

    let outcome = service
        .decide(&guild(), &admin(), &card(), ReviewVerdict::Accept, now())
        .await
        .expect("decision resolves");
    let applied = match outcome {
        DecisionOutcome::Applied(applied) => applied,
        other => panic!("expected applied decision, got {other:?}"),
    };
    assert_eq!(applied.roles_granted, 1);
    assert_eq!(applied.roles_failed, 1);
    assert_eq!(
        directory.grants(),
        vec![(applicant(), RoleId("role-staff".into()))]
    );
}

#[tokio::test]
async fn answers_survive_onto_the_review_card() {
    let store = Arc::new(MemoryStore::default());
    seed_settings(&store, Some("chan-review"), &[], &[], None).await;
    let directory = Arc::new(FakeDirectory::with(&["chan-review"], &[]));
    let messenger = Arc::new(RecordingMessenger::default());
    let service = service(store, directory, messenger.clone());

    let submitted: ApplicationAnswers = answers();
    service
        .submit(&guild(), &applicant(), submitted.clone(), now())
        .await
        .expect("submission recorded");

    let cards = messenger.cards();
    assert_eq!(cards[0].1.answers, submitted);
    assert_eq!(cards[0].1.submitted_at, now());
}
