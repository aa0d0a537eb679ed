use std::sync::{Arc, Mutex};

use listing::core::steps::{STEP_COUNT, Step};
use listing::core::types::{FieldName, FieldValue, NotificationKind, SubmissionResult};
use listing::submission;
use listing::test_support::{
    RecordingNotifier, RecordingRefresh, ScriptedStore, TestProject, filled_wizard,
};
use listing::wizard::{Collaborators, StepOutcome, StepSignal, Wizard, WizardSettings, WizardState};

#[tokio::test]
async fn scenario_five_nexts_then_submit_resets_everything() {
    let store = ScriptedStore::succeeding();
    let notifier = RecordingNotifier::default();
    let refresh = RecordingRefresh::default();
    let with = Collaborators {
        store: &store,
        owner_id: "u1",
        notifier: &notifier,
        refresh: &refresh,
    };
    let mut wizard = Wizard::open(WizardSettings::default());
    assert_eq!(wizard.get_field(FieldName::Category), &FieldValue::text(""));

    for expected in 1..STEP_COUNT {
        let outcome = wizard.on_next(&with).await;
        assert_eq!(outcome, StepOutcome::Advanced(Step::ALL[expected]));
    }
    assert_eq!(wizard.current_step(), Step::Price);

    let outcome = wizard.on_next(&with).await;
    assert!(matches!(
        outcome,
        StepOutcome::Submitted(SubmissionResult::Success(_))
    ));
    assert_eq!(notifier.kinds(), vec![NotificationKind::Success]);
    assert_eq!(refresh.count(), 1);
    assert_eq!(wizard.current_step(), Step::Category);
    assert_eq!(wizard.state(), &WizardState::new());
    assert!(!wizard.is_open());
}

#[tokio::test]
async fn success_from_populated_state_restores_defaults() {
    let store = ScriptedStore::succeeding();
    let notifier = RecordingNotifier::default();
    let refresh = RecordingRefresh::default();
    let mut wizard = filled_wizard(WizardSettings::default());
    assert_ne!(wizard.state(), &WizardState::new());

    let outcome = wizard
        .on_next(&Collaborators {
            store: &store,
            owner_id: "u1",
            notifier: &notifier,
            refresh: &refresh,
        })
        .await;

    let StepOutcome::Submitted(SubmissionResult::Success(listing)) = outcome else {
        panic!("expected success");
    };
    assert_eq!(listing.draft.title, "Cabin");
    assert_eq!(wizard.state(), &WizardState::new());
    assert!(!wizard.is_submitting());
    assert!(!wizard.is_open());
    assert_eq!(
        notifier.events(),
        vec![(
            NotificationKind::Success,
            "Listing created successfully!".to_string()
        )]
    );
}

#[tokio::test]
async fn failure_keeps_fields_and_step() {
    let store = ScriptedStore::failing("service unavailable");
    let notifier = RecordingNotifier::default();
    let refresh = RecordingRefresh::default();
    let mut wizard = Wizard::open(WizardSettings::default());
    wizard
        .set_field(FieldName::Title, FieldValue::text("Cabin"))
        .expect("title");
    wizard
        .set_field(FieldName::Price, FieldValue::Number(100))
        .expect("price");
    while !wizard.current_step().is_terminal() {
        wizard.submit_step();
    }
    let step_before = wizard.current_step();

    let outcome = wizard
        .on_next(&Collaborators {
            store: &store,
            owner_id: "u1",
            notifier: &notifier,
            refresh: &refresh,
        })
        .await;

    assert!(matches!(
        outcome,
        StepOutcome::Submitted(SubmissionResult::Failure(_))
    ));
    assert_eq!(wizard.get_field(FieldName::Title), &FieldValue::text("Cabin"));
    assert_eq!(wizard.get_field(FieldName::Price), &FieldValue::Number(100));
    assert_eq!(wizard.current_step(), step_before);
    assert!(!wizard.is_submitting());
    assert!(wizard.is_open());
    assert_eq!(
        notifier.events(),
        vec![(
            NotificationKind::Failure,
            "Something went wrong, please try again later".to_string()
        )]
    );
    assert_eq!(refresh.count(), 0);
}

#[tokio::test]
async fn retry_after_failure_succeeds_with_same_data() {
    let store = ScriptedStore::succeeding().then(Err("timeout"));
    let notifier = RecordingNotifier::default();
    let refresh = RecordingRefresh::default();
    let with = Collaborators {
        store: &store,
        owner_id: "u1",
        notifier: &notifier,
        refresh: &refresh,
    };
    let mut wizard = filled_wizard(WizardSettings::default());

    assert!(matches!(
        wizard.on_next(&with).await,
        StepOutcome::Submitted(SubmissionResult::Failure(_))
    ));
    let StepOutcome::Submitted(SubmissionResult::Success(listing)) = wizard.on_next(&with).await
    else {
        panic!("expected retry to succeed");
    };
    assert_eq!(listing.draft.title, "Cabin");
    assert_eq!(store.calls(), 2);
    assert_eq!(
        notifier.kinds(),
        vec![NotificationKind::Failure, NotificationKind::Success]
    );
}

#[tokio::test]
async fn concurrent_submit_issues_one_request() {
    let store = Arc::new(ScriptedStore::succeeding().gated());
    let notifier = Arc::new(RecordingNotifier::default());
    let refresh = Arc::new(RecordingRefresh::default());
    let wizard = Arc::new(Mutex::new(filled_wizard(WizardSettings::default())));

    let first = {
        let (store, notifier, refresh, wizard) = (
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&refresh),
            Arc::clone(&wizard),
        );
        tokio::spawn(async move {
            let signal = wizard.lock().expect("lock").submit_step();
            let StepSignal::Submit(pending) = signal else {
                panic!("expected submit");
            };
            let completed = submission::perform(store.as_ref(), "u1", pending).await;
            wizard
                .lock()
                .expect("lock")
                .finish_submission(completed, notifier.as_ref(), refresh.as_ref())
        })
    };

    store.wait_started().await;
    {
        let mut guard = wizard.lock().expect("lock");
        assert!(guard.is_submitting());
        assert!(matches!(guard.submit_step(), StepSignal::Busy));
        assert!(!guard.on_back());
    }

    store.release(1);
    let result = first.await.expect("join");
    assert!(result.is_success());
    assert_eq!(store.calls(), 1);
    assert_eq!(notifier.kinds(), vec![NotificationKind::Success]);
    assert!(!wizard.lock().expect("lock").is_submitting());
}

#[tokio::test]
async fn json_store_end_to_end() {
    let project = TestProject::new();
    let store = project.store();
    let notifier = RecordingNotifier::default();
    let refresh = RecordingRefresh::default();
    let mut wizard = filled_wizard(WizardSettings::from(&project.config));

    let outcome = wizard
        .on_next(&Collaborators {
            store: &store,
            owner_id: &project.user.id,
            notifier: &notifier,
            refresh: &refresh,
        })
        .await;

    let StepOutcome::Submitted(SubmissionResult::Success(listing)) = outcome else {
        panic!("expected success");
    };
    let persisted = project.store().snapshot().expect("snapshot");
    assert_eq!(persisted.listings, vec![listing]);
}
