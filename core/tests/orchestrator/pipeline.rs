use std::sync::{Arc, Mutex};

use portgate::{
    evaluator::{
        EvaluationError, EvaluatorCatalog, EvaluatorDescriptor, RuleEvaluator, RuleInput,
        UnitLoader, ViolationCollection, evaluator_unavailable,
    },
    permission::InMemoryDirectory,
    types::Caller,
};

use super::{
    CallLog, Harness, OwnershipOutageDirectory, SEARCH_PATH, ScriptedRule, Verdict, actions,
    lrn_key, lrn_record,
};

#[tokio::test]
async fn first_denial_skips_later_evaluators() {
    let log = Arc::new(CallLog::default());
    let directory = InMemoryDirectory::new().with_grant("u1", "c1", &["41", "35"]);
    let harness = Harness::new(
        Arc::new(directory),
        vec![
            ScriptedRule::new("E1", &log).on("LrnCreateRequest", Verdict::Deny),
            ScriptedRule::new("E2", &log),
        ],
    );

    let allowed = harness
        .service
        .allowed_actions(&Caller::new("u1", "c1"), &lrn_record())
        .await;

    assert_eq!(allowed, actions(&["Delete", "Query"]));
    assert_eq!(
        log.calls(),
        vec![
            "E1:LrnCreateRequest",
            "E1:LrnDeleteRequest",
            "E2:LrnDeleteRequest",
            "E1:LrnQueryRequest",
            "E2:LrnQueryRequest",
        ]
    );
}

#[tokio::test]
async fn evaluator_error_denies_only_its_candidate() {
    let log = Arc::new(CallLog::default());
    let directory = InMemoryDirectory::new().with_grant("u1", "c1", &["41", "35"]);
    let harness = Harness::new(
        Arc::new(directory),
        vec![
            ScriptedRule::new("E1", &log).on("LrnQueryRequest", Verdict::Fail),
            ScriptedRule::new("E2", &log),
        ],
    );

    let allowed = harness
        .service
        .allowed_actions(&Caller::new("u1", "c1"), &lrn_record())
        .await;

    assert_eq!(allowed, actions(&["Create", "Delete"]));
    assert!(!log.calls().contains(&"E2:LrnQueryRequest".to_string()));
}

#[tokio::test]
async fn panicking_evaluator_denies_only_its_candidate() {
    let log = Arc::new(CallLog::default());
    let directory = InMemoryDirectory::new().with_grant("u1", "c1", &["41", "35"]);
    let harness = Harness::new(
        Arc::new(directory),
        vec![
            ScriptedRule::new("E1", &log).on("LrnCreateRequest", Verdict::Panic),
            ScriptedRule::new("E2", &log),
        ],
    );

    let allowed = harness
        .service
        .allowed_actions(&Caller::new("u1", "c1"), &lrn_record())
        .await;

    assert_eq!(allowed, actions(&["Delete", "Query"]));
    assert!(!log.calls().contains(&"E2:LrnCreateRequest".to_string()));
    assert!(log.calls().contains(&"E2:LrnQueryRequest".to_string()));
}

#[tokio::test]
async fn evaluators_see_prior_candidate_outcomes() {
    struct PriorRecorder {
        seen: Mutex<Vec<Vec<(String, bool)>>>,
    }

    impl RuleEvaluator for PriorRecorder {
        fn evaluate(
            &self,
            input: &RuleInput<'_>,
            _violations: &mut ViolationCollection,
        ) -> Result<bool, EvaluationError> {
            self.seen.lock().expect("lock").push(
                input
                    .prior
                    .iter()
                    .map(|outcome| (outcome.request_name.clone(), outcome.allowed))
                    .collect(),
            );
            Ok(input.request.request_name != "LrnCreateRequest")
        }
    }

    let recorder = Arc::new(PriorRecorder {
        seen: Mutex::new(Vec::new()),
    });
    let loader: Arc<dyn UnitLoader> = Arc::new(
        EvaluatorCatalog::builder()
            .evaluator("rules.PriorRecorder", recorder.clone())
            .build()
            .expect("catalog should build"),
    );
    let directory = InMemoryDirectory::new().with_grant("u1", "c1", &["41", "35"]);
    let harness = Harness::with_loader(
        Arc::new(directory),
        loader,
        vec![EvaluatorDescriptor::new("rules.PriorRecorder", SEARCH_PATH)],
    );

    let allowed = harness
        .service
        .allowed_actions(&Caller::new("u1", "c1"), &lrn_record())
        .await;

    assert_eq!(allowed, actions(&["Delete", "Query"]));
    let seen = recorder.seen.lock().expect("lock").clone();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].is_empty());
    assert_eq!(seen[1], vec![("LrnCreateRequest".to_string(), false)]);
    assert_eq!(
        seen[2],
        vec![
            ("LrnCreateRequest".to_string(), false),
            ("LrnDeleteRequest".to_string(), true),
        ]
    );
}

#[tokio::test]
async fn unloadable_evaluator_denies_every_candidate() {
    let log = Arc::new(CallLog::default());
    let loader: Arc<dyn UnitLoader> = Arc::new(
        EvaluatorCatalog::builder()
            .evaluator_factory("rules.Broken", || Err(evaluator_unavailable("missing driver")))
            .evaluator("rules.E1", Arc::new(ScriptedRule::new("E1", &log)))
            .build()
            .expect("catalog should build"),
    );
    let directory = InMemoryDirectory::new().with_grant("u1", "c1", &["41", "35"]);
    let harness = Harness::with_loader(
        Arc::new(directory),
        loader,
        vec![
            EvaluatorDescriptor::new("rules.Broken", SEARCH_PATH),
            EvaluatorDescriptor::new("rules.E1", SEARCH_PATH),
        ],
    );

    let allowed = harness
        .service
        .allowed_actions(&Caller::new("u1", "c1"), &lrn_record())
        .await;

    assert!(allowed.is_empty());
    assert!(log.calls().is_empty());
}

#[tokio::test]
async fn no_discovered_evaluators_allows_every_candidate() {
    let directory = InMemoryDirectory::new().with_grant("u1", "c1", &["41", "35"]);
    let harness = Harness::new(Arc::new(directory), Vec::new());

    let allowed = harness
        .service
        .allowed_actions(&Caller::new("u1", "c1"), &lrn_record())
        .await;

    assert_eq!(allowed, actions(&["Create", "Delete", "Query"]));
}

#[tokio::test]
async fn evaluator_list_is_discovered_once_across_runs() {
    let log = Arc::new(CallLog::default());
    let directory = InMemoryDirectory::new().with_grant("u1", "c1", &["41", "35"]);
    let harness = Harness::new(Arc::new(directory), vec![ScriptedRule::new("E1", &log)]);
    let caller = Caller::new("u1", "c1");

    harness.service.allowed_actions(&caller, &lrn_record()).await;
    harness.service.allowed_actions(&caller, &lrn_record()).await;
    assert_eq!(harness.discovery.calls(), 1);

    assert_eq!(harness.service.flush_evaluator_cache(), 1);
    harness.service.allowed_actions(&caller, &lrn_record()).await;
    assert_eq!(harness.discovery.calls(), 2);
}

#[tokio::test]
async fn directory_connections_are_released_on_every_path() {
    let log = Arc::new(CallLog::default());
    let owned = Arc::new(
        InMemoryDirectory::new()
            .with_grant("u1", "c1", &["41", "35"])
            .with_lrn_owner(lrn_key(), "c1"),
    );
    let harness = Harness::new(
        owned.clone(),
        vec![ScriptedRule::new("E1", &log).on("LrnDeleteRequest", Verdict::Deny)],
    );

    harness
        .service
        .allowed_actions(&Caller::new("u1", "c1"), &lrn_record())
        .await;

    assert_eq!(owned.total_acquired(), 2);
    assert_eq!(owned.open_connections(), 0);

    let outage = Arc::new(OwnershipOutageDirectory {
        inner: InMemoryDirectory::new().with_grant("u1", "c1", &["41", "35"]),
    });
    let failing = Harness::new(
        outage.clone(),
        vec![ScriptedRule::new("E1", &log).on("LrnDeleteRequest", Verdict::Deny)],
    );

    failing
        .service
        .allowed_actions(&Caller::new("u1", "c1"), &lrn_record())
        .await;

    assert_eq!(outage.inner.total_acquired(), 2);
    assert_eq!(outage.inner.open_connections(), 0);
}
