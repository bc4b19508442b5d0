mod pipeline;

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use portgate::{
    evaluator::{
        EvaluationError, EvaluatorCache, EvaluatorCatalog, EvaluatorDescriptor,
        EvaluatorDiscoveryPort, RuleEvaluator, RuleInput, UnitLoader, ViolationCollection,
        evaluator_failed,
    },
    orchestrator::{AllowedActionsService, RuleEvaluationOrchestrator},
    permission::{
        DirectoryConnection, DirectoryPort, InMemoryDirectory, LookupError, LrnOwnershipKey,
        PermissionGate, PermissionPolicy, query_failed,
    },
    types::{CustomerId, RecordContext, RecordFields, ServiceType},
};

const SEARCH_PATH: &str = "/opt/portgate/rules";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Allow,
    Deny,
    Fail,
    Panic,
}

/// Ordered record of `evaluator:request` invocations shared by a test's rules.
#[derive(Default)]
struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    fn record(&self, evaluator: &str, request_name: &str) {
        self.calls
            .lock()
            .expect("lock")
            .push(format!("{evaluator}:{request_name}"));
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

/// Allows every request unless a verdict is scripted for its request name.
struct ScriptedRule {
    name: &'static str,
    verdicts: HashMap<&'static str, Verdict>,
    log: Arc<CallLog>,
}

impl ScriptedRule {
    fn new(name: &'static str, log: &Arc<CallLog>) -> Self {
        Self {
            name,
            verdicts: HashMap::new(),
            log: Arc::clone(log),
        }
    }

    fn on(mut self, request_name: &'static str, verdict: Verdict) -> Self {
        self.verdicts.insert(request_name, verdict);
        self
    }
}

impl RuleEvaluator for ScriptedRule {
    fn evaluate(
        &self,
        input: &RuleInput<'_>,
        violations: &mut ViolationCollection,
    ) -> Result<bool, EvaluationError> {
        let request_name = input.request.request_name.as_str();
        self.log.record(self.name, request_name);
        match self
            .verdicts
            .get(request_name)
            .copied()
            .unwrap_or(Verdict::Allow)
        {
            Verdict::Allow => Ok(true),
            Verdict::Deny => {
                violations.push("scripted_denial", format!("{} denies", self.name));
                Ok(false)
            }
            Verdict::Fail => Err(evaluator_failed(format!("{} blew up", self.name))),
            Verdict::Panic => panic!("{} hit an unreachable branch", self.name),
        }
    }
}

/// Hands out a fixed descriptor list without touching the filesystem.
struct StaticDiscovery {
    descriptors: Vec<EvaluatorDescriptor>,
    calls: AtomicUsize,
}

impl StaticDiscovery {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EvaluatorDiscoveryPort for StaticDiscovery {
    fn discover(&self, _locations: &[String]) -> Vec<EvaluatorDescriptor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.descriptors.clone()
    }
}

/// Delegates permission lookups but fails every ownership query.
struct OwnershipOutageDirectory {
    inner: InMemoryDirectory,
}

struct OwnershipOutageConnection {
    inner: Box<dyn DirectoryConnection>,
}

#[async_trait]
impl DirectoryConnection for OwnershipOutageConnection {
    async fn permission_codes(
        &mut self,
        user_id: &str,
        customer_id: &str,
    ) -> Result<Vec<String>, LookupError> {
        self.inner.permission_codes(user_id, customer_id).await
    }

    async fn lrn_owner(
        &mut self,
        _key: &LrnOwnershipKey,
    ) -> Result<Option<CustomerId>, LookupError> {
        Err(query_failed("ownership table unavailable"))
    }
}

#[async_trait]
impl DirectoryPort for OwnershipOutageDirectory {
    async fn acquire(&self) -> Result<Box<dyn DirectoryConnection>, LookupError> {
        let inner = self.inner.acquire().await?;
        Ok(Box::new(OwnershipOutageConnection { inner }))
    }
}

struct Harness {
    service: AllowedActionsService,
    discovery: Arc<StaticDiscovery>,
}

impl Harness {
    /// Evaluators run in the order given.
    fn new(directory: Arc<dyn DirectoryPort>, rules: Vec<ScriptedRule>) -> Self {
        let mut builder = EvaluatorCatalog::builder();
        let mut descriptors = Vec::new();
        for rule in rules {
            let name = format!("rules.{}", rule.name);
            descriptors.push(EvaluatorDescriptor::new(name.clone(), SEARCH_PATH));
            builder = builder.evaluator(name, Arc::new(rule));
        }
        let loader: Arc<dyn UnitLoader> =
            Arc::new(builder.build().expect("catalog should build"));
        Self::with_loader(directory, loader, descriptors)
    }

    fn with_loader(
        directory: Arc<dyn DirectoryPort>,
        loader: Arc<dyn UnitLoader>,
        descriptors: Vec<EvaluatorDescriptor>,
    ) -> Self {
        let discovery = Arc::new(StaticDiscovery {
            descriptors,
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(EvaluatorCache::new(discovery.clone()));
        let gate = Arc::new(PermissionGate::new(directory, PermissionPolicy::default()));
        let orchestrator =
            RuleEvaluationOrchestrator::new(Arc::clone(&gate), cache, loader, SEARCH_PATH);
        Self {
            service: AllowedActionsService::new(gate, orchestrator),
            discovery,
        }
    }
}

fn lrn_fields() -> RecordFields {
    RecordFields {
        lrn: Some("3125550000".to_string()),
        spid: Some("1111".to_string()),
        region_id: Some("3".to_string()),
        ..RecordFields::default()
    }
}

fn lrn_key() -> LrnOwnershipKey {
    LrnOwnershipKey {
        lrn: "3125550000".to_string(),
        region_id: "3".to_string(),
        spid: "1111".to_string(),
    }
}

fn lrn_record() -> RecordContext {
    RecordContext::new(ServiceType::Lrn, "active", lrn_fields())
}

fn actions(list: &[&str]) -> Vec<String> {
    list.iter().map(|action| action.to_string()).collect()
}
