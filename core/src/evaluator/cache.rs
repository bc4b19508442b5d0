use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    evaluator::{ports::EvaluatorDiscoveryPort, types::EvaluatorDescriptor},
    search_path::PathResolver,
};

/// Resolved evaluator lists keyed by the exact raw search-path string.
///
/// Entries live until [`EvaluatorCache::flush`]. Two concurrent misses on the
/// same key may both run discovery; the first finished list is kept and
/// returned to both callers. A discovery that started before a flush is
/// returned to its caller but never stored.
pub struct EvaluatorCache {
    resolver: PathResolver,
    discovery: Arc<dyn EvaluatorDiscoveryPort>,
    state: RwLock<CacheState>,
}

#[derive(Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<String, Arc<[EvaluatorDescriptor]>>,
}

impl EvaluatorCache {
    pub fn new(discovery: Arc<dyn EvaluatorDiscoveryPort>) -> Self {
        Self {
            resolver: PathResolver::new(),
            discovery,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn get_or_discover(&self, search_path: &str) -> Arc<[EvaluatorDescriptor]> {
        let generation = {
            let state = self.state.read().expect("lock poisoned");
            if let Some(cached) = state.entries.get(search_path) {
                return Arc::clone(cached);
            }
            state.generation
        };

        let locations = self.resolver.tokenize(search_path);
        let discovered: Arc<[EvaluatorDescriptor]> = self.discovery.discover(&locations).into();

        let mut state = self.state.write().expect("lock poisoned");
        if state.generation != generation {
            tracing::info!(
                target: "evaluator_cache",
                search_path = %search_path,
                evaluators = discovered.len(),
                "evaluator_cache_store_skipped_after_flush"
            );
            return discovered;
        }

        tracing::info!(
            target: "evaluator_cache",
            search_path = %search_path,
            locations = locations.len(),
            evaluators = discovered.len(),
            "evaluator_cache_populated"
        );
        let stored = state
            .entries
            .entry(search_path.to_string())
            .or_insert_with(|| Arc::clone(&discovered));
        Arc::clone(stored)
    }

    /// Drops every cached entry and tokenized search path; returns how many
    /// entries were held.
    pub fn flush(&self) -> usize {
        let mut state = self.state.write().expect("lock poisoned");
        let dropped = state.entries.len();
        state.entries.clear();
        state.generation += 1;
        self.resolver.clear();
        tracing::info!(target: "evaluator_cache", dropped, "evaluator_cache_flushed");
        dropped
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
