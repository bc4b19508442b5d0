use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use portgate::{
    evaluator::{
        EvaluatorCache, EvaluatorDescriptor, EvaluatorDiscovery, EvaluatorDiscoveryPort,
    },
    search_path::PATH_SEPARATOR,
};

use super::{location, rules_catalog, write_unit};

/// Wraps real discovery and counts how often it touches the search path.
struct CountingDiscovery {
    inner: EvaluatorDiscovery,
    calls: AtomicUsize,
}

impl CountingDiscovery {
    fn new() -> Self {
        Self {
            inner: EvaluatorDiscovery::with_default_suffix(rules_catalog()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EvaluatorDiscoveryPort for CountingDiscovery {
    fn discover(&self, locations: &[String]) -> Vec<EvaluatorDescriptor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.discover(locations)
    }
}

#[test]
fn repeated_lookup_reuses_the_first_result() {
    let dir = tempfile::tempdir().expect("temp dir should exist");
    write_unit(dir.path(), "acme/rules/lrn/LrnExists.rule");
    write_unit(dir.path(), "acme/rules/npa/NpaNxxOpen.rule");
    let discovery = Arc::new(CountingDiscovery::new());
    let cache = EvaluatorCache::new(discovery.clone());
    let search_path = location(dir.path());

    let first = cache.get_or_discover(&search_path);
    write_unit(dir.path(), "acme/rules/lrn/SpidMatches.rule");
    let second = cache.get_or_discover(&search_path);

    assert_eq!(first.len(), 2);
    assert_eq!(first.as_ref(), second.as_ref());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(discovery.calls(), 1);
}

#[test]
fn flush_picks_up_new_units() {
    let dir = tempfile::tempdir().expect("temp dir should exist");
    write_unit(dir.path(), "acme/rules/lrn/LrnExists.rule");
    let discovery = Arc::new(CountingDiscovery::new());
    let cache = EvaluatorCache::new(discovery.clone());
    let search_path = location(dir.path());

    assert_eq!(cache.get_or_discover(&search_path).len(), 1);
    write_unit(dir.path(), "acme/rules/lrn/SpidMatches.rule");
    assert_eq!(cache.flush(), 1);

    assert_eq!(cache.get_or_discover(&search_path).len(), 2);
    assert_eq!(discovery.calls(), 2);
}

#[test]
fn keys_are_exact_raw_strings() {
    let dir = tempfile::tempdir().expect("temp dir should exist");
    write_unit(dir.path(), "acme/rules/lrn/LrnExists.rule");
    let discovery = Arc::new(CountingDiscovery::new());
    let cache = EvaluatorCache::new(discovery.clone());
    let plain = location(dir.path());
    let padded = format!("{plain}{PATH_SEPARATOR}");

    let from_plain = cache.get_or_discover(&plain);
    let from_padded = cache.get_or_discover(&padded);

    assert_eq!(from_plain.as_ref(), from_padded.as_ref());
    assert_eq!(cache.len(), 2);
    assert_eq!(discovery.calls(), 2);
}

#[test]
fn concurrent_first_lookups_agree_on_one_complete_list() {
    let dir = tempfile::tempdir().expect("temp dir should exist");
    write_unit(dir.path(), "acme/rules/lrn/LrnExists.rule");
    write_unit(dir.path(), "acme/rules/lrn/SpidMatches.rule");
    write_unit(dir.path(), "acme/rules/npa/NpaNxxOpen.rule");
    let discovery = Arc::new(CountingDiscovery::new());
    let cache = Arc::new(EvaluatorCache::new(discovery.clone()));
    let search_path = location(dir.path());

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            let search_path = search_path.clone();
            thread::spawn(move || {
                barrier.wait();
                cache.get_or_discover(&search_path)
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker should not panic"))
        .collect();

    let stored = cache.get_or_discover(&search_path);
    assert_eq!(stored.len(), 3);
    for result in &results {
        assert!(Arc::ptr_eq(result, &stored));
    }
    assert_eq!(cache.len(), 1);
    assert!((1..=workers).contains(&discovery.calls()));
}

/// Numbers each discovery run; the first run parks between two barriers so a
/// flush can land while it is in flight.
struct GatedDiscovery {
    runs: AtomicUsize,
    entered: Barrier,
    release: Barrier,
}

impl GatedDiscovery {
    fn new() -> Self {
        Self {
            runs: AtomicUsize::new(0),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        }
    }
}

impl EvaluatorDiscoveryPort for GatedDiscovery {
    fn discover(&self, locations: &[String]) -> Vec<EvaluatorDescriptor> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst);
        if run == 0 {
            self.entered.wait();
            self.release.wait();
        }
        locations
            .iter()
            .map(|location| EvaluatorDescriptor::new(format!("rules.Gen{run}"), location))
            .collect()
    }
}

#[test]
fn flush_during_discovery_is_not_undone() {
    let discovery = Arc::new(GatedDiscovery::new());
    let cache = Arc::new(EvaluatorCache::new(discovery.clone()));

    let in_flight = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || cache.get_or_discover("/x"))
    };
    discovery.entered.wait();
    assert_eq!(cache.flush(), 0);
    discovery.release.wait();

    let stale = in_flight.join().expect("lookup should not panic");
    assert_eq!(stale[0].qualified_name, "rules.Gen0");
    assert!(cache.is_empty());

    let fresh = cache.get_or_discover("/x");
    assert_eq!(fresh[0].qualified_name, "rules.Gen1");
    assert_eq!(discovery.runs.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 1);
}
