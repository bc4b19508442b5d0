use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';

/// Splits search-path strings into ordered locations, memoized by the raw input.
#[derive(Debug, Default)]
pub struct PathResolver {
    memo: RwLock<HashMap<String, Arc<[String]>>>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokenize(&self, search_path: &str) -> Arc<[String]> {
        if let Some(locations) = self.memo.read().expect("lock poisoned").get(search_path) {
            return Arc::clone(locations);
        }

        let locations: Arc<[String]> = split_locations(search_path).into();
        let mut guard = self.memo.write().expect("lock poisoned");
        let stored = guard
            .entry(search_path.to_string())
            .or_insert_with(|| Arc::clone(&locations));
        Arc::clone(stored)
    }

    pub fn clear(&self) {
        self.memo.write().expect("lock poisoned").clear();
    }

    pub fn memoized_len(&self) -> usize {
        self.memo.read().expect("lock poisoned").len()
    }
}

fn split_locations(search_path: &str) -> Vec<String> {
    search_path
        .split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
