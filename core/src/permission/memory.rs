use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    permission::{
        error::LookupError,
        ports::{DirectoryConnection, DirectoryPort},
        types::LrnOwnershipKey,
    },
    types::CustomerId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSeed {
    pub user_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LrnOwnerSeed {
    pub lrn: String,
    pub region_id: String,
    pub spid: String,
    pub customer_id: String,
}

/// Directory contents loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub grants: Vec<GrantSeed>,
    #[serde(default)]
    pub lrn_owners: Vec<LrnOwnerSeed>,
}

#[derive(Debug, Clone, Default)]
struct DirectoryData {
    grants: HashMap<(String, String), Vec<String>>,
    lrn_owners: HashMap<LrnOwnershipKey, CustomerId>,
}

#[derive(Debug, Default)]
struct ConnectionCounters {
    open: AtomicUsize,
    acquired: AtomicUsize,
}

/// Directory backed by in-process maps; counts checked-out connections.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    data: Arc<DirectoryData>,
    counters: Arc<ConnectionCounters>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: &DirectorySeed) -> Self {
        let mut directory = Self::new();
        for grant in &seed.grants {
            directory = directory.with_grant(&grant.user_id, &grant.customer_id, &grant.codes);
        }
        for owner in &seed.lrn_owners {
            directory = directory.with_lrn_owner(
                LrnOwnershipKey {
                    lrn: owner.lrn.clone(),
                    region_id: owner.region_id.clone(),
                    spid: owner.spid.clone(),
                },
                &owner.customer_id,
            );
        }
        directory
    }

    pub fn with_grant<S: AsRef<str>>(
        mut self,
        user_id: &str,
        customer_id: &str,
        codes: &[S],
    ) -> Self {
        Arc::make_mut(&mut self.data)
            .grants
            .entry((user_id.to_string(), customer_id.to_string()))
            .or_default()
            .extend(codes.iter().map(|code| code.as_ref().to_string()));
        self
    }

    pub fn with_lrn_owner(mut self, key: LrnOwnershipKey, customer_id: &str) -> Self {
        Arc::make_mut(&mut self.data)
            .lrn_owners
            .insert(key, customer_id.to_string());
        self
    }

    /// Connections currently checked out and not yet dropped.
    pub fn open_connections(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }

    pub fn total_acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryPort for InMemoryDirectory {
    async fn acquire(&self) -> Result<Box<dyn DirectoryConnection>, LookupError> {
        self.counters.open.fetch_add(1, Ordering::SeqCst);
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryConnection {
            data: Arc::clone(&self.data),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct InMemoryConnection {
    data: Arc<DirectoryData>,
    counters: Arc<ConnectionCounters>,
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DirectoryConnection for InMemoryConnection {
    async fn permission_codes(
        &mut self,
        user_id: &str,
        customer_id: &str,
    ) -> Result<Vec<String>, LookupError> {
        Ok(self
            .data
            .grants
            .get(&(user_id.to_string(), customer_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn lrn_owner(
        &mut self,
        key: &LrnOwnershipKey,
    ) -> Result<Option<CustomerId>, LookupError> {
        Ok(self.data.lrn_owners.get(key).cloned())
    }
}
