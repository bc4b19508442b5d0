use std::{collections::BTreeMap, sync::Arc};

use crate::evaluator::{
    error::{
        CatalogError, DiscoveryError, EvaluationError, evaluator_failed, evaluator_unavailable,
    },
    ports::{RuleEvaluator, UnitKind, UnitLoader},
    types::EvaluatorDescriptor,
};

pub type EvaluatorFactory =
    Arc<dyn Fn() -> Result<Arc<dyn RuleEvaluator>, EvaluationError> + Send + Sync>;

enum CatalogEntry {
    Evaluator(EvaluatorFactory),
    Abstract,
    Auxiliary,
}

impl CatalogEntry {
    fn kind(&self) -> UnitKind {
        match self {
            CatalogEntry::Evaluator(_) => UnitKind::Evaluator,
            CatalogEntry::Abstract => UnitKind::AbstractEvaluator,
            CatalogEntry::Auxiliary => UnitKind::Auxiliary,
        }
    }
}

/// Statically compiled table of every unit a search path may name.
///
/// Discovery only activates catalog entries whose unit files are present on
/// the search path; a unit file with no catalog entry fails identification.
pub struct EvaluatorCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl EvaluatorCatalog {
    pub fn builder() -> EvaluatorCatalogBuilder {
        EvaluatorCatalogBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evaluator_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, entry)| matches!(entry, CatalogEntry::Evaluator(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl UnitLoader for EvaluatorCatalog {
    fn identify(&self, qualified_name: &str) -> Result<UnitKind, DiscoveryError> {
        self.entries
            .get(qualified_name)
            .map(CatalogEntry::kind)
            .ok_or_else(|| DiscoveryError::unit_load(qualified_name, "no such unit in catalog"))
    }

    fn instantiate(
        &self,
        descriptor: &EvaluatorDescriptor,
    ) -> Result<Arc<dyn RuleEvaluator>, EvaluationError> {
        match self.entries.get(&descriptor.qualified_name) {
            Some(CatalogEntry::Evaluator(factory)) => factory().map_err(|err| {
                evaluator_failed(format!(
                    "failed to instantiate {}: {}",
                    descriptor.qualified_name, err
                ))
            }),
            Some(_) => Err(evaluator_unavailable(format!(
                "{} is not a concrete evaluator",
                descriptor.qualified_name
            ))),
            None => Err(evaluator_unavailable(format!(
                "{} is not registered",
                descriptor.qualified_name
            ))),
        }
    }
}

#[derive(Default)]
pub struct EvaluatorCatalogBuilder {
    pending: Vec<(String, CatalogEntry)>,
}

impl EvaluatorCatalogBuilder {
    /// Registers a shared, stateless evaluator instance.
    pub fn evaluator(
        self,
        qualified_name: impl Into<String>,
        evaluator: Arc<dyn RuleEvaluator>,
    ) -> Self {
        self.evaluator_factory(qualified_name, move || Ok(Arc::clone(&evaluator)))
    }

    pub fn evaluator_factory<F>(mut self, qualified_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn RuleEvaluator>, EvaluationError> + Send + Sync + 'static,
    {
        self.pending
            .push((qualified_name.into(), CatalogEntry::Evaluator(Arc::new(factory))));
        self
    }

    pub fn abstract_unit(mut self, qualified_name: impl Into<String>) -> Self {
        self.pending.push((qualified_name.into(), CatalogEntry::Abstract));
        self
    }

    pub fn auxiliary_unit(mut self, qualified_name: impl Into<String>) -> Self {
        self.pending.push((qualified_name.into(), CatalogEntry::Auxiliary));
        self
    }

    pub fn build(self) -> Result<EvaluatorCatalog, CatalogError> {
        let mut entries = BTreeMap::new();
        for (name, entry) in self.pending {
            if !is_valid_qualified_name(&name) {
                return Err(CatalogError::InvalidName(name));
            }
            if entries.contains_key(&name) {
                return Err(CatalogError::Duplicate(name));
            }
            entries.insert(name, entry);
        }
        Ok(EvaluatorCatalog { entries })
    }
}

/// Dotted segments, none empty; nested-unit markers are never registrable.
pub fn is_valid_qualified_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(crate::evaluator::discovery::INNER_UNIT_MARKER)
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        })
}
