//! Child repositories: one aggregator per label-value combination.
//!
//! A metric's name identity is fixed at build time; its per-label-combination
//! time series are created lazily on first observation and never removed.
//! Metrics without labels skip the map entirely and share a single eagerly
//! created child.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{MetrionError, Result};
use crate::label::to_owned_values;

/// One child: a concurrent aggregator paired with the label values that
/// produced it. Created once per distinct label combination, immutable apart
/// from the aggregator's interior state.
pub struct MetricData<S> {
    state: Arc<S>,
    label_values: Vec<String>,
}

impl<S> MetricData<S> {
    fn new(state: S, label_values: Vec<String>) -> Self {
        Self {
            state: Arc::new(state),
            label_values,
        }
    }

    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }
}

type ChildFactory<S> = Box<dyn Fn() -> S + Send + Sync>;

/// Container mapping label identities to children.
///
/// The `Unlabeled` variant holds the single child of a metric with no label
/// dimensions: `state_for_labels` ignores its argument and is allocation-free.
/// The `Labeled` variant lazily creates children through its factory; the
/// map's atomic entry API guarantees exactly one child survives a concurrent
/// first access.
pub enum ChildMetricRepo<S> {
    Unlabeled(MetricData<S>),
    Labeled {
        children: DashMap<Vec<String>, MetricData<S>>,
        factory: Option<ChildFactory<S>>,
    },
}

impl<S> ChildMetricRepo<S> {
    /// Repo for a metric with no labels: one fixed child.
    pub fn unlabeled(state: S) -> Self {
        Self::Unlabeled(MetricData::new(state, Vec::new()))
    }

    /// Repo that creates children on first access through `factory`.
    pub fn labeled(factory: impl Fn() -> S + Send + Sync + 'static) -> Self {
        Self::Labeled {
            children: DashMap::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// Repo with a fixed child set decided at build time (pull gauges).
    /// Lookups for unknown label combinations fail instead of creating.
    pub fn prepopulated(children: impl IntoIterator<Item = (Vec<String>, S)>) -> Self {
        let map = DashMap::new();
        for (label_values, state) in children {
            map.insert(label_values.clone(), MetricData::new(state, label_values));
        }
        Self::Labeled {
            children: map,
            factory: None,
        }
    }

    /// Aggregator for the given label values, creating it if the repo has a
    /// factory. The cheap read path is tried first; a miss falls through to
    /// the map's atomic entry so a racing first access creates one child.
    pub fn state_for_labels(&self, label_values: &[&str]) -> Result<Arc<S>> {
        match self {
            Self::Unlabeled(data) => Ok(Arc::clone(data.state())),
            Self::Labeled { children, factory } => {
                let key = to_owned_values(label_values);
                if let Some(data) = children.get(&key) {
                    return Ok(Arc::clone(data.state()));
                }
                let factory = factory.as_ref().ok_or(MetrionError::UnknownLabels)?;
                let entry = children.entry(key).or_insert_with(|| {
                    tracing::trace!(labels = ?label_values, "creating metric child");
                    MetricData::new(factory(), to_owned_values(label_values))
                });
                Ok(Arc::clone(entry.state()))
            }
        }
    }

    /// Lookup without creation.
    pub fn get(&self, label_values: &[&str]) -> Option<Arc<S>> {
        match self {
            Self::Unlabeled(data) => Some(Arc::clone(data.state())),
            Self::Labeled { children, .. } => children
                .get(&to_owned_values(label_values))
                .map(|data| Arc::clone(data.state())),
        }
    }

    /// Visit every child, in unspecified order. Existing children are never
    /// locked against writers; only creation of a new child in the shard
    /// currently being read has to wait.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&MetricData<S>) -> Result<()>,
    {
        match self {
            Self::Unlabeled(data) => f(data),
            Self::Labeled { children, .. } => {
                for entry in children.iter() {
                    f(entry.value())?;
                }
                Ok(())
            }
        }
    }

    /// Number of children that exist right now.
    pub fn len(&self) -> usize {
        match self {
            Self::Unlabeled(_) => 1,
            Self::Labeled { children, .. } => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
