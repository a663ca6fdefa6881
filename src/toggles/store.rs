//! In-memory feature toggle store.
//!
//! Enforces the same constraints a relational schema would (unique key,
//! non-null columns, strategy → feature foreign key) and reports violations
//! as `DataError::Constraint` with the matching SQLSTATE.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::data::{ConstraintKind, ConstraintViolation, DataError};

pub const FEATURES_TABLE: &str = "features";
pub const STRATEGIES_TABLE: &str = "strategies";

/// A stored feature toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub strategies: Vec<Strategy>,
}

/// A rollout strategy attached to a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: u64,
    pub name: String,
    pub priority: i64,
}

/// Input for creating a feature. Missing columns are reported as
/// not-null violations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFeature {
    pub key: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStrategy {
    pub name: Option<String>,
    #[serde(default)]
    pub priority: i64,
}

/// A thread-safe store of feature toggles.
#[derive(Clone, Default)]
pub struct FeatureToggleStore {
    features: Arc<DashMap<String, Feature>>,
    next_strategy_id: Arc<AtomicU64>,
}

impl FeatureToggleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All features, ordered by key.
    pub fn list(&self) -> Vec<Feature> {
        let mut features: Vec<Feature> = self.features.iter().map(|r| r.value().clone()).collect();
        features.sort_by(|a, b| a.key.cmp(&b.key));
        features
    }

    pub fn get(&self, key: &str) -> Result<Feature, DataError> {
        self.features
            .get(key)
            .map(|r| r.value().clone())
            .ok_or_else(|| DataError::not_found("Feature", key))
    }

    pub fn create(&self, input: NewFeature) -> Result<Feature, DataError> {
        let key = required_column(FEATURES_TABLE, "key", input.key)?;
        let name = required_column(FEATURES_TABLE, "name", input.name)?;

        match self.features.entry(key.clone()) {
            Entry::Occupied(_) => Err(DataError::Constraint(ConstraintViolation::new(
                ConstraintKind::Unique,
                FEATURES_TABLE,
                format!("Key (key)=({}) already exists.", key),
                "duplicate key value violates unique constraint \"features_pkey\"",
            ))),
            Entry::Vacant(slot) => {
                let feature = Feature {
                    key,
                    name,
                    description: input.description,
                    enabled: input.enabled,
                    strategies: Vec::new(),
                };
                slot.insert(feature.clone());
                tracing::info!(key = %feature.key, "Feature created");
                Ok(feature)
            }
        }
    }

    pub fn delete(&self, key: &str) -> Result<Feature, DataError> {
        let (_, feature) = self
            .features
            .remove(key)
            .ok_or_else(|| DataError::not_found("Feature", key))?;
        tracing::info!(key = %key, "Feature deleted");
        Ok(feature)
    }

    pub fn add_strategy(&self, feature_key: &str, input: NewStrategy) -> Result<Strategy, DataError> {
        let name = required_column(STRATEGIES_TABLE, "name", input.name)?;

        let mut feature = self.features.get_mut(feature_key).ok_or_else(|| {
            DataError::Constraint(ConstraintViolation::new(
                ConstraintKind::ForeignKey,
                STRATEGIES_TABLE,
                format!(
                    "Key (feature_key)=({}) is not present in table \"{}\".",
                    feature_key, FEATURES_TABLE
                ),
                "insert or update on table \"strategies\" violates foreign key constraint \"fk_strategies_features\"",
            ))
        })?;

        let strategy = Strategy {
            id: self.next_strategy_id.fetch_add(1, Ordering::Relaxed) + 1,
            name,
            priority: input.priority,
        };
        feature.strategies.push(strategy.clone());
        Ok(strategy)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn required_column(table: &str, column: &str, value: Option<String>) -> Result<String, DataError> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| {
        DataError::Constraint(ConstraintViolation::new(
            ConstraintKind::NotNull,
            table,
            format!("Failing row contains null {}.", column),
            format!(
                "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                column, table
            ),
        ))
    })
}
