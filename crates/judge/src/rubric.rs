use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// One row of the user-editable rubric table. Weight is a whole percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    #[serde(alias = "Criterion")]
    pub name: String,
    #[serde(alias = "Weight (%)")]
    pub weight: u32,
}

impl Criterion {
    pub fn new(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedCriterion {
    pub name: String,
    /// Weight as a fraction of 1.0.
    pub fraction: f64,
}

impl WeightedCriterion {
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }
}

/// A validated rubric: non-empty, unique names, weights summing to exactly 100.
/// Only [`validate`] builds one, so holders never re-check it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rubric {
    criteria: Vec<WeightedCriterion>,
}

impl Rubric {
    pub fn criteria(&self) -> &[WeightedCriterion] {
        &self.criteria
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RubricError {
    #[error("the rubric has no criteria")]
    Empty,

    #[error("criterion #{position} has no name")]
    EmptyName { position: usize },

    #[error("criterion '{name}' appears more than once")]
    DuplicateName { name: String },

    #[error("criterion '{name}' has weight {weight}%, expected 1-100%")]
    WeightOutOfRange { name: String, weight: u32 },

    #[error("criterion weights must sum to 100%, got {total}%")]
    InvalidWeightTotal { total: u64 },
}

/// Validate user-supplied criteria and normalize weights to fractions,
/// preserving input order.
pub fn validate(criteria: &[Criterion]) -> Result<Rubric, RubricError> {
    if criteria.is_empty() {
        return Err(RubricError::Empty);
    }

    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(criteria.len());

    for (index, criterion) in criteria.iter().enumerate() {
        let name = criterion.name.trim();
        if name.is_empty() {
            return Err(RubricError::EmptyName {
                position: index + 1,
            });
        }
        if !seen.insert(name) {
            return Err(RubricError::DuplicateName {
                name: name.to_string(),
            });
        }
        if criterion.weight == 0 || criterion.weight > 100 {
            return Err(RubricError::WeightOutOfRange {
                name: name.to_string(),
                weight: criterion.weight,
            });
        }

        normalized.push(WeightedCriterion {
            name: name.to_string(),
            fraction: f64::from(criterion.weight) / 100.0,
        });
    }

    let total: u64 = criteria.iter().map(|c| u64::from(c.weight)).sum();
    if total != 100 {
        return Err(RubricError::InvalidWeightTotal { total });
    }

    Ok(Rubric {
        criteria: normalized,
    })
}

/// Rubric used when the caller does not bring one.
pub fn default_criteria() -> Vec<Criterion> {
    vec![
        Criterion::new("Originality", 30),
        Criterion::new("Technical Feasibility", 25),
        Criterion::new("Impact", 20),
        Criterion::new("Presentation Quality", 15),
        Criterion::new("Code Quality & Correctness", 10),
    ]
}
