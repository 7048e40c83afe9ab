//! Weighted aggregation and the approval decision

use crate::rubric::{RubricConfig, Thresholds};
use crate::scorer::ScoreSet;
use log::debug;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted compliance percentage in `[0, 100]`, rounded to 2 decimals.
///
/// `100 × Σ(score × weight) / (scale_max × Σ weight)`. Criteria missing from
/// `scores` count as 0, scores for keys missing from `weights` weigh
/// nothing, and a zero weight sum yields 0.0.
pub fn weighted_percentage(
    scores: &ScoreSet,
    weights: &BTreeMap<String, f64>,
    scale_max: u32,
) -> f64 {
    let weight_sum: f64 = weights.values().sum();
    if weight_sum <= 0.0 || scale_max == 0 {
        return 0.0;
    }

    for (key, _) in scores.iter().filter(|(k, _)| !weights.contains_key(*k)) {
        debug!("Score for '{}' has no weight and is ignored", key);
    }

    let achieved: f64 = weights
        .iter()
        .map(|(key, weight)| scores.get(key).min(scale_max) as f64 * weight)
        .sum();

    round2(100.0 * achieved / (scale_max as f64 * weight_sum))
}

/// Points one criterion contributes, `(score / scale_max) × weight`, rounded
/// to 2 decimals.
pub fn contribution(score: u32, weight: f64, scale_max: u32) -> f64 {
    if scale_max == 0 {
        return 0.0;
    }
    round2(score as f64 / scale_max as f64 * weight)
}

/// Outcome of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Aprobado,
    AprobadoConObservaciones,
    NoAprobado,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Aprobado => "APROBADO",
            Decision::AprobadoConObservaciones => "APROBADO CON OBSERVACIONES",
            Decision::NoAprobado => "NO APROBADO",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Map a percentage to a decision; both thresholds are inclusive lower bounds.
pub fn decide(percentage: f64, thresholds: &Thresholds) -> Decision {
    if percentage >= thresholds.aprobado {
        Decision::Aprobado
    } else if percentage >= thresholds.aprobado_obs {
        Decision::AprobadoConObservaciones
    } else {
        Decision::NoAprobado
    }
}

/// Percentage and decision for one score set. Recomputed on demand, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub percentage: f64,
    pub decision: Decision,
}

impl Evaluation {
    pub fn compute(scores: &ScoreSet, rubric: &RubricConfig) -> Self {
        let percentage = weighted_percentage(scores, &rubric.weights, rubric.scale.max);
        let decision = decide(percentage, &rubric.thresholds);
        debug!("Evaluation: {:.2}% -> {}", percentage, decision);
        Self {
            percentage,
            decision,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} — Cumplimiento {:.2}%", self.decision, self.percentage)
    }
}
