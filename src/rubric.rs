//! Rubric configuration
//!
//! The rubric is parsed once (from YAML), validated eagerly and then only
//! ever read. Components receive it by reference.

use crate::{GraderError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Rubric shipped with the crate.
const BUILTIN_RUBRIC: &str = include_str!("../rubric_final.yaml");

/// Default ceiling for one evidence paragraph, well under the ~32k limit
/// word processors enforce per paragraph.
pub const DEFAULT_MAX_PARAGRAPH_CHARS: usize = 3000;

/// One rubric dimension: stable key plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub key: String,
    pub name: String,
}

impl Criterion {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// The eleven criteria used for final reports.
pub fn default_criteria() -> Vec<Criterion> {
    [
        ("identificacion", "Identificación y datos generales"),
        ("objetivos", "Cumplimiento de los objetivos"),
        ("metodologia", "Metodología aplicada"),
        ("resultados", "Resultados obtenidos"),
        ("formacion", "Formación de recursos humanos"),
        ("difusion", "Acciones de difusión científica"),
        ("transferencia", "Acciones de transferencia y vinculación"),
        ("equipo", "Desempeño del equipo"),
        ("gestion_recursos", "Gestión de recursos"),
        ("calidad_formal", "Calidad formal del informe"),
        ("impacto", "Impacto y conclusiones"),
    ]
    .into_iter()
    .map(|(key, name)| Criterion::new(key, name))
    .collect()
}

/// Criteria for a rubric that only lists weights.
///
/// Known keys keep the built-in order and names; other keys follow in key
/// order, named after themselves.
fn criteria_for_weights(weights: &BTreeMap<String, f64>) -> Vec<Criterion> {
    let mut criteria: Vec<Criterion> = default_criteria()
        .into_iter()
        .filter(|c| weights.contains_key(&c.key))
        .collect();
    let extra: Vec<Criterion> = weights
        .keys()
        .filter(|key| !criteria.iter().any(|c| &c.key == *key))
        .map(|key| Criterion::new(key.clone(), key.clone()))
        .collect();
    criteria.extend(extra);
    criteria
}

/// Inclusive score bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub min: u32,
    pub max: u32,
}

impl Default for Scale {
    fn default() -> Self {
        Self { min: 0, max: 4 }
    }
}

impl Scale {
    pub fn contains(&self, score: u32) -> bool {
        (self.min..=self.max).contains(&score)
    }

    pub fn clamp(&self, score: u32) -> u32 {
        score.clamp(self.min, self.max)
    }
}

/// Approval thresholds, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub aprobado: f64,
    pub aprobado_obs: f64,
}

/// How the automatic suggestion turns keyword hits into a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Fraction of the keyword list found, banded into the scale.
    #[default]
    RatioBanded,
    /// Raw number of keywords found, saturating at the scale maximum.
    HitCountCapped,
}

/// Settings for the evidence excerpt embedded in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Phrases marking the start of the final report proper
    pub header_phrases: Vec<String>,
    /// Section titles where the excerpt may stop
    pub terminal_markers: Vec<String>,
    /// Stop at the first terminal marker after the header
    pub cut_at_terminal: bool,
    /// Maximum characters per evidence paragraph
    pub max_paragraph_chars: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            header_phrases: vec![
                "informe final".to_string(),
                "informe de finalización".to_string(),
                "informe técnico final".to_string(),
            ],
            terminal_markers: vec!["conclusiones".to_string(), "anexos".to_string()],
            cut_at_terminal: false,
            max_paragraph_chars: DEFAULT_MAX_PARAGRAPH_CHARS,
        }
    }
}

/// Immutable scoring rubric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricConfig {
    /// Ordered criteria shown in reports, derived from `weights` when omitted
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    /// Criterion key -> weight in percentage points
    pub weights: BTreeMap<String, f64>,
    /// Criterion key -> keywords searched by the automatic scorer
    #[serde(default)]
    pub keywords: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub scale: Scale,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub scoring_policy: ScoringPolicy,
    #[serde(default)]
    pub evidence: EvidenceConfig,
}

impl RubricConfig {
    /// Build a rubric from parts and validate it.
    pub fn new(
        weights: BTreeMap<String, f64>,
        keywords: BTreeMap<String, Vec<String>>,
        scale: Scale,
        thresholds: Thresholds,
    ) -> Result<Self> {
        let criteria = criteria_for_weights(&weights);
        let rubric = Self {
            criteria,
            weights,
            keywords,
            scale,
            thresholds,
            scoring_policy: ScoringPolicy::default(),
            evidence: EvidenceConfig::default(),
        };
        rubric.validate()?;
        Ok(rubric)
    }

    /// The rubric embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_RUBRIC)
    }

    /// Parse and validate a YAML rubric.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut rubric: RubricConfig = serde_yaml::from_str(yaml)?;
        if rubric.criteria.is_empty() {
            rubric.criteria = criteria_for_weights(&rubric.weights);
        }
        rubric.validate()?;
        debug!(
            "Loaded rubric with {} criteria, scale {}..={}",
            rubric.criteria.len(),
            rubric.scale.min,
            rubric.scale.max
        );
        Ok(rubric)
    }

    /// Read, parse and validate a YAML rubric file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Replace the scoring policy.
    pub fn with_scoring_policy(mut self, policy: ScoringPolicy) -> Self {
        self.scoring_policy = policy;
        self
    }

    /// Weight of a criterion; unknown keys weigh 0.
    pub fn weight(&self, key: &str) -> f64 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    /// Keywords of a criterion; unknown keys have none.
    pub fn keywords(&self, key: &str) -> &[String] {
        self.keywords.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Display name for a key, falling back to the key itself.
    pub fn criterion_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.criteria
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.name.as_str())
            .unwrap_or(key)
    }

    pub fn has_criterion(&self, key: &str) -> bool {
        self.criteria.iter().any(|c| c.key == key)
    }

    fn validate(&self) -> Result<()> {
        let invalid = self
            .weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0);
        if let Some((key, w)) = invalid {
            return Err(GraderError::Configuration(format!(
                "weight for '{}' must be a non-negative number, got {}",
                key, w
            )));
        }
        let sum = self.weight_sum();
        if sum <= 0.0 {
            return Err(GraderError::Configuration(
                "rubric weights sum to zero".to_string(),
            ));
        }
        if self.scale.min >= self.scale.max {
            return Err(GraderError::Configuration(format!(
                "scale minimum {} must be below maximum {}",
                self.scale.min, self.scale.max
            )));
        }
        if self.thresholds.aprobado_obs > self.thresholds.aprobado {
            return Err(GraderError::Configuration(format!(
                "threshold aprobado_obs ({}) exceeds aprobado ({})",
                self.thresholds.aprobado_obs, self.thresholds.aprobado
            )));
        }
        if self.evidence.max_paragraph_chars == 0 {
            return Err(GraderError::Configuration(
                "evidence.max_paragraph_chars must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for criterion in &self.criteria {
            if !seen.insert(criterion.key.as_str()) {
                return Err(GraderError::Configuration(format!(
                    "duplicate criterion key '{}'",
                    criterion.key
                )));
            }
            if !self.weights.contains_key(&criterion.key) {
                warn!("Criterion '{}' has no weight, counting as 0", criterion.key);
            }
        }
        if let Some(key) = self.weights.keys().find(|key| !seen.contains(key.as_str())) {
            return Err(GraderError::Configuration(format!(
                "weight '{}' does not belong to any criterion",
                key
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
weights: { a: 50, b: 50 }
thresholds: { aprobado: 80, aprobado_obs: 60 }
";

    #[test]
    fn test_builtin_rubric_is_valid() {
        let rubric = RubricConfig::builtin().unwrap();
        assert_eq!(rubric.criteria.len(), 11);
        assert!((rubric.weight_sum() - 100.0).abs() < 1e-9);
        for criterion in &rubric.criteria {
            assert!(rubric.weights.contains_key(&criterion.key), "{}", criterion.key);
            assert!(!rubric.keywords(&criterion.key).is_empty());
        }
        assert_eq!(rubric.scoring_policy, ScoringPolicy::RatioBanded);
        assert!(!rubric.evidence.cut_at_terminal);
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let rubric = RubricConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(rubric.scale, Scale { min: 0, max: 4 });
        assert!(rubric.keywords("a").is_empty());
        assert_eq!(rubric.weight("missing"), 0.0);
        assert_eq!(
            rubric.criteria,
            vec![Criterion::new("a", "a"), Criterion::new("b", "b")]
        );
        assert_eq!(
            rubric.evidence.max_paragraph_chars,
            DEFAULT_MAX_PARAGRAPH_CHARS
        );
    }

    #[test]
    fn test_zero_weight_sum_rejected() {
        let yaml = "
weights: { a: 0, b: 0 }
thresholds: { aprobado: 80, aprobado_obs: 60 }
";
        let err = RubricConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, GraderError::Configuration(_)));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let yaml = "
weights: { a: 50 }
thresholds: { aprobado: 60, aprobado_obs: 80 }
";
        let err = RubricConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("aprobado_obs"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let yaml = "
weights: { a: 120, b: -20 }
thresholds: { aprobado: 80, aprobado_obs: 60 }
";
        assert!(RubricConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_degenerate_scale_rejected() {
        let yaml = "
weights: { a: 50 }
scale: { min: 4, max: 4 }
thresholds: { aprobado: 80, aprobado_obs: 60 }
";
        assert!(RubricConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_duplicate_criteria_rejected() {
        let yaml = "
criteria:
  - { key: a, name: A }
  - { key: a, name: Again }
weights: { a: 50 }
thresholds: { aprobado: 80, aprobado_obs: 60 }
";
        assert!(RubricConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_builtin_keeps_canonical_criteria_order() {
        let rubric = RubricConfig::builtin().unwrap();
        assert_eq!(rubric.criteria, default_criteria());
    }

    #[test]
    fn test_known_and_custom_weight_keys_become_criteria() {
        let yaml = "
weights: { zeta: 40, equipo: 30, identificacion: 30 }
thresholds: { aprobado: 80, aprobado_obs: 60 }
";
        let rubric = RubricConfig::from_yaml_str(yaml).unwrap();
        let keys: Vec<&str> = rubric.criteria.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["identificacion", "equipo", "zeta"]);
        assert_eq!(rubric.criterion_name("equipo"), "Desempeño del equipo");
        assert_eq!(rubric.criterion_name("zeta"), "zeta");
    }

    #[test]
    fn test_weight_outside_criteria_rejected() {
        let yaml = "
criteria:
  - { key: a, name: A }
weights: { a: 50, b: 50 }
thresholds: { aprobado: 80, aprobado_obs: 60 }
";
        let err = RubricConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, GraderError::Configuration(ref msg) if msg.contains("'b'")));
    }

    #[test]
    fn test_malformed_yaml_is_configuration_error() {
        let err = RubricConfig::from_yaml_str("weights: [").unwrap_err();
        assert!(matches!(err, GraderError::Configuration(_)));
    }

    #[test]
    fn test_yaml_round_trip() {
        let rubric = RubricConfig::builtin().unwrap();
        let yaml = rubric.to_yaml().unwrap();
        assert_eq!(RubricConfig::from_yaml_str(&yaml).unwrap(), rubric);
    }

    #[test]
    fn test_criterion_name_fallback() {
        let rubric = RubricConfig::builtin().unwrap();
        assert_eq!(rubric.criterion_name("equipo"), "Desempeño del equipo");
        assert_eq!(rubric.criterion_name("otro"), "otro");
    }
}
