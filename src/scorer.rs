//! Automatic keyword scoring
//!
//! The suggestion is a crude presence test: a keyword counts once if it
//! occurs anywhere in the text, ignoring case. It is advisory only; the
//! operator can override every score before aggregation.

use crate::rubric::{RubricConfig, Scale, ScoringPolicy};
use crate::{GraderError, Result};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Where a score set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Automatic,
    Manual,
}

/// Per-criterion integer scores
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSet {
    source: ScoreSource,
    scores: BTreeMap<String, u32>,
}

impl ScoreSet {
    pub fn new(source: ScoreSource) -> Self {
        Self {
            source,
            scores: BTreeMap::new(),
        }
    }

    /// Build a set from key/score pairs without checking them against a rubric.
    pub fn from_pairs<K, I>(source: ScoreSource, pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, u32)>,
    {
        Self {
            source,
            scores: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn source(&self) -> ScoreSource {
        self.source
    }

    /// Score of a criterion; criteria never scored count as 0.
    pub fn get(&self, key: &str) -> u32 {
        self.scores.get(key).copied().unwrap_or(0)
    }

    pub fn insert(&mut self, key: impl Into<String>, score: u32) {
        self.scores.insert(key.into(), score);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.scores.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Copy this set as a manual one, replacing the given scores.
    ///
    /// Every override must name a known criterion and lie inside the scale.
    pub fn with_overrides<K: AsRef<str>>(
        &self,
        rubric: &RubricConfig,
        overrides: &[(K, u32)],
    ) -> Result<ScoreSet> {
        let mut adjusted = ScoreSet {
            source: ScoreSource::Manual,
            scores: self.scores.clone(),
        };
        for (key, score) in overrides {
            let key = key.as_ref();
            if !rubric.has_criterion(key) {
                return Err(GraderError::UnknownCriterion(key.to_string()));
            }
            if !rubric.scale.contains(*score) {
                return Err(GraderError::ScoreOutOfRange {
                    key: key.to_string(),
                    score: *score,
                    min: rubric.scale.min,
                    max: rubric.scale.max,
                });
            }
            adjusted.insert(key, *score);
        }
        Ok(adjusted)
    }
}

/// Score one criterion from raw text.
pub fn score_criterion(
    text: &str,
    keywords: &[String],
    scale_max: u32,
    policy: ScoringPolicy,
) -> u32 {
    score_lowered(&text.to_lowercase(), keywords, scale_max, policy)
}

/// Build the automatic score set for every criterion of the rubric.
pub fn auto_score(text: &str, rubric: &RubricConfig) -> ScoreSet {
    let lower = text.to_lowercase();
    let mut scores = ScoreSet::new(ScoreSource::Automatic);

    for criterion in &rubric.criteria {
        let keywords = rubric.keywords(&criterion.key);
        let raw = score_lowered(&lower, keywords, rubric.scale.max, rubric.scoring_policy);
        let score = rubric.scale.clamp(raw);
        debug!(
            "Criterion '{}': {} of {} keywords, score {}",
            criterion.key,
            count_hits(&lower, keywords),
            keywords.len(),
            score
        );
        scores.insert(criterion.key.clone(), score);
    }

    scores
}

/// Number of distinct keywords present in already lower-cased text.
///
/// Blank keywords would match everything and are ignored.
pub fn count_hits(lower_text: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && lower_text.contains(k.as_str()))
        .count()
}

fn score_lowered(
    lower_text: &str,
    keywords: &[String],
    scale_max: u32,
    policy: ScoringPolicy,
) -> u32 {
    let total = keywords.iter().filter(|k| !k.trim().is_empty()).count();
    if total == 0 {
        return 0;
    }
    let hits = count_hits(lower_text, keywords);
    match policy {
        ScoringPolicy::RatioBanded => ratio_band(hits, total, scale_max),
        ScoringPolicy::HitCountCapped => (hits as u32).min(scale_max),
    }
}

/// Map hits/total onto `scale_max` equal-width bands.
///
/// Any hit lifts the score to at least 1; on a 0..=4 scale the bands are
/// <25% → 1, <50% → 2, <75% → 3, otherwise 4.
fn ratio_band(hits: usize, total: usize, scale_max: u32) -> u32 {
    if hits == 0 || total == 0 {
        return 0;
    }
    let band = (hits * scale_max as usize) / total;
    (band as u32 + 1).min(scale_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::Thresholds;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn rubric() -> RubricConfig {
        let weights = BTreeMap::from([("x".to_string(), 60.0), ("y".to_string(), 40.0)]);
        let keywords = BTreeMap::from([("x".to_string(), kw(&["alpha", "beta"]))]);
        RubricConfig::new(
            weights,
            keywords,
            Scale { min: 0, max: 4 },
            Thresholds {
                aprobado: 80.0,
                aprobado_obs: 60.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_ratio_bands_on_four_point_scale() {
        assert_eq!(ratio_band(0, 8, 4), 0);
        assert_eq!(ratio_band(1, 8, 4), 1);
        assert_eq!(ratio_band(2, 8, 4), 2);
        assert_eq!(ratio_band(3, 8, 4), 2);
        assert_eq!(ratio_band(4, 8, 4), 3);
        assert_eq!(ratio_band(5, 8, 4), 3);
        assert_eq!(ratio_band(6, 8, 4), 4);
        assert_eq!(ratio_band(8, 8, 4), 4);
        assert_eq!(ratio_band(1, 10, 4), 1);
    }

    #[test]
    fn test_one_of_two_keywords() {
        let keywords = kw(&["alpha", "beta"]);
        let text = "The ALPHA phase is done.";
        assert_eq!(
            score_criterion(text, &keywords, 4, ScoringPolicy::RatioBanded),
            3
        );
        assert_eq!(
            score_criterion(text, &keywords, 4, ScoringPolicy::HitCountCapped),
            1
        );
    }

    #[test]
    fn test_hit_count_saturates() {
        let keywords = kw(&["a1", "a2", "a3", "a4", "a5", "a6"]);
        let text = "a1 a2 a3 a4 a5 a6";
        assert_eq!(
            score_criterion(text, &keywords, 4, ScoringPolicy::HitCountCapped),
            4
        );
    }

    #[test]
    fn test_empty_keyword_list_scores_zero() {
        for policy in [ScoringPolicy::RatioBanded, ScoringPolicy::HitCountCapped] {
            assert_eq!(score_criterion("anything", &[], 4, policy), 0);
            assert_eq!(score_criterion("anything", &kw(&["  "]), 4, policy), 0);
        }
    }

    #[test]
    fn test_accented_keywords_match_case_insensitively() {
        let keywords = kw(&["Metodología"]);
        let text = "METODOLOGÍA APLICADA";
        assert_eq!(
            score_criterion(text, &keywords, 4, ScoringPolicy::RatioBanded),
            4
        );
    }

    #[test]
    fn test_auto_score_covers_every_criterion() {
        let rubric = rubric();
        let scores = auto_score("alpha only", &rubric);
        assert_eq!(scores.source(), ScoreSource::Automatic);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get("x"), 3);
        assert_eq!(scores.get("y"), 0);
    }

    #[test]
    fn test_overrides_produce_manual_set() {
        let rubric = rubric();
        let auto = auto_score("alpha", &rubric);
        let manual = auto.with_overrides(&rubric, &[("y", 2)]).unwrap();
        assert_eq!(manual.source(), ScoreSource::Manual);
        assert_eq!(manual.get("x"), 3);
        assert_eq!(manual.get("y"), 2);
        assert_eq!(auto.get("y"), 0);
    }

    #[test]
    fn test_override_validation() {
        let rubric = rubric();
        let auto = auto_score("", &rubric);
        assert!(matches!(
            auto.with_overrides(&rubric, &[("y", 5)]),
            Err(GraderError::ScoreOutOfRange { score: 5, .. })
        ));
        assert!(matches!(
            auto.with_overrides(&rubric, &[("z", 1)]),
            Err(GraderError::UnknownCriterion(_))
        ));
    }
}
