use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::models::Recommendation;

/// How far the weights may drift from 1.0 and still count as summing to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

pub const STRONG_MATCH_THRESHOLD: f64 = 0.80;
pub const GOOD_MATCH_THRESHOLD: f64 = 0.60;
pub const WEAK_MATCH_THRESHOLD: f64 = 0.40;

/// Absorbs float noise so a score that is a threshold in decimal lands in the higher bucket.
const BOUNDARY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skills_weight: f64,
    pub experience_weight: f64,
    pub culture_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skills_weight: 0.4,
            experience_weight: 0.4,
            culture_weight: 0.2,
        }
    }
}

impl ScoringWeights {
    pub fn new(skills_weight: f64, experience_weight: f64, culture_weight: f64) -> Result<Self, ConfigError> {
        let weights = Self {
            skills_weight,
            experience_weight,
            culture_weight,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn sum(&self) -> f64 {
        self.skills_weight + self.experience_weight + self.culture_weight
    }

    /// Each weight must be finite and non-negative, and together they must sum to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("skills_weight", self.skills_weight),
            ("experience_weight", self.experience_weight),
            ("culture_weight", self.culture_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }
        Ok(())
    }
}

/// The three per-dimension scores the final scorer combines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentScores {
    pub skills: f64,
    pub experience: f64,
    pub culture: f64,
}

/// Weighted overall score: w_s*skills + w_e*experience + w_c*culture.
pub fn compute_overall_score(scores: &ComponentScores, weights: &ScoringWeights) -> Result<f64, ConfigError> {
    weights.validate()?;
    Ok((weights.skills_weight * scores.skills
        + weights.experience_weight * scores.experience
        + weights.culture_weight * scores.culture)
        .clamp(0.0, 1.0))
}

/// Maps an overall score to its bucket. Boundaries belong to the higher bucket.
pub fn recommend(overall: f64) -> Recommendation {
    if overall + BOUNDARY_EPSILON >= STRONG_MATCH_THRESHOLD {
        Recommendation::StrongMatch
    } else if overall + BOUNDARY_EPSILON >= GOOD_MATCH_THRESHOLD {
        Recommendation::GoodMatch
    } else if overall + BOUNDARY_EPSILON >= WEAK_MATCH_THRESHOLD {
        Recommendation::WeakMatch
    } else {
        Recommendation::NoMatch
    }
}

/// Score range covered by a bucket, as `(low, high)`.
pub fn bucket_range(recommendation: Recommendation) -> (f64, f64) {
    match recommendation {
        Recommendation::StrongMatch => (STRONG_MATCH_THRESHOLD, 1.0),
        Recommendation::GoodMatch => (GOOD_MATCH_THRESHOLD, STRONG_MATCH_THRESHOLD),
        Recommendation::WeakMatch => (WEAK_MATCH_THRESHOLD, GOOD_MATCH_THRESHOLD),
        Recommendation::NoMatch => (0.0, WEAK_MATCH_THRESHOLD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(skills: f64, experience: f64, culture: f64) -> ComponentScores {
        ComponentScores {
            skills,
            experience,
            culture,
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = ScoringWeights::default();
        assert!((w.sum() - 1.0).abs() < 1e-6);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_documented_scenario_is_good_match() {
        let overall = compute_overall_score(&scores(0.785, 0.750, 0.800), &ScoringWeights::default()).unwrap();
        assert!((overall - 0.774).abs() < 1e-9);
        assert_eq!(recommend(overall), Recommendation::GoodMatch);
    }

    #[test]
    fn test_overall_is_exact_weighted_sum() {
        let weights = ScoringWeights::new(0.5, 0.3, 0.2).unwrap();
        for (s, e, c) in [(0.0, 0.0, 0.0), (1.0, 1.0, 1.0), (0.9, 0.1, 0.5), (0.33, 0.66, 0.99)] {
            let expected = 0.5 * s + 0.3 * e + 0.2 * c;
            let overall = compute_overall_score(&scores(s, e, c), &weights).unwrap();
            assert!((overall - expected).abs() < 1e-12, "{s} {e} {c}");
        }
    }

    #[test]
    fn test_weights_not_summing_to_one_rejected() {
        let err = ScoringWeights::new(0.5, 0.5, 0.5).unwrap_err();
        assert!(matches!(err, ConfigError::WeightsDoNotSumToOne { sum } if (sum - 1.5).abs() < 1e-9));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = ScoringWeights::new(1.2, -0.2, 0.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeight { name: "experience_weight", .. }));
    }

    #[test]
    fn test_compute_rechecks_weights() {
        let bad = ScoringWeights {
            skills_weight: 0.9,
            experience_weight: 0.9,
            culture_weight: 0.9,
        };
        assert!(compute_overall_score(&scores(0.5, 0.5, 0.5), &bad).is_err());
    }

    #[test]
    fn test_weight_sum_within_tolerance_accepted() {
        assert!(ScoringWeights::new(0.3333333, 0.3333333, 0.3333334).is_ok());
    }

    #[test]
    fn test_boundaries_land_in_higher_bucket() {
        assert_eq!(recommend(0.80), Recommendation::StrongMatch);
        assert_eq!(recommend(0.60), Recommendation::GoodMatch);
        assert_eq!(recommend(0.40), Recommendation::WeakMatch);
        assert_eq!(recommend(0.3999), Recommendation::NoMatch);
        assert_eq!(recommend(0.7999), Recommendation::GoodMatch);
        assert_eq!(recommend(1.0), Recommendation::StrongMatch);
        assert_eq!(recommend(0.0), Recommendation::NoMatch);
    }

    #[test]
    fn test_float_noise_at_threshold_is_absorbed() {
        // 0.4*0.8 + 0.4*0.8 + 0.2*0.8 evaluates to 0.8000000000000002 or 0.7999999999999999
        let overall = compute_overall_score(&scores(0.8, 0.8, 0.8), &ScoringWeights::default()).unwrap();
        assert_eq!(recommend(overall), Recommendation::StrongMatch);
        assert_eq!(recommend(0.8 - 1e-12), Recommendation::StrongMatch);
    }

    #[test]
    fn test_bucket_ranges_tile_the_unit_interval() {
        let mut edges: Vec<(f64, f64)> = Recommendation::ALL.iter().map(|r| bucket_range(*r)).collect();
        edges.reverse();
        assert_eq!(edges.first().unwrap().0, 0.0);
        assert_eq!(edges.last().unwrap().1, 1.0);
        for pair in edges.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }
}
