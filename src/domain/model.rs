use crate::utils::error::VessError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qe-VESS structural quality score: 1 to 5 in half steps.
///
/// Stored as the doubled value so only the nine scale points are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct VessScore(u8);

impl VessScore {
    pub const MIN: VessScore = VessScore(2);
    pub const MAX: VessScore = VessScore(10);

    /// Every point of the scale, ascending.
    pub fn scale() -> impl Iterator<Item = VessScore> {
        (Self::MIN.0..=Self::MAX.0).map(VessScore)
    }

    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl Default for VessScore {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<f64> for VessScore {
    type Error = VessError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let doubled = value * 2.0;
        let in_scale = doubled.is_finite()
            && doubled.fract() == 0.0
            && doubled >= f64::from(Self::MIN.0)
            && doubled <= f64::from(Self::MAX.0);
        if !in_scale {
            return Err(VessError::validation(
                "score",
                format!("{} is not on the 1-5 half-step scale", value),
            ));
        }
        Ok(VessScore(doubled as u8))
    }
}

impl From<VessScore> for f64 {
    fn from(score: VessScore) -> Self {
        score.value()
    }
}

impl fmt::Display for VessScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Thickness in centimetres.
    pub length: f64,
    pub score: VessScore,
    /// 1-based position inside the sample; 0 when the server omitted it.
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub layers: Vec<Layer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_decision: Option<String>,
    /// Opaque media references, passed through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    #[serde(default)]
    pub sample_score: f64,
}

/// Payload sent on create: an evaluation that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationData {
    pub name: String,
    pub date: String,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_description: Option<String>,
    pub samples: Vec<Sample>,
    pub average_score: f64,
}

/// Partial update; only the populated fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<Sample>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub id: String,
    pub name: String,
    pub evaluator: String,
    pub date: String,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub samples: Vec<Sample>,
    pub average_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// One page of evaluations as reported by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationPage {
    pub evaluations: Vec<EvaluationRecord>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationState {
    pub fn derive(current_page: u32, total_pages: u32, total_items: u64) -> Self {
        Self {
            current_page,
            total_pages,
            total_items,
            has_next_page: current_page < total_pages,
            has_previous_page: current_page > 1,
        }
    }
}

impl From<&EvaluationPage> for PaginationState {
    fn from(page: &EvaluationPage) -> Self {
        Self::derive(page.current_page, page.total_pages, page.total_items)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationStats {
    pub total_evaluations: u64,
    pub total_samples: u64,
    pub average_score: f64,
    pub score_distribution: ScoreDistribution,
    pub recent_activity: RecentActivity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub excellent: u64,
    pub reasonable: u64,
    pub poor: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    #[serde(default)]
    pub last_evaluation: Option<String>,
    pub evaluations_this_month: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub message: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_scale_accepts_half_steps_only() {
        let values: Vec<f64> = VessScore::scale().map(f64::from).collect();
        assert_eq!(values, vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0]);

        assert!(VessScore::try_from(3.5).is_ok());
        assert!(VessScore::try_from(0.5).is_err());
        assert!(VessScore::try_from(5.5).is_err());
        assert!(VessScore::try_from(2.25).is_err());
        assert!(VessScore::try_from(f64::NAN).is_err());
    }

    #[test]
    fn test_score_serializes_as_number() {
        let layer = Layer {
            length: 12.5,
            score: VessScore::try_from(2.5).unwrap(),
            order: 1,
        };
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json, serde_json::json!({"length": 12.5, "score": 2.5, "order": 1}));

        let bad = serde_json::from_value::<Layer>(serde_json::json!({"length": 1, "score": 7}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_pagination_flags() {
        let first = PaginationState::derive(1, 3, 25);
        assert!(first.has_next_page);
        assert!(!first.has_previous_page);

        let last = PaginationState::derive(3, 3, 25);
        assert!(!last.has_next_page);
        assert!(last.has_previous_page);
    }

    #[test]
    fn test_patch_omits_unset_fields() {
        let patch = EvaluationPatch {
            name: Some("Talhão 2".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"name": "Talhão 2"})
        );
    }
}
