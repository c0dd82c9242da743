//! Qe-VESS score aggregation.
//!
//! A sample score is the thickness-weighted mean of its layer scores; an
//! evaluation score is the plain mean of its sample scores. Both are rounded
//! to one decimal. `0.0` means "nothing measured yet" and is never a valid
//! quality score.

use crate::domain::model::{Layer, Sample};
use serde::Serialize;
use std::fmt;

/// Round half away from zero to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn compute_sample_score(layers: &[Layer]) -> f64 {
    let total_length: f64 = layers.iter().map(|layer| layer.length).sum();
    if total_length == 0.0 {
        return 0.0;
    }

    let weighted: f64 = layers
        .iter()
        .map(|layer| layer.score.value() * layer.length)
        .sum();
    round_one_decimal(weighted / total_length)
}

/// Mean of the sample scores, each recomputed from its layers.
pub fn compute_evaluation_average(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let total: f64 = samples
        .iter()
        .map(|sample| compute_sample_score(&sample.layers))
        .sum();
    round_one_decimal(total / samples.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagementClass {
    Good,
    Reasonable,
    Poor,
    None,
}

impl ManagementClass {
    pub fn advisory(self) -> Option<&'static str> {
        match self {
            ManagementClass::Good => Some(
                "Amostras com escores Qe-VESS de 1-2,9 indicam um solo com boa qualidade \
                 estrutural e não requerem mudanças no manejo.",
            ),
            ManagementClass::Reasonable => Some(
                "Amostras com escores Qe-VESS de 3-3,9 indicam um solo com qualidade \
                 estrutural razoável que pode ser melhorado. Para maximizar a exploração do \
                 solo pelas raízes das culturas, as mudanças no manejo devem ser a longo prazo.",
            ),
            ManagementClass::Poor => Some(
                "Amostras com escores Qe-VESS de 4-5 sugerem danos às funções do solo, \
                 comprometendo sua capacidade de suporte ao crescimento das culturas. \
                 Mudança de manejo deve ser a curto prazo.",
            ),
            ManagementClass::None => None,
        }
    }
}

impl fmt::Display for ManagementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ManagementClass::Good => "good",
            ManagementClass::Reasonable => "reasonable",
            ManagementClass::Poor => "poor",
            ManagementClass::None => "none",
        };
        f.write_str(label)
    }
}

pub fn classify_management(score: f64) -> ManagementClass {
    if (1.0..3.0).contains(&score) {
        ManagementClass::Good
    } else if (3.0..4.0).contains(&score) {
        ManagementClass::Reasonable
    } else if score >= 4.0 {
        ManagementClass::Poor
    } else {
        ManagementClass::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreDescriptor {
    pub title: &'static str,
    pub characteristic: &'static str,
}

static DESCRIPTORS: [ScoreDescriptor; 5] = [
    ScoreDescriptor {
        title: "Qualidade estrutural (Qe) 1 Friável",
        characteristic: "Agregados pequenos",
    },
    ScoreDescriptor {
        title: "Qualidade estrutural (Qe) 2 Intacto",
        characteristic: "Agregados altamente porosos",
    },
    ScoreDescriptor {
        title: "Qualidade estrutural (Qe) 3 Firme",
        characteristic: "Agregados com baixa porosidade",
    },
    ScoreDescriptor {
        title: "Qualidade estrutural (Qe) 4 Compacto",
        characteristic: "Macroporos bem distintos",
    },
    ScoreDescriptor {
        title: "Qualidade estrutural (Qe) 5 Muito compacto",
        characteristic: "Cor azul acinzentada",
    },
];

/// Reference description for whole scores 1-5; half steps have none.
pub fn score_descriptor(score: f64) -> Option<&'static ScoreDescriptor> {
    if score.fract() != 0.0 || !(1.0..=5.0).contains(&score) {
        return None;
    }
    DESCRIPTORS.get(score as usize - 1)
}
