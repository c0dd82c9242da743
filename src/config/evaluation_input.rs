//! TOML description of a field visit, replayed through an [`EvaluationWorkflow`].
//!
//! ```toml
//! name = "Talhão 3"
//!
//! [[samples]]
//! location = "-23.55, -46.63"
//! layers = [{ length = 12, score = 2 }, { length = 8, score = 3.5 }]
//! ```

use crate::core::workflow::{Action, EvaluationWorkflow};
use crate::domain::ports::Clock;
use crate::utils::error::{Result, VessError};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvaluationInput {
    pub name: String,
    pub management_description: Option<String>,
    #[serde(default)]
    pub samples: Vec<SampleInput>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SampleInput {
    pub name: Option<String>,
    pub location: Option<String>,
    pub layers: Vec<LayerEntry>,
    pub other_info: Option<String>,
    pub management_decision: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LayerEntry {
    pub length: f64,
    pub score: f64,
}

impl EvaluationInput {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VessError::ConfigError {
            message: format!("evaluation input: {}", e),
        })
    }

    /// Enters every sample and finalizes. The returned workflow is in the
    /// final step, ready to submit.
    pub fn drive(&self, clock: Arc<dyn Clock>) -> Result<EvaluationWorkflow> {
        if self.samples.is_empty() {
            return Err(VessError::validation(
                "samples",
                "an evaluation needs at least one sample",
            ));
        }

        let mut workflow = EvaluationWorkflow::new(&self.name, clock);
        if let Some(description) = &self.management_description {
            workflow.set_management_description(description);
        }

        for (index, sample) in self.samples.iter().enumerate() {
            if index > 0 {
                workflow.dispatch(Action::NextSample)?;
            }
            if let Some(name) = &sample.name {
                workflow.set_sample_name(name);
            }
            if let Some(location) = &sample.location {
                workflow.set_location(location);
            }
            workflow.set_layer_count(sample.layers.len())?;
            workflow.dispatch(Action::Continue)?;

            for (layer_index, layer) in sample.layers.iter().enumerate() {
                workflow.set_layer(layer_index, layer.length, layer.score)?;
            }
            if let Some(info) = &sample.other_info {
                workflow.set_other_info(info);
            }
            for photo in &sample.photos {
                workflow.add_photo(photo);
            }
            workflow.dispatch(Action::Evaluate)?;

            if let Some(decision) = &sample.management_decision {
                workflow.set_management_decision(decision);
            }
            tracing::debug!(
                "Sample '{}' scored {}",
                workflow.draft().name,
                workflow.current_score()
            );
        }

        workflow.dispatch(Action::Finalize)?;
        Ok(workflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::core::workflow::Step;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::parse("2024-03-15 08:30").unwrap())
    }

    #[test]
    fn test_drive_two_samples() {
        let input = EvaluationInput::from_toml_str(
            r#"
name = "Talhão 3"
management_description = "Rotação com braquiária"

[[samples]]
location = "-23.55, -46.63"
layers = [{ length = 10, score = 2 }, { length = 10, score = 4 }]
management_decision = "manter"

[[samples]]
name = "Cabeceira"
layers = [{ length = 25, score = 4.5 }]
photos = ["img-001.jpg"]
"#,
        )
        .unwrap();

        let workflow = input.drive(clock()).unwrap();

        assert_eq!(workflow.step(), Step::Final);
        let payload = &workflow.submission().unwrap().payload;
        assert_eq!(payload.name, "Talhão 3");
        assert_eq!(payload.samples.len(), 2);
        assert_eq!(payload.samples[0].name, "Amostra 1");
        assert_eq!(payload.samples[0].sample_score, 3.0);
        assert_eq!(payload.samples[0].management_decision.as_deref(), Some("manter"));
        assert_eq!(payload.samples[1].name, "Cabeceira");
        assert_eq!(payload.samples[1].location.as_deref(), Some("-23.55, -46.63"));
        assert_eq!(payload.samples[1].photos, vec!["img-001.jpg".to_string()]);
        // (3.0 + 4.5) / 2
        assert_eq!(payload.average_score, 3.8);
        assert_eq!(
            payload.management_description.as_deref(),
            Some("Rotação com braquiária")
        );
    }

    #[test]
    fn test_drive_reports_invalid_layer() {
        let input = EvaluationInput::from_toml_str(
            r#"
name = "Talhão 3"

[[samples]]
layers = [{ length = -2, score = 2 }]
"#,
        )
        .unwrap();

        let err = input.drive(clock()).unwrap_err();
        assert!(matches!(err, VessError::ValidationError { .. }));
    }

    #[test]
    fn test_drive_requires_samples() {
        let input = EvaluationInput::from_toml_str(r#"name = "Vazio""#).unwrap();
        assert!(input.drive(clock()).is_err());
    }
}
