//! Data entry for one field evaluation.
//!
//! A workflow walks each sample through `setup -> layers -> result`, keeps the
//! validated samples in entry order and, on finalize, freezes everything into
//! an [`EvaluationData`] payload that survives failed submissions.

use crate::core::scoring::{
    classify_management, compute_evaluation_average, compute_sample_score, ManagementClass,
};
use crate::core::store::EvaluationStore;
use crate::domain::model::{EvaluationData, EvaluationRecord, Layer, Sample, VessScore};
use crate::domain::ports::{Clock, EvaluationGateway};
use crate::utils::error::{Result, VessError};
use chrono::{Duration, NaiveTime};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub const MAX_LAYERS: usize = 5;
pub const SAMPLE_NAME_PREFIX: &str = "Amostra";
pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Setup,
    Layers,
    Result,
    Final,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Setup => "setup",
            Step::Layers => "layers",
            Step::Result => "result",
            Step::Final => "final",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Continue,
    Back,
    Evaluate,
    NextSample,
    Finalize,
    Submit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Continue => "continue",
            Action::Back => "go back",
            Action::Evaluate => "evaluate",
            Action::NextSample => "start the next sample",
            Action::Finalize => "finalize",
            Action::Submit => "submit",
        };
        f.write_str(name)
    }
}

impl Step {
    /// The step table. Side effects of an accepted action are applied by
    /// [`EvaluationWorkflow::dispatch`].
    pub fn transition(self, action: Action) -> Result<Step> {
        match (self, action) {
            (Step::Setup, Action::Continue) => Ok(Step::Layers),
            (Step::Layers, Action::Back) => Ok(Step::Setup),
            (Step::Layers, Action::Evaluate) => Ok(Step::Result),
            (Step::Layers | Step::Result, Action::NextSample) => Ok(Step::Setup),
            (Step::Result, Action::Back) => Ok(Step::Layers),
            (Step::Result, Action::Finalize) => Ok(Step::Final),
            (Step::Final, Action::Back) => Ok(Step::Result),
            (Step::Final, Action::Submit) => Ok(Step::Final),
            (from, action) => Err(VessError::InvalidTransition { from, action }),
        }
    }
}

/// Raw layer entry as typed by the technician.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerInput {
    pub length: f64,
    pub score: f64,
}

impl Default for LayerInput {
    fn default() -> Self {
        Self {
            length: 0.0,
            score: VessScore::MIN.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleDraft {
    pub name: String,
    pub location: String,
    pub layers: Vec<LayerInput>,
    pub other_info: String,
    pub management_decision: String,
    pub photos: Vec<String>,
}

impl SampleDraft {
    fn numbered(number: usize, location: String) -> Self {
        Self {
            name: format!("{} {}", SAMPLE_NAME_PREFIX, number),
            location,
            layers: vec![LayerInput::default()],
            other_info: String::new(),
            management_decision: String::new(),
            photos: Vec::new(),
        }
    }

    fn freeze(&self) -> Result<Sample> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(VessError::validation("name", "sample name cannot be empty"));
        }
        if self.layers.is_empty() {
            return Err(VessError::validation("layers", "at least one layer is required"));
        }

        let mut layers = Vec::with_capacity(self.layers.len());
        for (index, input) in self.layers.iter().enumerate() {
            let order = index as u32 + 1;
            if !input.length.is_finite() || input.length <= 0.0 {
                return Err(VessError::validation(
                    format!("layers[{}].length", order),
                    "length must be greater than zero",
                ));
            }
            let score = VessScore::try_from(input.score).map_err(|_| {
                VessError::validation(
                    format!("layers[{}].score", order),
                    format!("{} is not on the 1-5 half-step scale", input.score),
                )
            })?;
            layers.push(Layer {
                length: input.length,
                score,
                order,
            });
        }

        Ok(Sample {
            id: None,
            name: name.to_string(),
            location: non_empty(&self.location),
            sample_score: compute_sample_score(&layers),
            layers,
            other_info: non_empty(&self.other_info),
            management_decision: non_empty(&self.management_decision),
            photos: self.photos.clone(),
        })
    }

    /// Layers that already carry a usable length and an on-scale score.
    fn scorable_layers(&self) -> Vec<Layer> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, input)| input.length.is_finite() && input.length > 0.0)
            .filter_map(|(index, input)| {
                VessScore::try_from(input.score).ok().map(|score| Layer {
                    length: input.length,
                    score,
                    order: index as u32 + 1,
                })
            })
            .collect()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Frozen payload plus the outcome of the last submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub payload: EvaluationData,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum WorkflowState {
    Setup,
    Layers,
    Result,
    Final(Submission),
}

pub struct EvaluationWorkflow {
    evaluation_name: String,
    management_description: Option<String>,
    date: String,
    start_time: String,
    samples: Vec<Sample>,
    current_index: usize,
    draft: SampleDraft,
    state: WorkflowState,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for EvaluationWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationWorkflow")
            .field("evaluation_name", &self.evaluation_name)
            .field("step", &self.step())
            .field("current_index", &self.current_index)
            .field("samples", &self.samples.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct SubmitFailure {
    /// The workflow, still in the final step with the error attached.
    pub workflow: EvaluationWorkflow,
    #[source]
    pub error: VessError,
}

impl EvaluationWorkflow {
    /// Starts a visit now. The evaluator is not part of the payload; the
    /// server attributes the record to the authenticated user.
    pub fn new(evaluation_name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let started = clock.now();
        Self {
            evaluation_name: evaluation_name.into(),
            management_description: None,
            date: started.format(DATE_FORMAT).to_string(),
            start_time: started.format(TIME_FORMAT).to_string(),
            samples: Vec::new(),
            current_index: 0,
            draft: SampleDraft::numbered(1, String::new()),
            state: WorkflowState::Setup,
            clock,
        }
    }

    pub fn step(&self) -> Step {
        match self.state {
            WorkflowState::Setup => Step::Setup,
            WorkflowState::Layers => Step::Layers,
            WorkflowState::Result => Step::Result,
            WorkflowState::Final(_) => Step::Final,
        }
    }

    pub fn evaluation_name(&self) -> &str {
        &self.evaluation_name
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn draft(&self) -> &SampleDraft {
        &self.draft
    }

    pub fn submission(&self) -> Option<&Submission> {
        match &self.state {
            WorkflowState::Final(submission) => Some(submission),
            _ => None,
        }
    }

    pub fn set_evaluation_name(&mut self, name: impl Into<String>) {
        self.evaluation_name = name.into();
    }

    pub fn set_management_description(&mut self, description: impl Into<String>) {
        self.management_description = non_empty(&description.into());
    }

    pub fn set_sample_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.draft.location = location.into();
    }

    pub fn layer_count(&self) -> usize {
        self.draft.layers.len()
    }

    /// Changing the count discards the entered layers.
    pub fn set_layer_count(&mut self, count: usize) -> Result<()> {
        if !(1..=MAX_LAYERS).contains(&count) {
            return Err(VessError::validation(
                "layer_count",
                format!("between 1 and {} layers can be evaluated", MAX_LAYERS),
            ));
        }
        if count != self.draft.layers.len() {
            self.draft.layers = vec![LayerInput::default(); count];
        }
        Ok(())
    }

    pub fn set_layer(&mut self, index: usize, length: f64, score: f64) -> Result<()> {
        let count = self.draft.layers.len();
        let layer = self.draft.layers.get_mut(index).ok_or_else(|| {
            VessError::validation(
                "layer",
                format!("layer {} does not exist (sample has {})", index + 1, count),
            )
        })?;
        *layer = LayerInput { length, score };
        Ok(())
    }

    pub fn set_other_info(&mut self, info: impl Into<String>) {
        self.draft.other_info = info.into();
    }

    pub fn set_management_decision(&mut self, decision: impl Into<String>) {
        self.draft.management_decision = decision.into();
    }

    pub fn add_photo(&mut self, reference: impl Into<String>) {
        self.draft.photos.push(reference.into());
    }

    /// Score of the sample being edited, counting only complete layers.
    pub fn current_score(&self) -> f64 {
        compute_sample_score(&self.draft.scorable_layers())
    }

    pub fn current_classification(&self) -> ManagementClass {
        classify_management(self.current_score())
    }

    pub fn running_average(&self) -> f64 {
        compute_evaluation_average(&self.samples)
    }

    /// Freezes the draft into the sample list at the current index.
    pub fn validate_current_sample(&mut self) -> Result<&Sample> {
        let sample = self.draft.freeze()?;
        if self.current_index < self.samples.len() {
            self.samples[self.current_index] = sample;
        } else {
            self.samples.push(sample);
        }
        Ok(&self.samples[self.current_index])
    }

    /// Applies `action`; on error the workflow is left untouched.
    pub fn dispatch(&mut self, action: Action) -> Result<Step> {
        let next = self.step().transition(action)?;

        match action {
            Action::Continue | Action::Back | Action::Submit => {}
            Action::Evaluate => {
                self.validate_current_sample()?;
            }
            Action::NextSample => {
                self.validate_current_sample()?;
                self.current_index += 1;
                let location = std::mem::take(&mut self.draft.location);
                self.draft = SampleDraft::numbered(self.current_index + 1, location);
            }
            Action::Finalize => {
                self.validate_current_sample()?;
            }
        }

        self.state = match next {
            Step::Setup => WorkflowState::Setup,
            Step::Layers => WorkflowState::Layers,
            Step::Result => WorkflowState::Result,
            Step::Final => match std::mem::replace(&mut self.state, WorkflowState::Setup) {
                WorkflowState::Final(submission) => WorkflowState::Final(submission),
                _ => WorkflowState::Final(Submission {
                    payload: self.compose_payload(),
                    error: None,
                }),
            },
        };
        tracing::debug!(
            "Workflow '{}' moved to {} (sample {})",
            self.evaluation_name,
            next,
            self.current_index + 1
        );
        Ok(next)
    }

    fn compose_payload(&self) -> EvaluationData {
        EvaluationData {
            name: self.evaluation_name.clone(),
            date: self.date.clone(),
            start_time: self.start_time.clone(),
            end_time: Some(self.clock.now().format(TIME_FORMAT).to_string()),
            management_description: self.management_description.clone(),
            samples: self.samples.clone(),
            average_score: compute_evaluation_average(&self.samples),
        }
    }

    /// Time since the workflow started, read off the wall clock.
    pub fn elapsed(&self) -> Option<Duration> {
        let now = self.clock.now().format(TIME_FORMAT).to_string();
        evaluation_duration(&self.start_time, &now)
    }

    /// Persists the finalized payload through `store`.
    ///
    /// On success the workflow is consumed. On failure it comes back inside
    /// the [`SubmitFailure`], still final, so the same payload can be retried.
    pub async fn submit<G: EvaluationGateway>(
        mut self,
        store: &mut EvaluationStore<G>,
    ) -> std::result::Result<EvaluationRecord, Box<SubmitFailure>> {
        let payload = match &self.state {
            WorkflowState::Final(submission) => submission.payload.clone(),
            _ => {
                let error = VessError::InvalidTransition {
                    from: self.step(),
                    action: Action::Submit,
                };
                return Err(Box::new(SubmitFailure {
                    workflow: self,
                    error,
                }));
            }
        };

        match store.create(payload).await {
            Ok(record) => {
                tracing::info!(
                    "Evaluation '{}' saved with {} samples (id {})",
                    record.name,
                    record.samples.len(),
                    record.id
                );
                Ok(record)
            }
            Err(error) => {
                if let WorkflowState::Final(submission) = &mut self.state {
                    submission.error = Some(error.to_string());
                }
                Err(Box::new(SubmitFailure {
                    workflow: self,
                    error,
                }))
            }
        }
    }
}

/// Duration between two `HH:MM` wall-clock strings.
///
/// Neither carries a date, so an end earlier than the start is read as
/// crossing midnight.
pub fn evaluation_duration(start: &str, end: &str) -> Option<Duration> {
    let start = NaiveTime::parse_from_str(start.trim(), TIME_FORMAT).ok()?;
    let end = NaiveTime::parse_from_str(end.trim(), TIME_FORMAT).ok()?;
    let elapsed = end - start;
    if elapsed < Duration::zero() {
        Some(elapsed + Duration::days(1))
    } else {
        Some(elapsed)
    }
}
