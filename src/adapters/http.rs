use crate::core::scoring::compute_sample_score;
use crate::domain::model::{
    EvaluationData, EvaluationPage, EvaluationPatch, EvaluationRecord, EvaluationStats,
    HealthStatus, Sample,
};
use crate::domain::ports::{EvaluationGateway, SessionProvider};
use crate::utils::error::{Result, VessError};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const UNNAMED_EVALUATION: &str = "Avaliação sem nome";
const UNKNOWN_EVALUATOR: &str = "Avaliador desconhecido";
const MISSING_DATE: &str = "Data não informada";
const DEFAULT_START_TIME: &str = "00:00";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    data: Option<T>,
    error: Option<String>,
    message: Option<String>,
    pagination: Option<RawPagination>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPagination {
    current_page: u32,
    total_pages: u32,
    total_items: u64,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvaluation {
    id: String,
    name: Option<String>,
    evaluator: Option<String>,
    date: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    samples: Option<Vec<Sample>>,
    average_score: Option<f64>,
    management_description: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    user: Option<RawUser>,
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawEvaluation {
    fn into_record(self) -> EvaluationRecord {
        let evaluator = filled(self.user.and_then(|user| user.name))
            .or(filled(self.evaluator))
            .unwrap_or_else(|| UNKNOWN_EVALUATOR.to_string());

        let samples = self
            .samples
            .unwrap_or_default()
            .into_iter()
            .map(normalize_sample)
            .collect();

        EvaluationRecord {
            id: self.id,
            name: filled(self.name).unwrap_or_else(|| UNNAMED_EVALUATION.to_string()),
            evaluator,
            date: filled(self.date).unwrap_or_else(|| MISSING_DATE.to_string()),
            start_time: filled(self.start_time).unwrap_or_else(|| DEFAULT_START_TIME.to_string()),
            end_time: filled(self.end_time),
            samples,
            average_score: self.average_score.unwrap_or(0.0),
            management_description: self.management_description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Decodes each listed record on its own so a bad one can be named.
fn decode_records(status: StatusCode, items: Vec<Value>) -> Result<Vec<EvaluationRecord>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let label = item
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", index + 1));
            serde_json::from_value::<RawEvaluation>(item)
                .map(RawEvaluation::into_record)
                .map_err(|e| VessError::RemoteError {
                    status: status.as_u16(),
                    message: format!("Evaluation {} is malformed: {}", label, e),
                })
        })
        .collect()
}

fn normalize_sample(mut sample: Sample) -> Sample {
    for (index, layer) in sample.layers.iter_mut().enumerate() {
        if layer.order == 0 {
            layer.order = index as u32 + 1;
        }
    }
    sample.sample_score = compute_sample_score(&sample.layers);
    sample
}

/// [`EvaluationGateway`] over the REST API.
pub struct RestGateway {
    base_url: Url,
    client: Client,
    session: Arc<dyn SessionProvider>,
}

impl RestGateway {
    pub fn new(base_url: &str, session: Arc<dyn SessionProvider>) -> Result<Self> {
        Self::with_timeout(base_url, session, None)
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<dyn SessionProvider>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| VessError::InvalidConfigValue {
            field: "api.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url,
            client: builder.build()?,
            session,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| VessError::ConfigError {
                message: format!("{} cannot be used as a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request, retrying once when the session renews credentials
    /// after a 401.
    async fn execute<F>(&self, build: F) -> Result<(StatusCode, String)>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut retried = false;
        loop {
            let mut request = build();
            if let Some(authorization) = self.session.authorization().await {
                request = request.header(AUTHORIZATION, authorization);
            }

            let response = request.send().await?;
            let status = response.status();
            tracing::debug!("API response status: {}", status);

            if status == StatusCode::UNAUTHORIZED && !retried && self.session.on_unauthorized().await {
                tracing::info!("Session renewed, retrying request");
                retried = true;
                continue;
            }

            let body = response.text().await?;
            return Ok((status, body));
        }
    }

    fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Envelope<T>> {
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| filled(b.error).or(filled(b.message)))
                .unwrap_or_else(|| {
                    let trimmed = body.trim();
                    if trimmed.is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    } else {
                        trimmed.to_string()
                    }
                });
            tracing::warn!("Request rejected with {}: {}", status, message);
            if status == StatusCode::UNAUTHORIZED {
                return Err(VessError::Unauthorized { message });
            }
            return Err(VessError::RemoteError {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(body)?;
        if !envelope.success {
            return Err(VessError::RemoteError {
                status: status.as_u16(),
                message: filled(envelope.error)
                    .or(filled(envelope.message))
                    .unwrap_or_else(|| "Resposta inválida da API".to_string()),
            });
        }
        Ok(envelope)
    }

    fn require_data<T>(status: StatusCode, envelope: Envelope<T>) -> Result<T> {
        envelope.data.ok_or_else(|| VessError::RemoteError {
            status: status.as_u16(),
            message: "response carried no data".to_string(),
        })
    }

    async fn fetch_record<F>(&self, build: F) -> Result<EvaluationRecord>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let (status, body) = self.execute(build).await?;
        let envelope = Self::parse_envelope::<RawEvaluation>(status, &body)?;
        Ok(Self::require_data(status, envelope)?.into_record())
    }

    pub async fn stats(&self) -> Result<EvaluationStats> {
        let url = self.endpoint(&["evaluations", "stats"])?;
        let (status, body) = self.execute(|| self.client.get(url.clone())).await?;
        let envelope = Self::parse_envelope(status, &body)?;
        Self::require_data(status, envelope)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint(&["health"])?;
        let (status, body) = self.execute(|| self.client.get(url.clone())).await?;
        let envelope = Self::parse_envelope(status, &body)?;
        Self::require_data(status, envelope)
    }
}

#[async_trait]
impl EvaluationGateway for RestGateway {
    async fn list(&self, page: u32, limit: u32) -> Result<EvaluationPage> {
        let url = self.endpoint(&["evaluations"])?;
        tracing::debug!("Making API request to: {}?page={}&limit={}", url, page, limit);

        let (status, body) = self
            .execute(|| {
                self.client
                    .get(url.clone())
                    .query(&[("page", page), ("limit", limit)])
            })
            .await?;
        let envelope = Self::parse_envelope::<Value>(status, &body)?;

        // Either a bare array or `{evaluations, pagination}`.
        let (items, nested_pagination) = match envelope.data {
            Some(Value::Array(items)) => (items, None),
            Some(Value::Object(mut fields)) => {
                let pagination = match fields.remove("pagination") {
                    None | Some(Value::Null) => None,
                    Some(raw) => Some(serde_json::from_value::<RawPagination>(raw)?),
                };
                let items = match fields.remove("evaluations") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items,
                    Some(_) => {
                        return Err(VessError::RemoteError {
                            status: status.as_u16(),
                            message: "evaluations is not a list".to_string(),
                        })
                    }
                };
                (items, pagination)
            }
            None | Some(Value::Null) => (Vec::new(), None),
            Some(_) => {
                return Err(VessError::RemoteError {
                    status: status.as_u16(),
                    message: "unexpected shape for the evaluation list".to_string(),
                })
            }
        };
        let evaluations = decode_records(status, items)?;

        let pagination = nested_pagination
            .or(envelope.pagination)
            .unwrap_or(RawPagination {
                current_page: page,
                total_pages: 1,
                total_items: evaluations.len() as u64,
            });

        Ok(EvaluationPage {
            evaluations,
            current_page: pagination.current_page,
            total_pages: pagination.total_pages,
            total_items: pagination.total_items,
        })
    }

    async fn create(&self, data: &EvaluationData) -> Result<EvaluationRecord> {
        let url = self.endpoint(&["evaluations"])?;
        tracing::debug!("Creating evaluation at {}", url);
        self.fetch_record(|| self.client.post(url.clone()).json(data))
            .await
    }

    async fn get(&self, id: &str) -> Result<EvaluationRecord> {
        let url = self.endpoint(&["evaluations", id])?;
        self.fetch_record(|| self.client.get(url.clone())).await
    }

    async fn update(&self, id: &str, patch: &EvaluationPatch) -> Result<EvaluationRecord> {
        let url = self.endpoint(&["evaluations", id])?;
        self.fetch_record(|| self.client.put(url.clone()).json(patch))
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["evaluations", id])?;
        let (status, body) = self.execute(|| self.client.delete(url.clone())).await?;
        Self::parse_envelope::<Value>(status, &body)?;
        Ok(())
    }
}
