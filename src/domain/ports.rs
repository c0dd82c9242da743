use crate::domain::model::{EvaluationData, EvaluationPage, EvaluationPatch, EvaluationRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Remote collection of evaluations (the REST service behind `/evaluations`).
#[async_trait]
pub trait EvaluationGateway: Send + Sync {
    async fn list(&self, page: u32, limit: u32) -> Result<EvaluationPage>;
    async fn create(&self, data: &EvaluationData) -> Result<EvaluationRecord>;
    async fn get(&self, id: &str) -> Result<EvaluationRecord>;
    async fn update(&self, id: &str, patch: &EvaluationPatch) -> Result<EvaluationRecord>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Supplies credentials for gateway calls.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Value for the `Authorization` header, if any.
    async fn authorization(&self) -> Option<String>;

    /// Called after a 401. Returns true when credentials were renewed and the
    /// request is worth retrying.
    async fn on_unauthorized(&self) -> bool;
}

pub trait Clock: Send + Sync {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}
