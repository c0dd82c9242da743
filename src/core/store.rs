//! Client-side cache of persisted evaluations.
//!
//! Every operation goes to the gateway first; the local list only changes
//! once the remote call succeeded, through one of the pure reducers below.

use crate::domain::model::{
    EvaluationData, EvaluationPatch, EvaluationRecord, PaginationState,
};
use crate::domain::ports::EvaluationGateway;
use crate::utils::error::{Result, VessError};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub initial_page: u32,
    pub limit: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            initial_page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

pub mod reducers {
    use crate::domain::model::EvaluationRecord;

    pub fn prepend(list: &[EvaluationRecord], record: EvaluationRecord) -> Vec<EvaluationRecord> {
        std::iter::once(record).chain(list.iter().cloned()).collect()
    }

    /// Unknown ids leave the list as it was.
    pub fn replace_by_id(
        list: &[EvaluationRecord],
        id: &str,
        record: EvaluationRecord,
    ) -> Vec<EvaluationRecord> {
        list.iter()
            .map(|existing| {
                if existing.id == id {
                    record.clone()
                } else {
                    existing.clone()
                }
            })
            .collect()
    }

    pub fn remove_by_id(list: &[EvaluationRecord], id: &str) -> Vec<EvaluationRecord> {
        list.iter()
            .filter(|existing| existing.id != id)
            .cloned()
            .collect()
    }
}

pub struct EvaluationStore<G: EvaluationGateway> {
    gateway: G,
    limit: u32,
    current_page: u32,
    evaluations: Vec<EvaluationRecord>,
    pagination: Option<PaginationState>,
    loading: bool,
    error: Option<String>,
}

impl<G: EvaluationGateway> EvaluationStore<G> {
    pub fn new(gateway: G, options: StoreOptions) -> Self {
        Self {
            gateway,
            limit: options.limit.max(1),
            current_page: options.initial_page.max(1),
            evaluations: Vec::new(),
            pagination: None,
            loading: false,
            error: None,
        }
    }

    pub fn evaluations(&self) -> &[EvaluationRecord] {
        &self.evaluations
    }

    pub fn pagination(&self) -> Option<&PaginationState> {
        self.pagination.as_ref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    fn fail(&mut self, operation: &str, err: VessError) -> VessError {
        tracing::error!("Failed to {}: {}", operation, err);
        self.error = Some(err.to_string());
        VessError::sync(err)
    }

    /// Replaces the cached page. A failure invalidates the cache.
    pub async fn load_page(&mut self, page: u32) -> Result<()> {
        self.loading = true;
        self.error = None;
        tracing::debug!("Loading evaluations page {} (limit {})", page, self.limit);

        let outcome = self.gateway.list(page, self.limit).await;
        self.loading = false;

        match outcome {
            Ok(result) => {
                let pagination = PaginationState::from(&result);
                tracing::info!(
                    "Loaded {} evaluations (page {}/{})",
                    result.evaluations.len(),
                    pagination.current_page,
                    pagination.total_pages
                );
                self.evaluations = result.evaluations;
                self.pagination = Some(pagination);
                self.current_page = page;
                Ok(())
            }
            Err(err) => {
                self.evaluations = Vec::new();
                self.pagination = None;
                Err(self.fail("load evaluations", err))
            }
        }
    }

    pub async fn refresh(&mut self) -> Result<()> {
        tracing::debug!("Refreshing page {}", self.current_page);
        self.load_page(self.current_page).await
    }

    /// Prepends the persisted record; pagination totals are left alone.
    pub async fn create(&mut self, data: EvaluationData) -> Result<EvaluationRecord> {
        self.error = None;
        tracing::debug!(
            "Creating evaluation '{}' with {} samples",
            data.name,
            data.samples.len()
        );

        match self.gateway.create(&data).await {
            Ok(record) => {
                tracing::info!("Evaluation created: {}", record.id);
                self.evaluations = reducers::prepend(&self.evaluations, record.clone());
                Ok(record)
            }
            Err(err) => Err(self.fail("create evaluation", err)),
        }
    }

    pub async fn update(&mut self, id: &str, patch: EvaluationPatch) -> Result<EvaluationRecord> {
        self.error = None;
        if !self.evaluations.iter().any(|record| record.id == id) {
            tracing::debug!("Evaluation {} is not on the cached page", id);
        }

        match self.gateway.update(id, &patch).await {
            Ok(record) => {
                tracing::info!("Evaluation updated: {}", id);
                self.evaluations = reducers::replace_by_id(&self.evaluations, id, record.clone());
                Ok(record)
            }
            Err(err) => Err(self.fail("update evaluation", err)),
        }
    }

    /// Removes the record; when that empties a page other than the first,
    /// the previous page is loaded in its place.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.error = None;

        if let Err(err) = self.gateway.delete(id).await {
            return Err(self.fail("delete evaluation", err));
        }
        tracing::info!("Evaluation deleted: {}", id);

        let had_records = !self.evaluations.is_empty();
        self.evaluations = reducers::remove_by_id(&self.evaluations, id);

        let page = self.pagination.map(|p| p.current_page);
        if let Some(page) = page {
            if had_records && self.evaluations.is_empty() && page > 1 {
                tracing::info!("Page {} is now empty, moving to page {}", page, page - 1);
                if let Err(err) = self.load_page(page - 1).await {
                    tracing::warn!("Could not load the previous page after delete: {}", err);
                }
            }
        }
        Ok(())
    }

    /// Always asks the gateway; the cached list is not touched.
    pub async fn get_by_id(&mut self, id: &str) -> Result<EvaluationRecord> {
        self.error = None;
        match self.gateway.get(id).await {
            Ok(record) => Ok(record),
            Err(err) => Err(self.fail("fetch evaluation", err)),
        }
    }
}
