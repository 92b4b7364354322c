//! Generic view operations as capability traits over a shared model.
//!
//! Each operation makes exactly one store call. Mutating operations validate the
//! full payload first and never reach the store when validation fails.

use crate::error::AppError;
use crate::model::ListOptions;
use crate::response::ListPage;
use crate::state::ResourceView;
use crate::store::Record;
use async_trait::async_trait;
use std::collections::HashMap;

/// `page` / `pageSize` from the query string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl ListQuery {
    /// Unknown parameters are ignored; present values must be positive integers.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, AppError> {
        Ok(ListQuery {
            page: positive(params, "page")?,
            page_size: positive(params, "pageSize")?,
        })
    }
}

fn positive(params: &HashMap<String, String>, key: &str) -> Result<Option<u64>, AppError> {
    let Some(raw) = params.get(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => Err(AppError::BadRequest(format!("{} must be a positive integer", key))),
    }
}

#[async_trait]
pub trait Lister {
    async fn list(&self, query: ListQuery) -> Result<ListPage, AppError>;
}

#[async_trait]
pub trait Creator {
    async fn create(&self, payload: Record) -> Result<Record, AppError>;
}

#[async_trait]
pub trait Retriever {
    async fn retrieve(&self, id: &str) -> Result<Record, AppError>;
}

#[async_trait]
pub trait Updater {
    async fn update(&self, id: &str, payload: Record) -> Result<Record, AppError>;
}

#[async_trait]
pub trait Destroyer {
    async fn destroy(&self, id: &str) -> Result<(), AppError>;
}

impl ResourceView {
    /// `(skip, take)` for a page request.
    pub fn page_window(&self, query: ListQuery) -> (i64, u64) {
        let config = self.config();
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query
            .page_size
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size.max(1));
        let skip = (page - 1).saturating_mul(page_size).min(i64::MAX as u64) as i64;
        (skip, page_size)
    }
}

#[async_trait]
impl Lister for ResourceView {
    async fn list(&self, query: ListQuery) -> Result<ListPage, AppError> {
        let (skip, take) = self.page_window(query);
        let data = self
            .model()
            .list(ListOptions {
                skip: Some(skip),
                take: Some(take),
            })
            .await?;
        Ok(ListPage::new(data))
    }
}

#[async_trait]
impl Creator for ResourceView {
    async fn create(&self, payload: Record) -> Result<Record, AppError> {
        self.model().validate_all(&payload)?.into_result()?;
        self.model().create(&payload).await
    }
}

#[async_trait]
impl Retriever for ResourceView {
    async fn retrieve(&self, id: &str) -> Result<Record, AppError> {
        self.model().retrieve(id).await
    }
}

#[async_trait]
impl Updater for ResourceView {
    /// Same policy as create: the supplied body must carry every required field.
    async fn update(&self, id: &str, payload: Record) -> Result<Record, AppError> {
        self.model().validate_all(&payload)?.into_result()?;
        self.model().update(id, &payload).await
    }
}

#[async_trait]
impl Destroyer for ResourceView {
    async fn destroy(&self, id: &str) -> Result<(), AppError> {
        self.model().destroy(id).await.map(|_| ())
    }
}
