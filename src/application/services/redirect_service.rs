//! Read-only administrative queries over redirect rules.

use std::sync::Arc;

use serde_json::json;

use crate::domain::entities::Redirect;
use crate::domain::repositories::{RedirectFilter, RedirectRepository};
use crate::error::AppError;

/// Upper bound for a single listing page.
pub const MAX_LIST_LIMIT: u32 = 500;

pub struct RedirectService {
    repository: Arc<dyn RedirectRepository>,
}

impl RedirectService {
    pub fn new(repository: Arc<dyn RedirectRepository>) -> Self {
        Self { repository }
    }

    /// Lists one page of rules matching `filter`, together with the total
    /// number of matching rules.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a zero page or a limit outside
    /// `1..=MAX_LIST_LIMIT`.
    pub async fn list(&self, filter: &RedirectFilter) -> Result<(Vec<Redirect>, i64), AppError> {
        if filter.page == 0 || filter.limit == 0 || filter.limit > MAX_LIST_LIMIT {
            return Err(AppError::bad_request(
                "Invalid pagination",
                json!({ "page": filter.page, "limit": filter.limit, "max_limit": MAX_LIST_LIMIT }),
            ));
        }

        tokio::try_join!(self.repository.list(filter), self.repository.count(filter))
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown or deleted rules.
    pub async fn get(&self, id: i64) -> Result<Redirect, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .filter(|r| !r.is_deleted())
            .ok_or_else(|| AppError::not_found("Redirect not found", json!({ "id": id })))
    }
}
