//! Management API handlers.
//!
//! # Responsibilities
//! - Paginated listing with clamped page/per_page
//! - Single-record fetch, delete-one, delete-all
//!
//! # Design Decisions
//! - Bad pagination input is clamped, never an error
//! - Storage failures surface as a 500 envelope; not-found is a local 404

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Map, Value};

use crate::capture::request::CapturedRequest;
use crate::http::response::ApiResponse;
use crate::observability::metrics;
use crate::storage::{RequestRepository, StorageError};

const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;

/// Handlers behind the `/api/requests` routes.
pub struct RequestsApi {
    repository: Arc<RequestRepository>,
}

impl RequestsApi {
    pub fn new(repository: Arc<RequestRepository>) -> Self {
        Self { repository }
    }

    /// `GET /api/requests?page=&per_page=`
    pub async fn index(&self, request: &CapturedRequest) -> ApiResponse {
        let page = query_int(request.query(), "page").unwrap_or(1).max(1);
        let per_page = query_int(request.query(), "per_page")
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let offset = (page - 1) * per_page;

        let total = match self.repository.count().await {
            Ok(total) => total,
            Err(err) => return storage_failure("index", err),
        };
        let records = match self.repository.all(per_page, offset).await {
            Ok(records) => records,
            Err(err) => return storage_failure("index", err),
        };

        let last_page = ((total + per_page - 1) / per_page).max(1);
        let count = records.len();
        metrics::record_api("index", 200);

        ApiResponse::json(
            &json!({
                "data": records,
                "meta": {
                    "count": count,
                    "total": total,
                    "page": page,
                    "per_page": per_page,
                    "last_page": last_page,
                },
            }),
            StatusCode::OK,
        )
    }

    /// `GET /api/requests/{id}`
    pub async fn show(&self, id: i64) -> ApiResponse {
        match self.repository.find(id).await {
            Ok(Some(record)) => {
                metrics::record_api("show", 200);
                ApiResponse::json(&json!({"data": record}), StatusCode::OK)
            }
            Ok(None) => {
                metrics::record_api("show", 404);
                not_found()
            }
            Err(err) => storage_failure("show", err),
        }
    }

    /// `DELETE /api/requests/{id}`
    pub async fn destroy(&self, id: i64) -> ApiResponse {
        match self.repository.find(id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                metrics::record_api("destroy", 404);
                return not_found();
            }
            Err(err) => return storage_failure("destroy", err),
        }

        match self.repository.delete(id).await {
            Ok(_) => {
                metrics::record_api("destroy", 200);
                ApiResponse::json(
                    &json!({"message": "Request deleted", "data": {"id": id}}),
                    StatusCode::OK,
                )
            }
            Err(err) => storage_failure("destroy", err),
        }
    }

    /// `DELETE /api/requests`
    pub async fn destroy_all(&self) -> ApiResponse {
        match self.repository.delete_all().await {
            Ok(()) => {
                metrics::record_api("destroy_all", 200);
                ApiResponse::json(&json!({"message": "All requests cleared"}), StatusCode::OK)
            }
            Err(err) => storage_failure("destroy_all", err),
        }
    }
}

/// An integer query value. Absent key → `None`; present but malformed → 0,
/// which the callers clamp into range.
fn query_int(query: &Map<String, Value>, key: &str) -> Option<i64> {
    let raw = query.get(key)?;
    Some(match raw {
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Number(n) => n.as_i64().unwrap_or(0),
        _ => 0,
    })
}

fn not_found() -> ApiResponse {
    ApiResponse::json(&json!({"message": "Request not found"}), StatusCode::NOT_FOUND)
}

fn storage_failure(endpoint: &'static str, err: StorageError) -> ApiResponse {
    tracing::error!(error = %err, endpoint, "storage operation failed");
    metrics::record_api(endpoint, 500);
    ApiResponse::json(
        &json!({"message": "Storage failure"}),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_int_parsing() {
        let mut query = Map::new();
        query.insert("page".into(), json!("3"));
        query.insert("bad".into(), json!("abc"));
        query.insert("num".into(), json!(7));

        assert_eq!(query_int(&query, "page"), Some(3));
        assert_eq!(query_int(&query, "bad"), Some(0));
        assert_eq!(query_int(&query, "num"), Some(7));
        assert_eq!(query_int(&query, "missing"), None);
    }

    #[test]
    fn test_pagination_clamping() {
        // The clamp expressions used by index().
        let page = Some(0).unwrap_or(1).max(1);
        assert_eq!(page, 1);

        let per_page = Some(1000).unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        assert_eq!(per_page, 100);

        let malformed = Some(0).unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        assert_eq!(malformed, 1);

        let absent: Option<i64> = None;
        assert_eq!(absent.unwrap_or(DEFAULT_PER_PAGE), 10);
    }

    #[test]
    fn test_last_page_formula() {
        let last = |total: i64, per_page: i64| ((total + per_page - 1) / per_page).max(1);

        assert_eq!(last(0, 10), 1);
        assert_eq!(last(10, 10), 1);
        assert_eq!(last(11, 10), 2);
        assert_eq!(last(3, 2), 2);
    }
}
