use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use shopscout_core::{ProductRecord, SearchFilters, SortKey};
use shopscout_crawler::CrawlerError;

use crate::api::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    query: String,
    min_price: Option<f64>,
    max_price: Option<f64>,
    min_rating: Option<f64>,
    sort_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchData {
    query: String,
    count: usize,
    products: Vec<ProductRecord>,
    /// Set when the search completed but matched nothing — the explicit
    /// empty-result marker, as opposed to a transport error.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

pub(super) async fn search(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let sort_by = match params.sort_by.as_deref() {
        None => SortKey::Relevance,
        Some(raw) => raw.parse::<SortKey>().map_err(|e| {
            ApiError::new(request_id.clone(), "validation_error", e)
        })?,
    };

    let filters = SearchFilters {
        min_price: params.min_price,
        max_price: params.max_price,
        min_rating: params.min_rating,
        sort_by,
    };

    let products = state
        .recommender
        .search(&params.query, &filters)
        .await
        .map_err(|e| match e {
            CrawlerError::CallerInput(message) => {
                ApiError::new(request_id.clone(), "validation_error", message)
            }
            other => {
                tracing::error!(error = %other, "search failed unexpectedly");
                ApiError::new(request_id.clone(), "internal_error", "search failed")
            }
        })?;

    let message = products
        .is_empty()
        .then_some("no products found matching your search query");

    Ok(Json(ApiResponse {
        data: SearchData {
            query: params.query,
            count: products.len(),
            products,
            message,
        },
        meta: ResponseMeta::new(request_id),
    }))
}
