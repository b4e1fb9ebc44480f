//! Category routes

use axum::{extract::State, http::StatusCode, Json};
use catalog_shared::{Category, CategoryInput, CategorySummary, Page, CATEGORY_SORT_FIELDS};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::extract::{not_blank, Path, Query, ValidatedJson};
use super::{PageParams, SuccessResponse};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "must have at most 100 characters")
    )]
    pub name: String,
    #[validate(length(max = 255, message = "must have at most 255 characters"))]
    pub description: Option<String>,
}

impl From<CategoryRequest> for CategoryInput {
    fn from(req: CategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub product_count: i64,
}

impl From<CategorySummary> for CategoryResponse {
    fn from(c: CategorySummary) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            product_count: c.product_count,
        }
    }
}

fn category_not_found() -> ApiError {
    ApiError::NotFound("Category not found".to_string())
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<CategoryResponse>>> {
    let request = params.resolve(CATEGORY_SORT_FIELDS)?;
    let page = state.categories.find_page(&request).await?;
    Ok(Json(page.map(CategoryResponse::from)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CategoryResponse>> {
    let category = state
        .categories
        .find_by_id(id)
        .await?
        .ok_or_else(category_not_found)?;
    Ok(Json(category.into()))
}

pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.categories.insert(req.into()).await?;
    tracing::info!(category_id = category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    let category = state
        .categories
        .update(id, req.into())
        .await?
        .ok_or_else(category_not_found)?;
    tracing::info!(category_id = id, "Category updated");
    Ok(Json(category))
}

/// Categories still referenced by products cannot be deleted (409)
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SuccessResponse>> {
    if !state.categories.delete(id).await? {
        return Err(category_not_found());
    }
    tracing::info!(category_id = id, "Category deleted");
    Ok(Json(SuccessResponse::new("Category deleted successfully")))
}
