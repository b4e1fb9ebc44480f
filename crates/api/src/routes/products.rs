//! Product routes, V1: codes are rendered as `PROD-XXX` strings

use axum::{extract::State, http::StatusCode, Json};
use catalog_shared::{Page, Product, ProductInput, PRODUCT_SORT_FIELDS};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::extract::{not_blank, Path, Query, ValidatedJson};
use super::PageParams;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

const CODE_PREFIX: &str = "PROD-";

// =============================================================================
// Shared with V2
// =============================================================================

/// Reference to an existing category, e.g. `{"id": 3}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
}

pub(crate) fn positive_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("price_not_positive").with_message("must be positive".into()));
    }
    Ok(())
}

pub(crate) fn product_not_found() -> ApiError {
    ApiError::NotFound("Product not found".to_string())
}

/// Fail with 404 unless the referenced category exists
pub(crate) async fn ensure_category_exists(state: &AppState, category_id: i64) -> ApiResult<()> {
    match state.categories.find_by_id(category_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Category not found".to_string())),
    }
}

pub(crate) fn missing_fields() -> ApiError {
    ApiError::validation("body", "missing required fields")
}

// =============================================================================
// Code format
// =============================================================================

fn valid_code(value: &str) -> Result<(), ValidationError> {
    match parse_code(value) {
        Ok(_) => Ok(()),
        Err(()) => Err(ValidationError::new("code_format")
            .with_message("must have the format PROD-<number>".into())),
    }
}

/// `PROD-007` -> `Some(7)`; empty -> `None`
fn parse_code(value: &str) -> Result<Option<i32>, ()> {
    if value.is_empty() {
        return Ok(None);
    }
    let digits = value.strip_prefix(CODE_PREFIX).ok_or(())?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(());
    }
    digits.parse().map(Some).map_err(|_| ())
}

pub fn format_code(code: i32) -> String {
    format!("{CODE_PREFIX}{code:03}")
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "must have at most 100 characters")
    )]
    pub name: String,
    #[validate(length(max = 255, message = "must have at most 255 characters"))]
    pub description: Option<String>,
    #[validate(required(message = "is required"), custom(function = "positive_price"))]
    pub price: Option<Decimal>,
    #[validate(required(message = "is required"))]
    pub status: Option<bool>,
    #[validate(custom(function = "valid_code"))]
    pub code: Option<String>,
    #[validate(required(message = "is required"))]
    pub category: Option<CategoryRef>,
}

impl ProductRequest {
    fn into_input(self) -> ApiResult<ProductInput> {
        let (Some(price), Some(status), Some(category)) = (self.price, self.status, self.category)
        else {
            return Err(missing_fields());
        };
        let code = match self.code.as_deref() {
            None => None,
            Some(raw) => parse_code(raw).map_err(|_| {
                ApiError::validation("code", "must have the format PROD-<number>")
            })?,
        };

        Ok(ProductInput {
            name: self.name,
            description: self.description,
            price,
            status,
            code,
            category_id: category.id,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub status: bool,
    pub code: Option<String>,
    pub category_id: i64,
    pub category_name: Option<String>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            status: p.status,
            code: p.code.map(format_code),
            category_id: p.category_id,
            category_name: p.category_name,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<ProductResponse>>> {
    let request = params.resolve(PRODUCT_SORT_FIELDS)?;
    let page = state.products.find_page(&request).await?;
    Ok(Json(page.map(ProductResponse::from)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProductResponse>> {
    let product = state
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(Json(product.into()))
}

pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let input = req.into_input()?;
    ensure_category_exists(&state, input.category_id).await?;

    let product = state.products.insert(input).await?;
    tracing::info!(product_id = product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let input = req.into_input()?;
    ensure_category_exists(&state, input.category_id).await?;

    let product = state
        .products
        .update(id, input)
        .await?
        .ok_or_else(product_not_found)?;
    tracing::info!(product_id = id, "Product updated");
    Ok(Json(product.into()))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.products.delete(id).await? {
        return Err(product_not_found());
    }
    tracing::info!(product_id = id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
