//! Product routes, V2: codes are plain integers

use axum::{extract::State, http::StatusCode, Json};
use catalog_shared::{Page, Product, ProductInput, PRODUCT_SORT_FIELDS};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::extract::{not_blank, Path, Query, ValidatedJson};
use super::products::{
    ensure_category_exists, missing_fields, positive_price, product_not_found, CategoryRef,
};
use super::{PageParams, SuccessResponse};
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequestV2 {
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
    #[validate(
        required(message = "is required"),
        range(min = 1, message = "must be at least 1")
    )]
    pub code: Option<i32>,
    #[validate(required(message = "is required"))]
    pub category: Option<CategoryRef>,
}

impl ProductRequestV2 {
    fn into_input(self) -> ApiResult<ProductInput> {
        let (Some(price), Some(status), Some(code), Some(category)) =
            (self.price, self.status, self.code, self.category)
        else {
            return Err(missing_fields());
        };

        Ok(ProductInput {
            name: self.name,
            description: self.description,
            price,
            status,
            code: Some(code),
            category_id: category.id,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponseV2 {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub status: bool,
    pub code: Option<i32>,
    pub category_id: i64,
    pub category_name: Option<String>,
}

impl From<Product> for ProductResponseV2 {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            status: p.status,
            code: p.code,
            category_id: p.category_id,
            category_name: p.category_name,
        }
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<ProductResponseV2>>> {
    let request = params.resolve(PRODUCT_SORT_FIELDS)?;
    let page = state.products.find_page(&request).await?;
    Ok(Json(page.map(ProductResponseV2::from)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProductResponseV2>> {
    let product = state
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(Json(product.into()))
}

pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ProductRequestV2>,
) -> ApiResult<(StatusCode, Json<ProductResponseV2>)> {
    let input = req.into_input()?;
    ensure_category_exists(&state, input.category_id).await?;

    let product = state.products.insert(input).await?;
    tracing::info!(product_id = product.id, code = ?product.code, "Product created (v2)");
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ProductRequestV2>,
) -> ApiResult<Json<ProductResponseV2>> {
    let input = req.into_input()?;
    ensure_category_exists(&state, input.category_id).await?;

    let product = state
        .products
        .update(id, input)
        .await?
        .ok_or_else(product_not_found)?;
    tracing::info!(product_id = id, "Product updated (v2)");
    Ok(Json(product.into()))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SuccessResponse>> {
    if !state.products.delete(id).await? {
        return Err(product_not_found());
    }
    tracing::info!(product_id = id, "Product deleted (v2)");
    Ok(Json(SuccessResponse::new("Product deleted successfully")))
}
