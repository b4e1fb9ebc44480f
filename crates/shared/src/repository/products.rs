//! PostgreSQL product repository

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use super::ProductRepository;
use crate::error::StoreResult;
use crate::types::{Page, PageRequest, Product, ProductInput};

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: Decimal,
    status: bool,
    code: Option<i32>,
    category_id: i64,
    category_name: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            status: row.status,
            code: row.code,
            category_id: row.category_id,
            category_name: row.category_name,
        }
    }
}

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.price, p.status, p.code,
           p.category_id, c.name AS category_name
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<Product>> {
        // sort_column comes from a static whitelist
        let sql = format!(
            "{PRODUCT_SELECT} ORDER BY {} {} LIMIT $1 OFFSET $2",
            request.sort_column,
            request.direction.as_sql()
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(request.limit())
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(Product::from).collect(),
            request,
            total,
        ))
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn insert(&self, input: ProductInput) -> StoreResult<Product> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO products (name, description, price, status, code, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.status)
        .bind(input.code)
        .bind(input.category_id)
        .fetch_one(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| crate::error::StoreError::NotFound(format!("product {id}")))
    }

    async fn update(&self, id: i64, input: ProductInput) -> StoreResult<Option<Product>> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $1, description = $2, price = $3, status = $4, code = $5, category_id = $6
            WHERE id = $7
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.status)
        .bind(input.code)
        .bind(input.category_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
