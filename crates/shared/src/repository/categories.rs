//! PostgreSQL category repository

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::CategoryRepository;
use crate::error::StoreResult;
use crate::types::{Category, CategoryInput, CategorySummary, Page, PageRequest};

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, FromRow)]
struct CategorySummaryRow {
    id: i64,
    name: String,
    description: Option<String>,
    product_count: i64,
}

impl From<CategorySummaryRow> for CategorySummary {
    fn from(row: CategorySummaryRow) -> Self {
        CategorySummary {
            id: row.id,
            name: row.name,
            description: row.description,
            product_count: row.product_count,
        }
    }
}

const SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.name, c.description, COUNT(p.id) AS product_count
    FROM categories c
    LEFT JOIN products p ON p.category_id = c.id
"#;

#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<CategorySummary>> {
        // sort_column comes from a static whitelist
        let sql = format!(
            "{SUMMARY_SELECT} GROUP BY c.id ORDER BY {} {} LIMIT $1 OFFSET $2",
            request.sort_column,
            request.direction.as_sql()
        );

        let rows: Vec<CategorySummaryRow> = sqlx::query_as(&sql)
            .bind(request.limit())
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(CategorySummary::from).collect(),
            request,
            total,
        ))
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<CategorySummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE c.id = $1 GROUP BY c.id");
        let row: Option<CategorySummaryRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CategorySummary::from))
    }

    async fn insert(&self, input: CategoryInput) -> StoreResult<Category> {
        let row: CategoryRow = sqlx::query_as(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: i64, input: CategoryInput) -> StoreResult<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r#"
            UPDATE categories SET name = $1, description = $2
            WHERE id = $3
            RETURNING id, name, description
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
