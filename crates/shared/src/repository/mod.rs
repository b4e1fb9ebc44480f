//! Persistence boundary
//!
//! The service talks to storage only through these traits. The PostgreSQL
//! implementations live in the submodules.

mod categories;
mod products;
mod users;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{
    Category, CategoryInput, CategorySummary, NewUser, Page, PageRequest, Product, ProductInput,
    User,
};

pub use categories::PgCategoryRepository;
pub use products::PgProductRepository;
pub use users::PgUserRepository;

/// Sortable category fields: public name -> SQL column
pub const CATEGORY_SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "c.id"),
    ("name", "c.name"),
    ("description", "c.description"),
];

/// Sortable product fields: public name -> SQL column
pub const PRODUCT_SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "p.id"),
    ("name", "p.name"),
    ("price", "p.price"),
    ("status", "p.status"),
    ("code", "p.code"),
];

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    /// Case-sensitive lookup
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;
    async fn insert(&self, user: NewUser) -> StoreResult<User>;
    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<()>;
    async fn find_all(&self) -> StoreResult<Vec<User>>;
    /// Returns false when no row matched
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<CategorySummary>>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<CategorySummary>>;
    async fn insert(&self, input: CategoryInput) -> StoreResult<Category>;
    async fn update(&self, id: i64, input: CategoryInput) -> StoreResult<Option<Category>>;
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<Product>>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Product>>;
    async fn insert(&self, input: ProductInput) -> StoreResult<Product>;
    async fn update(&self, id: i64, input: ProductInput) -> StoreResult<Option<Product>>;
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}
