//! Catalog Shared Types and Utilities
//!
//! Domain records, paging types, repository traits and their PostgreSQL
//! implementations shared by the catalog API.

pub mod db;
pub mod error;
pub mod repository;
pub mod types;

pub use db::*;
pub use error::*;
pub use repository::{
    CategoryRepository, PgCategoryRepository, PgProductRepository, PgUserRepository,
    ProductRepository, UserRepository, CATEGORY_SORT_FIELDS, PRODUCT_SORT_FIELDS,
};
pub use types::*;
