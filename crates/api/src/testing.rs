//! In-memory repositories and state builders for tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use catalog_shared::{
    Category, CategoryInput, CategoryRepository, CategorySummary, NewUser, Page, PageRequest,
    Product, ProductInput, ProductRepository, Role, SortDirection, StoreError, StoreResult, User,
    UserRepository,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use crate::auth::PasswordHasher;
use crate::config::Config;
use crate::routes::create_router;
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-must-be-at-least-32-characters-long";

/// Cheapest Argon2 parameters; hashes are still real PHC strings
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(1, 8).unwrap()
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        cors_allowed_origins: vec![],
        database_url: "postgres://localhost/catalog_test".to_string(),
        database_max_connections: 1,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration_ms: 86_400_000,
        password_hash_iterations: 1,
        password_hash_memory_kib: 8,
        admin_email: None,
        admin_password: None,
    }
}

/// Application state over in-memory repositories. The pool is lazy and never connects.
pub fn test_state(users: Arc<MemoryUserRepository>, catalog: Arc<MemoryCatalog>) -> AppState {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .unwrap();
    AppState::with_repositories(config, pool, users, catalog.clone(), catalog).unwrap()
}

pub const ADMIN_ID: i64 = 1;
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-pass-123";
pub const USER_ID: i64 = 2;
pub const USER_EMAIL: &str = "user@example.com";
pub const USER_PASSWORD: &str = "user-pass-123";
pub const CATEGORY_ID: i64 = 1;

/// Router over seeded in-memory repositories: one admin, one user, one category
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<MemoryUserRepository>,
    pub catalog: Arc<MemoryCatalog>,
}

impl TestApp {
    pub fn new() -> Self {
        let hasher = test_hasher();
        let users = Arc::new(MemoryUserRepository::new());
        users.seed(
            ADMIN_ID,
            "Admin",
            ADMIN_EMAIL,
            &hasher.hash(ADMIN_PASSWORD).unwrap(),
            Role::Admin,
        );
        users.seed(
            USER_ID,
            "User",
            USER_EMAIL,
            &hasher.hash(USER_PASSWORD).unwrap(),
            Role::User,
        );

        let catalog = Arc::new(MemoryCatalog::new());
        catalog.seed_category(CATEGORY_ID, "Electronics");

        let state = test_state(users.clone(), catalog.clone());
        Self {
            router: create_router(state.clone()),
            state,
            users,
            catalog,
        }
    }

    pub fn admin_token(&self) -> String {
        self.token_for(ADMIN_ID, ADMIN_EMAIL, Role::Admin)
    }

    pub fn user_token(&self) -> String {
        self.token_for(USER_ID, USER_EMAIL, Role::User)
    }

    pub fn token_for(&self, user_id: i64, email: &str, role: Role) -> String {
        self.state.jwt.issue(user_id, email, role).unwrap().token
    }

    /// Send a request with an optional bearer token and JSON body.
    /// Empty responses come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send_request(builder.body(body).unwrap()).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<BTreeMap<i64, User>>,
    find_by_id_calls: AtomicUsize,
    find_by_email_calls: AtomicUsize,
    exists_by_email_calls: AtomicUsize,
    insert_calls: AtomicUsize,
    update_password_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user without touching the call counters
    pub fn seed(&self, id: i64, name: &str, email: &str, password_hash: &str, role: Role) {
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                role,
            },
        );
    }

    pub fn get(&self, id: i64) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn find_by_id_calls(&self) -> usize {
        self.find_by_id_calls.load(Ordering::SeqCst)
    }

    pub fn find_by_email_calls(&self) -> usize {
        self.find_by_email_calls.load(Ordering::SeqCst)
    }

    pub fn exists_by_email_calls(&self) -> usize {
        self.exists_by_email_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn update_password_calls(&self) -> usize {
        self.update_password_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.find_by_id_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_by_email_calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        self.exists_by_email_calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        Ok(users.values().any(|u| u.email == email))
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Resource already exists".to_string()));
        }
        let id = users.keys().next_back().copied().unwrap_or(0) + 1;
        let user = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<()> {
        self.update_password_calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn find_all(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.lock().unwrap().values().cloned().collect())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().remove(&id).is_some())
    }
}

// =============================================================================
// Categories and products
// =============================================================================

#[derive(Default)]
struct CatalogData {
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, ProductInput>,
}

impl CatalogData {
    fn summary(&self, category: &Category) -> CategorySummary {
        CategorySummary {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            product_count: self
                .products
                .values()
                .filter(|p| p.category_id == category.id)
                .count() as i64,
        }
    }

    fn product(&self, id: i64, input: &ProductInput) -> Product {
        Product {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            status: input.status,
            code: input.code,
            category_id: input.category_id,
            category_name: self
                .categories
                .get(&input.category_id)
                .map(|c| c.name.clone()),
        }
    }
}

/// Sorts by id only; the requested column is ignored
fn page_of<T: Clone>(mut items: Vec<T>, request: &PageRequest) -> Page<T> {
    if request.direction == SortDirection::Desc {
        items.reverse();
    }
    let total = items.len() as i64;
    let content = items
        .into_iter()
        .skip(request.offset() as usize)
        .take(request.limit() as usize)
        .collect();
    Page::new(content, request, total)
}

/// One in-memory store backing both the category and product repositories
#[derive(Default)]
pub struct MemoryCatalog {
    data: Mutex<CatalogData>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_category(&self, id: i64, name: &str) {
        self.data.lock().unwrap().categories.insert(
            id,
            Category {
                id,
                name: name.to_string(),
                description: None,
            },
        );
    }

    pub fn seed_product(&self, id: i64, input: ProductInput) {
        self.data.lock().unwrap().products.insert(id, input);
    }

    pub fn product(&self, id: i64) -> Option<Product> {
        let data = self.data.lock().unwrap();
        data.products.get(&id).map(|input| data.product(id, input))
    }

    pub fn category_count(&self) -> usize {
        self.data.lock().unwrap().categories.len()
    }

    pub fn product_count(&self) -> usize {
        self.data.lock().unwrap().products.len()
    }
}

#[async_trait]
impl CategoryRepository for MemoryCatalog {
    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<CategorySummary>> {
        let data = self.data.lock().unwrap();
        let items = data.categories.values().map(|c| data.summary(c)).collect();
        Ok(page_of(items, request))
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<CategorySummary>> {
        let data = self.data.lock().unwrap();
        Ok(data.categories.get(&id).map(|c| data.summary(c)))
    }

    async fn insert(&self, input: CategoryInput) -> StoreResult<Category> {
        let mut data = self.data.lock().unwrap();
        let id = data.categories.keys().next_back().copied().unwrap_or(0) + 1;
        let category = Category {
            id,
            name: input.name,
            description: input.description,
        };
        data.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update(&self, id: i64, input: CategoryInput) -> StoreResult<Option<Category>> {
        let mut data = self.data.lock().unwrap();
        Ok(data.categories.get_mut(&id).map(|category| {
            category.name = input.name;
            category.description = input.description;
            category.clone()
        }))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut data = self.data.lock().unwrap();
        if data.products.values().any(|p| p.category_id == id) {
            return Err(StoreError::Conflict(
                "Resource is referenced by other records".to_string(),
            ));
        }
        Ok(data.categories.remove(&id).is_some())
    }
}

#[async_trait]
impl ProductRepository for MemoryCatalog {
    async fn find_page(&self, request: &PageRequest) -> StoreResult<Page<Product>> {
        let data = self.data.lock().unwrap();
        let items = data
            .products
            .iter()
            .map(|(id, input)| data.product(*id, input))
            .collect();
        Ok(page_of(items, request))
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        Ok(self.product(id))
    }

    async fn insert(&self, input: ProductInput) -> StoreResult<Product> {
        let mut data = self.data.lock().unwrap();
        let id = data.products.keys().next_back().copied().unwrap_or(0) + 1;
        let product = data.product(id, &input);
        data.products.insert(id, input);
        Ok(product)
    }

    async fn update(&self, id: i64, input: ProductInput) -> StoreResult<Option<Product>> {
        let mut data = self.data.lock().unwrap();
        if !data.products.contains_key(&id) {
            return Ok(None);
        }
        let product = data.product(id, &input);
        data.products.insert(id, input);
        Ok(Some(product))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.data.lock().unwrap().products.remove(&id).is_some())
    }
}
