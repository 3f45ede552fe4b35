use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// User record as stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub password_hash: String,
}

/// Public part of a user embedded in blog responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: Uuid,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub url: String,
    pub likes: i64,
    pub user: Option<Creator>,
}

#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub author: Option<String>,
    pub url: String,
    pub likes: i64,
    pub user_id: Option<Uuid>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct BlogPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the author.
    pub author: Option<Option<String>>,
    pub url: Option<String>,
    pub likes: Option<i64>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username `{0}` already exists")]
    DuplicateUsername(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    async fn delete_all(&self) -> anyhow::Result<()>;
}

/// Blog listing is ordered by likes, highest first; equal likes keep creation order.
#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Blog>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Blog>>;
    async fn create(&self, blog: NewBlog) -> anyhow::Result<Blog>;
    async fn create_many(&self, blogs: Vec<NewBlog>) -> anyhow::Result<Vec<Blog>>;
    async fn update(&self, id: Uuid, patch: BlogPatch) -> anyhow::Result<Option<Blog>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn delete_all(&self) -> anyhow::Result<()>;
}
