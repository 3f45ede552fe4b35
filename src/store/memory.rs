use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Blog, BlogPatch, BlogStore, Creator, NewBlog, NewUser, StoreError, User, UserStore,
};

#[derive(Debug, Clone)]
struct BlogRow {
    id: Uuid,
    title: String,
    author: Option<String>,
    url: String,
    likes: i64,
    user_id: Option<Uuid>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    blogs: Vec<BlogRow>, // insertion order doubles as creation order
}

impl Tables {
    fn creator(&self, user_id: Option<Uuid>) -> Option<Creator> {
        let id = user_id?;
        self.users.iter().find(|u| u.id == id).map(|u| Creator {
            id: u.id,
            username: u.username.clone(),
            name: u.name.clone(),
        })
    }

    fn view(&self, row: &BlogRow) -> Blog {
        Blog {
            id: row.id,
            title: row.title.clone(),
            author: row.author.clone(),
            url: row.url.clone(),
            likes: row.likes,
            user: self.creator(row.user_id),
        }
    }

    fn insert_blog(&mut self, blog: NewBlog) -> Blog {
        let row = BlogRow {
            id: Uuid::new_v4(),
            title: blog.title,
            author: blog.author,
            url: blog.url,
            likes: blog.likes,
            user_id: blog.user_id,
        };
        let view = self.view(&row);
        self.blogs.push(row);
        view
    }
}

/// Process-local store backing both users and blogs.
///
/// Used when no `DATABASE_URL` is configured and throughout the tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUsername(user.username));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            name: user.name,
            password_hash: user.password_hash,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn delete_all(&self) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        tables.users.clear();
        // mirrors ON DELETE SET NULL
        for blog in tables.blogs.iter_mut() {
            blog.user_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn list(&self) -> anyhow::Result<Vec<Blog>> {
        let tables = self.tables.read().await;
        let mut blogs: Vec<Blog> = tables.blogs.iter().map(|row| tables.view(row)).collect();
        // stable sort keeps creation order among equal likes
        blogs.sort_by(|a, b| b.likes.cmp(&a.likes));
        Ok(blogs)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Blog>> {
        let tables = self.tables.read().await;
        Ok(tables
            .blogs
            .iter()
            .find(|b| b.id == id)
            .map(|row| tables.view(row)))
    }

    async fn create(&self, blog: NewBlog) -> anyhow::Result<Blog> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_blog(blog))
    }

    async fn create_many(&self, blogs: Vec<NewBlog>) -> anyhow::Result<Vec<Blog>> {
        let mut tables = self.tables.write().await;
        Ok(blogs.into_iter().map(|b| tables.insert_blog(b)).collect())
    }

    async fn update(&self, id: Uuid, patch: BlogPatch) -> anyhow::Result<Option<Blog>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.blogs.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            row.title = title;
        }
        if let Some(author) = patch.author {
            row.author = author;
        }
        if let Some(url) = patch.url {
            row.url = url;
        }
        if let Some(likes) = patch.likes {
            row.likes = likes;
        }
        let row = row.clone();
        Ok(Some(tables.view(&row)))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.blogs.len();
        tables.blogs.retain(|b| b.id != id);
        Ok(tables.blogs.len() != before)
    }

    async fn delete_all(&self) -> anyhow::Result<()> {
        self.tables.write().await.blogs.clear();
        Ok(())
    }
}
