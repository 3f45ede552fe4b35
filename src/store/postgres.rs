use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use super::{
    Blog, BlogPatch, BlogStore, Creator, NewBlog, NewUser, StoreError, User, UserStore,
};

const BLOG_COLUMNS: &str = r#"
    b.id, b.title, b.author, b.url, b.likes,
    u.id AS creator_id, u.username AS creator_username, u.name AS creator_name
"#;

#[derive(Debug, FromRow)]
struct BlogRow {
    id: Uuid,
    title: String,
    author: Option<String>,
    url: String,
    likes: i64,
    creator_id: Option<Uuid>,
    creator_username: Option<String>,
    creator_name: Option<String>,
}

impl From<BlogRow> for Blog {
    fn from(r: BlogRow) -> Self {
        let user = match (r.creator_id, r.creator_username, r.creator_name) {
            (Some(id), Some(username), Some(name)) => Some(Creator { id, username, name }),
            _ => None,
        };
        Self {
            id: r.id,
            title: r.title,
            author: r.author,
            url: r.url,
            likes: r.likes,
            user,
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")
    }

    async fn fetch_blog(&self, id: Uuid) -> anyhow::Result<Option<Blog>> {
        let row = sqlx::query_as::<_, BlogRow>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs b LEFT JOIN users u ON u.id = b.user_id WHERE b.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("fetch blog")?;
        Ok(row.map(Blog::from))
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, username, name, password_hash FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, name, password_hash
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await;

        match inserted {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateUsername(user.username)),
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"SELECT id, username, name, password_hash FROM users ORDER BY created_at ASC"#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn delete_all(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users")
            .execute(&self.db)
            .await
            .context("delete users")?;
        Ok(())
    }
}

#[async_trait]
impl BlogStore for PgStore {
    async fn list(&self) -> anyhow::Result<Vec<Blog>> {
        let rows = sqlx::query_as::<_, BlogRow>(&format!(
            r#"
            SELECT {BLOG_COLUMNS}
            FROM blogs b
            LEFT JOIN users u ON u.id = b.user_id
            ORDER BY b.likes DESC, b.created_at ASC
            "#
        ))
        .fetch_all(&self.db)
        .await
        .context("list blogs")?;
        Ok(rows.into_iter().map(Blog::from).collect())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Blog>> {
        self.fetch_blog(id).await
    }

    async fn create(&self, blog: NewBlog) -> anyhow::Result<Blog> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO blogs (id, title, author, url, likes, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&blog.title)
        .bind(&blog.author)
        .bind(&blog.url)
        .bind(blog.likes)
        .bind(blog.user_id)
        .execute(&self.db)
        .await
        .context("insert blog")?;

        self.fetch_blog(id)
            .await?
            .context("blog vanished right after insert")
    }

    async fn create_many(&self, blogs: Vec<NewBlog>) -> anyhow::Result<Vec<Blog>> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let mut ids = Vec::with_capacity(blogs.len());
        for blog in blogs {
            let id = Uuid::new_v4();
            // clock_timestamp() default keeps rows of one tx in insertion order
            sqlx::query(
                r#"
                INSERT INTO blogs (id, title, author, url, likes, user_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(&blog.title)
            .bind(&blog.author)
            .bind(&blog.url)
            .bind(blog.likes)
            .bind(blog.user_id)
            .execute(&mut *tx)
            .await
            .context("insert blog")?;
            ids.push(id);
        }
        tx.commit().await.context("commit tx")?;

        let mut created = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(blog) = self.fetch_blog(id).await? {
                created.push(blog);
            }
        }
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: BlogPatch) -> anyhow::Result<Option<Blog>> {
        let result = sqlx::query(
            r#"
            UPDATE blogs
               SET title  = COALESCE($2, title),
                   author = CASE WHEN $6 THEN $3 ELSE author END,
                   url    = COALESCE($4, url),
                   likes  = COALESCE($5, likes)
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.author.clone().flatten())
        .bind(patch.url)
        .bind(patch.likes)
        .bind(patch.author.is_some())
        .execute(&self.db)
        .await
        .context("update blog")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_blog(id).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete blog")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM blogs")
            .execute(&self.db)
            .await
            .context("delete blogs")?;
        Ok(())
    }
}
