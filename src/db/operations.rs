use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::directory::{RefreshTokenStore, UserDirectory};
use crate::db::models::{
    Item, ItemComment, ItemPayload, NewItemComment, User, UserRecord, UserType,
};
use crate::db::repository::{ItemRepository, UserRepository};
use crate::error::DatabaseError;

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password_hash, last_login_utc, user_type_id";
const ITEM_COLUMNS: &str = "id, user_id, title, initial_price, sold_price, description";

pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for DbOperations {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn find_owner_of_refresh_token(&self, token: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.first_name, u.last_name, u.email, u.password_hash, u.last_login_utc, u.user_type_id
            FROM users u
            JOIN refresh_tokens rt ON u.id = rt.user_id
            WHERE rt.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl RefreshTokenStore for DbOperations {
    async fn upsert(&self, user_id: i32, token: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, created_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE
            SET token = EXCLUDED.token, created_at = now()
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn rotate(&self, user_id: i32, current: &str, next: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET token = $3, created_at = now()
            WHERE user_id = $1 AND token = $2
            "#,
        )
        .bind(user_id)
        .bind(current)
        .bind(next)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(&self, user_id: i32) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}

#[async_trait]
impl UserRepository for DbOperations {
    async fn create_user(&self, user: &UserRecord) -> Result<User, DatabaseError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, last_login_utc, user_type_id)
            VALUES ($1, $2, $3, $4, now(), $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.user_type_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(created)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(users)
    }

    async fn list_user_types(&self) -> Result<Vec<UserType>, DatabaseError> {
        let types = sqlx::query_as::<_, UserType>(
            "SELECT id, type_name, type_description, type_code FROM user_types ORDER BY id",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(types)
    }
}

#[async_trait]
impl ItemRepository for DbOperations {
    async fn list_items(&self, user_id: i32) -> Result<Vec<Item>, DatabaseError> {
        let items = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(items)
    }

    async fn list_all_items(&self) -> Result<Vec<Item>, DatabaseError> {
        let items = sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(items)
    }

    async fn get_item(&self, id: i32, user_id: i32) -> Result<Option<Item>, DatabaseError> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(item)
    }

    async fn create_item(&self, user_id: i32, item: &ItemPayload) -> Result<Item, DatabaseError> {
        let created = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (user_id, title, initial_price, sold_price, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&item.title)
        .bind(item.initial_price)
        .bind(item.sold_price)
        .bind(&item.description)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(created)
    }

    async fn update_item(
        &self,
        id: i32,
        user_id: i32,
        item: &ItemPayload,
    ) -> Result<Option<Item>, DatabaseError> {
        let updated = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET title = $3, initial_price = $4, sold_price = $5, description = $6
            WHERE id = $1 AND user_id = $2
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&item.title)
        .bind(item.initial_price)
        .bind(item.sold_price)
        .bind(&item.description)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(updated)
    }

    async fn delete_item(&self, id: i32, user_id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_item_comment(
        &self,
        user_id: i32,
        comment: &NewItemComment,
    ) -> Result<ItemComment, DatabaseError> {
        let created = sqlx::query_as::<_, ItemComment>(
            r#"
            INSERT INTO item_comments (user_id, item_id, comment, created_at)
            VALUES ($1, $2, $3, now())
            RETURNING id, user_id, item_id, comment, created_at
            "#,
        )
        .bind(user_id)
        .bind(comment.item_id)
        .bind(&comment.comment)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(created)
    }
}
