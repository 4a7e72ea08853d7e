use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub last_login_utc: DateTime<Utc>,
    pub user_type_id: Option<i32>,
}

/// Registration payload. `password` is plaintext here and hashed before storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub user_type_id: Option<i32>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.first_name.trim().is_empty() {
            return Err(AppError::ValidationError("firstName is required".into()));
        }
        if self.last_name.trim().is_empty() {
            return Err(AppError::ValidationError("lastName is required".into()));
        }
        let valid_email = self
            .email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid_email {
            return Err(AppError::ValidationError("email is invalid".into()));
        }
        if self.password.is_empty() {
            return Err(AppError::ValidationError("password is required".into()));
        }
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::ValidationError(format!(
                "password must not exceed {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        Ok(())
    }
}

/// A `NewUser` whose password has already been hashed.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub user_type_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserType {
    pub id: i32,
    pub type_name: String,
    pub type_description: String,
    pub type_code: String,
}

pub const SELLER_TYPE_CODE: &str = "SELLER";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub initial_price: f64,
    pub sold_price: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub title: String,
    pub initial_price: f64,
    pub sold_price: Option<f64>,
    pub description: Option<String>,
}

impl ItemPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::ValidationError("title is required".into()));
        }
        if self.initial_price.is_nan() || self.initial_price < 0.0 {
            return Err(AppError::ValidationError("initialPrice must not be negative".into()));
        }
        if matches!(self.sold_price, Some(price) if price.is_nan() || price < 0.0) {
            return Err(AppError::ValidationError("soldPrice must not be negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemComment {
    pub id: i32,
    pub user_id: i32,
    pub item_id: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A comment as posted by a client; the author is the acting user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItemComment {
    pub item_id: i32,
    pub comment: String,
}

impl NewItemComment {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.item_id <= 0 {
            return Err(AppError::ValidationError("itemId is required".into()));
        }
        if self.comment.trim().is_empty() {
            return Err(AppError::ValidationError("comment is required".into()));
        }
        Ok(())
    }
}
