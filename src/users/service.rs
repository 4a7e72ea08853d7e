use std::sync::Arc;
use tracing::info;

use crate::auth::PasswordHasher;
use crate::db::models::{NewUser, User, UserRecord, UserType};
use crate::db::repository::UserRepository;
use crate::error::{AppError, AuthError};

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { repo, hasher }
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        new_user.validate()?;

        if let Some(type_id) = new_user.user_type_id {
            let known = self.repo.list_user_types().await?;
            if !known.iter().any(|t| t.id == type_id) {
                return Err(AppError::ValidationError(format!(
                    "userTypeId {} does not exist",
                    type_id
                )));
            }
        }

        let hasher = self.hasher;
        let NewUser {
            first_name,
            last_name,
            email,
            password,
            user_type_id,
        } = new_user;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;

        let user = self
            .repo
            .create_user(&UserRecord {
                first_name,
                last_name,
                email,
                password_hash,
                user_type_id,
            })
            .await?;

        info!(user_id = user.id, "Created user");
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.list_users().await?)
    }

    pub async fn list_user_types(&self) -> Result<Vec<UserType>, AppError> {
        Ok(self.repo.list_user_types().await?)
    }
}
