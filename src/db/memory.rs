use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::directory::{RefreshTokenStore, UserDirectory};
use crate::db::models::{
    Item, ItemComment, ItemPayload, NewItemComment, User, UserRecord, UserType, SELLER_TYPE_CODE,
};
use crate::db::repository::{ItemRepository, UserRepository};
use crate::error::DatabaseError;

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    user_types: Vec<UserType>,
    items: Vec<Item>,
    item_comments: Vec<ItemComment>,
    /// Current refresh token per user id.
    refresh_tokens: HashMap<i32, String>,
    next_user_id: i32,
    next_item_id: i32,
    next_comment_id: i32,
}

/// Process-local backend with the same contracts as the Postgres one.
///
/// Every write happens under a single write lock, so refresh-token upserts
/// and rotations for one user are serialized.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the same user types the SQL migration inserts.
    pub fn with_default_user_types() -> Self {
        let state = MemoryState {
            user_types: vec![
                UserType {
                    id: 1,
                    type_name: "Buyer".into(),
                    type_description: "Can browse and bid on items".into(),
                    type_code: "BUYER".into(),
                },
                UserType {
                    id: 2,
                    type_name: "Seller".into(),
                    type_description: "Can list items for sale".into(),
                    type_code: SELLER_TYPE_CODE.into(),
                },
            ],
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn refresh_token_for(&self, user_id: i32) -> Option<String> {
        let state = self.state.read().await;
        state.refresh_tokens.get(&user_id).cloned()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_owner_of_refresh_token(&self, token: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        let owner = state
            .refresh_tokens
            .iter()
            .find(|(_, current)| current.as_str() == token)
            .map(|(user_id, _)| *user_id);

        Ok(owner.and_then(|id| state.users.iter().find(|u| u.id == id).cloned()))
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn upsert(&self, user_id: i32, token: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        state.refresh_tokens.insert(user_id, token.to_string());
        Ok(())
    }

    async fn rotate(&self, user_id: i32, current: &str, next: &str) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        match state.refresh_tokens.get_mut(&user_id) {
            Some(stored) if stored.as_str() == current => {
                *stored = next.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(&self, user_id: i32) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        state.refresh_tokens.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &UserRecord) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate);
        }

        state.next_user_id += 1;
        let created = User {
            id: state.next_user_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            last_login_utc: Utc::now(),
            user_type_id: user.user_type_id,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.state.read().await.users.clone())
    }

    async fn list_user_types(&self) -> Result<Vec<UserType>, DatabaseError> {
        Ok(self.state.read().await.user_types.clone())
    }
}

#[async_trait]
impl ItemRepository for MemoryStore {
    async fn list_items(&self, user_id: i32) -> Result<Vec<Item>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.items.iter().filter(|i| i.user_id == user_id).cloned().collect())
    }

    async fn list_all_items(&self) -> Result<Vec<Item>, DatabaseError> {
        Ok(self.state.read().await.items.clone())
    }

    async fn get_item(&self, id: i32, user_id: i32) -> Result<Option<Item>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .find(|i| i.id == id && i.user_id == user_id)
            .cloned())
    }

    async fn create_item(&self, user_id: i32, item: &ItemPayload) -> Result<Item, DatabaseError> {
        let mut state = self.state.write().await;
        state.next_item_id += 1;
        let created = Item {
            id: state.next_item_id,
            user_id,
            title: item.title.clone(),
            initial_price: item.initial_price,
            sold_price: item.sold_price,
            description: item.description.clone(),
        };
        state.items.push(created.clone());
        Ok(created)
    }

    async fn update_item(
        &self,
        id: i32,
        user_id: i32,
        item: &ItemPayload,
    ) -> Result<Option<Item>, DatabaseError> {
        let mut state = self.state.write().await;
        let Some(existing) = state
            .items
            .iter_mut()
            .find(|i| i.id == id && i.user_id == user_id)
        else {
            return Ok(None);
        };

        existing.title = item.title.clone();
        existing.initial_price = item.initial_price;
        existing.sold_price = item.sold_price;
        existing.description = item.description.clone();
        Ok(Some(existing.clone()))
    }

    async fn delete_item(&self, id: i32, user_id: i32) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.items.len();
        state.items.retain(|i| !(i.id == id && i.user_id == user_id));
        let deleted = state.items.len() < before;
        if deleted {
            state.item_comments.retain(|c| c.item_id != id);
        }
        Ok(deleted)
    }

    async fn create_item_comment(
        &self,
        user_id: i32,
        comment: &NewItemComment,
    ) -> Result<ItemComment, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.items.iter().any(|i| i.id == comment.item_id) {
            return Err(DatabaseError::NotFound);
        }

        state.next_comment_id += 1;
        let created = ItemComment {
            id: state.next_comment_id,
            user_id,
            item_id: comment.item_id,
            comment: comment.comment.clone(),
            created_at: Utc::now(),
        };
        state.item_comments.push(created.clone());
        Ok(created)
    }
}
