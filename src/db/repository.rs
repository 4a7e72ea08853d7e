use async_trait::async_trait;

use crate::db::models::{
    Item, ItemComment, ItemPayload, NewItemComment, User, UserRecord, UserType,
};
use crate::error::DatabaseError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DatabaseError::Duplicate` when the email is taken.
    async fn create_user(&self, user: &UserRecord) -> Result<User, DatabaseError>;
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
    async fn list_user_types(&self) -> Result<Vec<UserType>, DatabaseError>;
}

/// Item access is scoped to the owning user except for `list_all_items` and
/// commenting.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn list_items(&self, user_id: i32) -> Result<Vec<Item>, DatabaseError>;
    async fn list_all_items(&self) -> Result<Vec<Item>, DatabaseError>;
    async fn get_item(&self, id: i32, user_id: i32) -> Result<Option<Item>, DatabaseError>;
    async fn create_item(&self, user_id: i32, item: &ItemPayload) -> Result<Item, DatabaseError>;
    async fn update_item(
        &self,
        id: i32,
        user_id: i32,
        item: &ItemPayload,
    ) -> Result<Option<Item>, DatabaseError>;
    /// Returns whether a row was deleted.
    async fn delete_item(&self, id: i32, user_id: i32) -> Result<bool, DatabaseError>;
    /// Any user may comment on any item. Fails with `DatabaseError::NotFound`
    /// when the item does not exist.
    async fn create_item_comment(
        &self,
        user_id: i32,
        comment: &NewItemComment,
    ) -> Result<ItemComment, DatabaseError>;
}
