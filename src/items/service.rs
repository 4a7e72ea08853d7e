use std::sync::Arc;
use tracing::{info, warn};

use crate::db::models::{
    Item, ItemComment, ItemPayload, NewItemComment, User, UserType, SELLER_TYPE_CODE,
};
use crate::db::repository::{ItemRepository, UserRepository};
use crate::error::{AppError, DatabaseError};

pub struct ItemService {
    items: Arc<dyn ItemRepository>,
    users: Arc<dyn UserRepository>,
}

/// Only users whose type code is `SELLER` may list items.
fn can_user_add_item(user: &User, user_types: &[UserType]) -> bool {
    user_types
        .iter()
        .find(|t| t.type_code == SELLER_TYPE_CODE)
        .map(|seller| user.user_type_id == Some(seller.id))
        .unwrap_or(false)
}

impl ItemService {
    pub fn new(items: Arc<dyn ItemRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { items, users }
    }

    pub async fn list_items(&self, user: &User) -> Result<Vec<Item>, AppError> {
        Ok(self.items.list_items(user.id).await?)
    }

    pub async fn list_all_items(&self) -> Result<Vec<Item>, AppError> {
        Ok(self.items.list_all_items().await?)
    }

    pub async fn get_item(&self, id: i32, user: &User) -> Result<Item, AppError> {
        self.items
            .get_item(id, user.id)
            .await?
            .ok_or(AppError::DatabaseError(DatabaseError::NotFound))
    }

    pub async fn create_item(&self, payload: &ItemPayload, user: &User) -> Result<Item, AppError> {
        payload.validate()?;

        let user_types = self.users.list_user_types().await?;
        if !can_user_add_item(user, &user_types) {
            warn!(user_id = user.id, "User is not a seller");
            return Err(AppError::Forbidden("User is not a seller".into()));
        }

        let item = self.items.create_item(user.id, payload).await?;
        info!(item_id = item.id, user_id = user.id, "Inserted item");
        Ok(item)
    }

    pub async fn update_item(
        &self,
        id: i32,
        payload: &ItemPayload,
        user: &User,
    ) -> Result<Item, AppError> {
        payload.validate()?;

        self.items
            .update_item(id, user.id, payload)
            .await?
            .ok_or(AppError::DatabaseError(DatabaseError::NotFound))
    }

    pub async fn delete_item(&self, id: i32, user: &User) -> Result<(), AppError> {
        if self.items.delete_item(id, user.id).await? {
            Ok(())
        } else {
            Err(AppError::DatabaseError(DatabaseError::NotFound))
        }
    }

    pub async fn create_item_comment(
        &self,
        payload: &NewItemComment,
        user: &User,
    ) -> Result<ItemComment, AppError> {
        payload.validate()?;

        let comment = self.items.create_item_comment(user.id, payload).await?;
        info!(comment_id = comment.id, item_id = comment.item_id, "Inserted item comment");
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::UserRecord;
    use crate::db::MemoryStore;

    async fn setup(user_type_id: Option<i32>) -> (ItemService, User) {
        let store = Arc::new(MemoryStore::with_default_user_types());
        let user = store
            .create_user(&UserRecord {
                first_name: "Sam".into(),
                last_name: "Seller".into(),
                email: "sam@example.com".into(),
                password_hash: "hash".into(),
                user_type_id,
            })
            .await
            .unwrap();
        (ItemService::new(store.clone(), store), user)
    }

    fn lamp() -> ItemPayload {
        ItemPayload {
            title: "Lamp".into(),
            initial_price: 10.0,
            sold_price: None,
            description: Some("Brass".into()),
        }
    }

    #[tokio::test]
    async fn test_seller_can_create_item() {
        let (service, seller) = setup(Some(2)).await;
        let item = service.create_item(&lamp(), &seller).await.unwrap();

        assert_eq!(item.user_id, seller.id);
        assert_eq!(service.list_items(&seller).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_seller_is_forbidden() {
        let (service, buyer) = setup(Some(1)).await;
        assert!(matches!(
            service.create_item(&lamp(), &buyer).await,
            Err(AppError::Forbidden(_))
        ));

        let (service, untyped) = setup(None).await;
        assert!(matches!(
            service.create_item(&lamp(), &untyped).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_any_user_can_comment_on_existing_item() {
        let store = Arc::new(MemoryStore::with_default_user_types());
        let service = ItemService::new(store.clone(), store.clone());
        let seller = store
            .create_user(&UserRecord {
                first_name: "Sam".into(),
                last_name: "Seller".into(),
                email: "sam@example.com".into(),
                password_hash: "hash".into(),
                user_type_id: Some(2),
            })
            .await
            .unwrap();
        let buyer = store
            .create_user(&UserRecord {
                first_name: "Bea".into(),
                last_name: "Buyer".into(),
                email: "bea@example.com".into(),
                password_hash: "hash".into(),
                user_type_id: Some(1),
            })
            .await
            .unwrap();
        let item = service.create_item(&lamp(), &seller).await.unwrap();

        let comment = service
            .create_item_comment(
                &NewItemComment {
                    item_id: item.id,
                    comment: "Still available?".into(),
                },
                &buyer,
            )
            .await
            .unwrap();
        assert_eq!(comment.user_id, buyer.id);

        let blank = NewItemComment {
            item_id: item.id,
            comment: String::new(),
        };
        assert!(matches!(
            service.create_item_comment(&blank, &buyer).await,
            Err(AppError::ValidationError(_))
        ));

        let missing = NewItemComment {
            item_id: item.id + 100,
            comment: "Hello".into(),
        };
        assert!(matches!(
            service.create_item_comment(&missing, &buyer).await,
            Err(AppError::DatabaseError(DatabaseError::NotFound))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (service, seller) = setup(Some(2)).await;
        let item = service.create_item(&lamp(), &seller).await.unwrap();

        let updated = service
            .update_item(item.id, &ItemPayload { sold_price: Some(12.5), ..lamp() }, &seller)
            .await
            .unwrap();
        assert_eq!(updated.sold_price, Some(12.5));

        service.delete_item(item.id, &seller).await.unwrap();
        assert!(matches!(
            service.get_item(item.id, &seller).await,
            Err(AppError::DatabaseError(DatabaseError::NotFound))
        ));
    }
}
