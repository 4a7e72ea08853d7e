use actix_web::{web, HttpResponse};
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::db::models::{ItemPayload, NewItemComment};
use crate::error::AppError;
use crate::AppState;

pub async fn list_items(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Getting items list ...");
    let items = state.items.list_items(&user.0).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn list_all_items(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let items = state.items.list_all_items().await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn get_item(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let item = state.items.get_item(path.into_inner(), &user.0).await?;
    Ok(HttpResponse::Ok().json(item))
}

pub async fn create_item(
    req: web::Json<ItemPayload>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Creating item ...");
    let item = state.items.create_item(&req, &user.0).await?;
    Ok(HttpResponse::Created().json(item))
}

pub async fn update_item(
    path: web::Path<i32>,
    req: web::Json<ItemPayload>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    info!("Update item with id: {}", id);
    let item = state.items.update_item(id, &req, &user.0).await?;
    Ok(HttpResponse::Ok().json(item))
}

pub async fn delete_item(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    info!("Delete item with id: {}", id);
    state.items.delete_item(id, &user.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn create_item_comment(
    req: web::Json<NewItemComment>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Creating item comment ...");
    let comment = state.items.create_item_comment(&req, &user.0).await?;
    Ok(HttpResponse::Created().json(comment))
}
