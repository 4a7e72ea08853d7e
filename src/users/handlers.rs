use actix_web::{web, HttpResponse};
use tracing::{error, info};

use crate::auth::AuthenticatedUser;
use crate::db::models::NewUser;
use crate::error::AppError;
use crate::AppState;

pub async fn create_user(
    req: web::Json<NewUser>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Creating user ...");
    match state.users.create_user(req.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Created().json(user)),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(e)
        }
    }
}

pub async fn list_users(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Getting users list ...");
    let users = state.users.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn list_user_types(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let types = state.users.list_user_types().await?;
    Ok(HttpResponse::Ok().json(types))
}
