use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::middleware::AuthenticatedUser;
use crate::error::{AppError, AuthError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

fn log_auth_failure(action: &str, err: &AuthError) {
    if err.is_server_fault() {
        error!("{} failed: {}", action, err);
    } else {
        warn!("{} rejected: {}", action, err);
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request");
    match state.sessions.login(&req.email, &req.password).await {
        Ok(tokens) => Ok(HttpResponse::Ok().json(tokens)),
        Err(e) => {
            // The distinction between unknown user and wrong password stays in the log.
            log_auth_failure("Login", &e);
            Err(e.into())
        }
    }
}

pub async fn refresh(
    req: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Refreshing access token");
    match state.sessions.refresh(&req.refresh_token).await {
        Ok(tokens) => Ok(HttpResponse::Ok().json(tokens)),
        Err(e) => {
            log_auth_failure("Refresh", &e);
            Err(e.into())
        }
    }
}

pub async fn logout(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.sessions.logout(&user.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully logged out"
    })))
}

pub async fn me(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(user.0)
}
