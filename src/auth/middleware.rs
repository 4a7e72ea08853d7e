//! Bearer-token gate for protected routes.
//!
//! Every request re-verifies the token and re-resolves the user, so a changed
//! role or a deleted account takes effect on the very next call.

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::directory::UserDirectory;
use crate::auth::token::{TokenCodec, TokenKind};
use crate::db::models::User;
use crate::error::{AppError, AuthError};
use crate::AppState;

const BEARER_PREFIX: &str = "Bearer ";

pub struct AuthGate {
    codec: TokenCodec,
    directory: Arc<dyn UserDirectory>,
}

impl AuthGate {
    pub fn new(codec: TokenCodec, directory: Arc<dyn UserDirectory>) -> Self {
        Self { codec, directory }
    }

    /// Resolve the acting user from a raw `Authorization` header value.
    ///
    /// `TokenExpired` is kept apart so clients know to refresh; every other
    /// client-side failure collapses to `Unauthorized`.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<User, AuthError> {
        let token = bearer_token(header).ok_or(AuthError::Unauthorized)?;

        let claims = match self.codec.decode(token, TokenKind::Access) {
            Ok(claims) => claims,
            Err(AuthError::TokenExpired) => return Err(AuthError::TokenExpired),
            Err(e) => {
                debug!("Rejected bearer token: {}", e);
                return Err(AuthError::Unauthorized);
            }
        };

        self.directory
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(|| {
                warn!(user_id = claims.id, "Token subject no longer exists");
                AuthError::Unauthorized
            })
    }
}

/// Exactly `Bearer <token>`, with a single non-empty token segment.
fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix(BEARER_PREFIX)?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Wraps a scope so that only authenticated requests reach it. The resolved
/// [`User`] is stored in the request extensions.
pub struct RequireAuth;

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                error!("AppState is not registered; cannot authenticate");
                let response = AppError::InternalError("missing application state".into())
                    .error_response();
                return Ok(req.into_response(response).map_into_right_body());
            };

            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            match state.gate.authenticate(header.as_deref()).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(e) => {
                    log_rejection(req.path(), &e);
                    let response = AppError::from(e).error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// The acting user of a protected handler.
///
/// Reuses the user [`RequireAuth`] already resolved; outside such a scope it
/// runs the gate itself, so single handlers can be protected by taking this
/// as an argument.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<User>().cloned() {
            return Box::pin(ready(Ok(AuthenticatedUser(user))));
        }

        let state = req.app_data::<web::Data<AppState>>().cloned();
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let path = req.path().to_owned();

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::InternalError("missing application state".into()))?;
            match state.gate.authenticate(header.as_deref()).await {
                Ok(user) => Ok(AuthenticatedUser(user)),
                Err(e) => {
                    log_rejection(&path, &e);
                    Err(e.into())
                }
            }
        })
    }
}

fn log_rejection(path: &str, err: &AuthError) {
    if err.is_server_fault() {
        error!("Authentication failed on the server side: {}", err);
    } else {
        warn!("Rejected request to {}: {}", path, err);
    }
}
