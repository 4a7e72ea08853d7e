//! Session management: password checks, signed tokens, refresh rotation and
//! the bearer-token gate for protected routes.

pub mod directory;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

pub use directory::{RefreshTokenStore, UserDirectory};
pub use middleware::{AuthGate, AuthenticatedUser, RequireAuth};
pub use password::PasswordHasher;
pub use service::{SessionService, TokenPair};
pub use token::{Claims, TokenCodec, TokenKind};
