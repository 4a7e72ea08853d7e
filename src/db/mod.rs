//! Persistence for users, user types, items and refresh tokens.
//!
//! `DbOperations` talks to Postgres through sqlx; `MemoryStore` keeps the
//! same contracts in process for tests and local runs.

pub mod memory;
pub mod models;
pub mod operations;
pub mod repository;

pub use memory::MemoryStore;
pub use models::{Item, ItemComment, ItemPayload, NewItemComment, NewUser, User, UserRecord, UserType};
pub use operations::DbOperations;
pub use repository::{ItemRepository, UserRepository};
