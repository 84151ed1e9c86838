pub mod auth;
mod sqlite_user_store;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, TarangHasher, UsernamePasswordCredentials};
pub use sqlite_user_store::SqliteUserStore;
pub use user_store::UserStore;

pub type UserId = i64;
