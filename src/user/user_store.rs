use super::auth::{AuthToken, AuthTokenValue, UsernamePasswordCredentials};
use super::UserId;
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a new user and returns the user id. Fails when the handle or
    /// email is already taken.
    fn create_user(&self, handle: &str, email: &str) -> Result<UserId>;

    /// Returns a user's id given the handle.
    /// Returns None if the user does not exist.
    fn get_user_id(&self, handle: &str) -> Option<UserId>;

    /// Returns a user's handle given the user id.
    /// Returns None if the user does not exist.
    fn get_user_handle(&self, user_id: UserId) -> Option<String>;

    /// Returns whether a user with this email already exists.
    fn email_exists(&self, email: &str) -> bool;

    /// Returns the password credentials for the given handle.
    /// Returns None if the user has none.
    fn get_password_credentials(&self, handle: &str) -> Option<UsernamePasswordCredentials>;

    /// Inserts or replaces a user's password credentials.
    fn set_password_credentials(&self, credentials: &UsernamePasswordCredentials) -> Result<()>;

    /// Returns an auth token given its value.
    /// Returns None if the token does not exist.
    fn get_auth_token(&self, value: &AuthTokenValue) -> Option<AuthToken>;

    /// Adds a new auth token.
    fn add_auth_token(&self, token: &AuthToken) -> Result<()>;

    /// Deletes an auth token given its value.
    /// Returns None if the token does not exist.
    fn delete_auth_token(&self, value: &AuthTokenValue) -> Option<AuthToken>;

    /// Stamps an auth token with the latest usage timestamp.
    fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()>;
}
