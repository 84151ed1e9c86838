use crate::sqlite_persistence::{open_versioned, Table, VersionedSchema};
use crate::user::auth::{AuthToken, AuthTokenValue, TarangHasher, UsernamePasswordCredentials};
use crate::user::{UserId, UserStore};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
    time::SystemTime,
};
use tracing::warn;

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    schema: "CREATE TABLE user (id INTEGER PRIMARY KEY, handle TEXT NOT NULL UNIQUE, email TEXT NOT NULL UNIQUE, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &["CREATE INDEX user_handle_index ON user (handle);"],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    schema: "CREATE TABLE auth_token (user_id INTEGER NOT NULL REFERENCES user (id) ON DELETE CASCADE, value TEXT NOT NULL UNIQUE, created INTEGER DEFAULT (cast(strftime('%s','now') as int)), last_used INTEGER);",
    indices: &["CREATE INDEX auth_token_value_index ON auth_token (value);"],
};
const USER_PASSWORD_CREDENTIALS_V_0: Table = Table {
    name: "user_password_credentials",
    schema: "CREATE TABLE user_password_credentials (user_id INTEGER NOT NULL UNIQUE REFERENCES user (id) ON DELETE CASCADE, salt TEXT NOT NULL, hash TEXT NOT NULL, hasher TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &[],
};

const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
        USER_PASSWORD_CREDENTIALS_V_0,
    ],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, USER_VERSIONED_SCHEMAS)
            .context("Failed to open user database")?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn system_time_from_column_result(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(value as u64)
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, handle: &str, email: &str) -> Result<UserId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user (handle, email) VALUES (?1, ?2)",
            params![handle, email],
        )
        .with_context(|| format!("Failed to create user {}", handle))?;
        Ok(conn.last_insert_rowid())
    }

    fn get_user_id(&self, handle: &str) -> Option<UserId> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id FROM user WHERE handle = ?1",
            params![handle],
            |row| row.get(0),
        )
        .ok()
    }

    fn get_user_handle(&self, user_id: UserId) -> Option<String> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT handle FROM user WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .ok()
    }

    fn email_exists(&self, email: &str) -> bool {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM user WHERE email = ?1",
            params![email],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count > 0)
        .unwrap_or(false)
    }

    fn get_password_credentials(&self, handle: &str) -> Option<UsernamePasswordCredentials> {
        let user_id = self.get_user_id(handle)?;
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT salt, hash, hasher FROM user_password_credentials WHERE user_id = ?1",
            params![user_id],
            |row| {
                let hasher_tag: String = row.get(2)?;
                let hasher = match TarangHasher::from_str(&hasher_tag) {
                    Ok(hasher) => hasher,
                    Err(_) => {
                        warn!("Unknown hasher '{}' for user {}", hasher_tag, user_id);
                        return Err(rusqlite::Error::InvalidQuery);
                    }
                };
                Ok(UsernamePasswordCredentials {
                    user_id,
                    salt: row.get(0)?,
                    hash: row.get(1)?,
                    hasher,
                })
            },
        )
        .ok()
    }

    fn set_password_credentials(&self, credentials: &UsernamePasswordCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (user_id) DO UPDATE SET salt = ?2, hash = ?3, hasher = ?4",
            params![
                credentials.user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string()
            ],
        )?;
        Ok(())
    }

    fn get_auth_token(&self, value: &AuthTokenValue) -> Option<AuthToken> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
            params![value.0],
            |row| {
                Ok(AuthToken {
                    user_id: row.get(0)?,
                    value: AuthTokenValue(row.get(1)?),
                    created: system_time_from_column_result(row.get(2)?),
                    last_used: row
                        .get::<_, Option<i64>>(3)?
                        .map(system_time_from_column_result),
                })
            },
        )
        .ok()
    }

    fn add_auth_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_token (user_id, value) VALUES (?1, ?2)",
            params![token.user_id, token.value.0],
        )?;
        Ok(())
    }

    fn delete_auth_token(&self, value: &AuthTokenValue) -> Option<AuthToken> {
        let token = self.get_auth_token(value)?;
        let conn = self.conn.lock().unwrap();
        match conn.execute("DELETE FROM auth_token WHERE value = ?1", params![value.0]) {
            Ok(_) => Some(token),
            Err(_) => None,
        }
    }

    fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE auth_token SET last_used = cast(strftime('%s','now') as int) WHERE value = ?1",
            params![value.0],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteUserStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteUserStore::new(temp_dir.path().join("users.db")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_create_user() {
        let (store, _temp_dir) = create_tmp_store();

        let user_id = store.create_user("test_user", "test@example.com").unwrap();
        assert_eq!(store.get_user_id("test_user"), Some(user_id));
        assert_eq!(store.get_user_handle(user_id).as_deref(), Some("test_user"));

        let duplicate = store.create_user("test_user", "other@example.com");
        assert!(duplicate.is_err());

        let duplicate_email = store.create_user("other_user", "test@example.com");
        assert!(duplicate_email.is_err());
        assert!(store.email_exists("test@example.com"));
    }

    #[test]
    fn password_credentials_roundtrip() {
        let (store, _temp_dir) = create_tmp_store();
        let user_id = store.create_user("test_user", "test@example.com").unwrap();

        assert!(store.get_password_credentials("test_user").is_none());

        let credentials = UsernamePasswordCredentials::from_password(user_id, "pw").unwrap();
        store.set_password_credentials(&credentials).unwrap();

        let loaded = store.get_password_credentials("test_user").unwrap();
        assert!(loaded.verify("pw").unwrap());

        // Replacing credentials invalidates the old password.
        let replacement = UsernamePasswordCredentials::from_password(user_id, "new_pw").unwrap();
        store.set_password_credentials(&replacement).unwrap();
        let loaded = store.get_password_credentials("test_user").unwrap();
        assert!(!loaded.verify("pw").unwrap());
        assert!(loaded.verify("new_pw").unwrap());
    }

    #[test]
    fn auth_token_lifecycle() {
        let (store, _temp_dir) = create_tmp_store();
        let user_id = store.create_user("test_user", "test@example.com").unwrap();

        let token = AuthToken {
            user_id,
            created: SystemTime::now(),
            last_used: None,
            value: AuthTokenValue::generate(),
        };
        store.add_auth_token(&token).unwrap();

        let loaded = store.get_auth_token(&token.value).unwrap();
        assert_eq!(loaded.user_id, user_id);

        store.touch_auth_token(&token.value).unwrap();
        assert!(store.get_auth_token(&token.value).unwrap().last_used.is_some());

        assert!(store.delete_auth_token(&token.value).is_some());
        assert!(store.get_auth_token(&token.value).is_none());
        assert!(store.delete_auth_token(&token.value).is_none());
    }
}
