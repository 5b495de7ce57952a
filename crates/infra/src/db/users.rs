use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{info, instrument};

use cafeteria_auth::{Role, UserAccount};
use cafeteria_core::UserId;

use crate::error::{StoreError, StoreResult, map_sqlx_error};

/// Login lookup result: the account plus its stored argon2 hash.
#[derive(Clone)]
pub struct StoredCredentials {
    pub account: UserAccount,
    pub password_hash: String,
}

impl core::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

/// User accounts and their role assignments. Stores hashes only; hashing
/// happens in the caller.
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user holding `role`. A taken username is a conflict.
    #[instrument(skip(self, password_hash, role), fields(role = %role), err)]
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> StoreResult<UserAccount> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let created_at = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match map_sqlx_error("create_user", e) {
            StoreError::Conflict(_) => {
                StoreError::Conflict(format!("username '{username}' is already taken"))
            }
            other => other,
        })?;

        assign_role(&mut *tx, id, &role).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(UserAccount {
            id: UserId::new(id),
            username: username.to_string(),
            created_at,
            roles: vec![role],
        })
    }

    #[instrument(skip(self), err)]
    pub async fn find_credentials(&self, username: &str) -> StoreResult<Option<StoredCredentials>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| map_sqlx_error("find_user", e))?;
        let mut account =
            account_from_row(&row).map_err(|e| map_sqlx_error("find_user", e))?;
        account.roles = self.roles_of(account.id).await?;

        Ok(Some(StoredCredentials {
            account,
            password_hash,
        }))
    }

    /// All accounts with their roles, oldest first.
    pub async fn list(&self) -> StoreResult<Vec<UserAccount>> {
        let mut accounts = sqlx::query("SELECT id, username, created_at FROM users ORDER BY id")
            .try_map(|row: SqliteRow| account_from_row(&row))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        let rows = sqlx::query(
            r#"
            SELECT ur.user_id, r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            ORDER BY r.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_user_roles", e))?;

        let mut roles: BTreeMap<i64, Vec<Role>> = BTreeMap::new();
        for row in rows {
            let user_id: i64 = row
                .try_get("user_id")
                .map_err(|e| map_sqlx_error("list_user_roles", e))?;
            let name: String = row
                .try_get("name")
                .map_err(|e| map_sqlx_error("list_user_roles", e))?;
            roles.entry(user_id).or_default().push(Role::new(name));
        }

        for account in &mut accounts {
            account.roles = roles.remove(&account.id.get()).unwrap_or_default();
        }
        Ok(accounts)
    }

    /// Create the bootstrap administrator unless the username exists.
    /// Returns whether an account was created.
    #[instrument(skip(self, password_hash), err)]
    pub async fn ensure_admin(&self, username: &str, password_hash: &str) -> StoreResult<bool> {
        if self.find_credentials(username).await?.is_some() {
            return Ok(false);
        }
        self.create(username, password_hash, Role::admin()).await?;
        info!(username, "bootstrap administrator created");
        Ok(true)
    }

    async fn roles_of(&self, id: UserId) -> StoreResult<Vec<Role>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_user_roles", e))?;
        Ok(names.into_iter().map(Role::new).collect())
    }
}

async fn assign_role(conn: &mut SqliteConnection, user_id: i64, role: &Role) -> StoreResult<()> {
    let result = sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE name = ?",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("assign_role", e))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict(format!("unknown role '{role}'")));
    }
    Ok(())
}

fn account_from_row(row: &SqliteRow) -> Result<UserAccount, sqlx::Error> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(UserAccount {
        id: UserId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        created_at,
        roles: Vec::new(),
    })
}
