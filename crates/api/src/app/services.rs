//! Service wiring: the pool, every store, the ledger and the token codec.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use cafeteria_auth::{
    Credentials, Hs256Jwt, IssuedToken, PasswordError, Role, TokenValidationError, UserAccount,
    hash_password, verify_password,
};
use cafeteria_core::DomainError;
use cafeteria_infra::{
    DishIngredientStore, DishStore, InventoryLedger, MenuStore, OrderStore, ProductStore,
    StoreError, TableStore, UnitStore, UserStore, connect,
};

use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum ServiceInitError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("bootstrap admin: {0}")]
    Password(#[from] PasswordError),

    #[error("password worker failed: {0}")]
    Worker(String),
}

/// Register/login failures.
#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("token issue failed: {0}")]
    Token(#[from] TokenValidationError),

    #[error("password worker failed: {0}")]
    Worker(String),
}

pub struct AppServices {
    pub units: UnitStore,
    pub products: ProductStore,
    pub dishes: DishStore,
    pub ingredients: DishIngredientStore,
    pub menu: MenuStore,
    pub tables: TableStore,
    pub orders: OrderStore,
    pub users: UserStore,
    pub ledger: InventoryLedger,
    pub jwt: Arc<Hs256Jwt>,
}

pub async fn build_services(config: &ApiConfig) -> Result<AppServices, ServiceInitError> {
    let pool = connect(&config.database).await?;

    let services = AppServices {
        units: UnitStore::new(pool.clone()),
        products: ProductStore::new(pool.clone()),
        dishes: DishStore::new(pool.clone()),
        ingredients: DishIngredientStore::new(pool.clone()),
        menu: MenuStore::new(pool.clone()),
        tables: TableStore::new(pool.clone()),
        orders: OrderStore::new(pool.clone()),
        users: UserStore::new(pool.clone()),
        ledger: InventoryLedger::new(pool),
        jwt: Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.token_ttl)),
    };

    if let Some(admin) = &config.bootstrap_admin {
        let password = admin.password.clone();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceInitError::Worker(e.to_string()))??;
        services.users.ensure_admin(&admin.username, &hash).await?;
    }

    info!("services ready");
    Ok(services)
}

impl AppServices {
    /// Create an account with the `user` role.
    #[instrument(skip(self, credentials), err)]
    pub async fn register(&self, credentials: Credentials) -> Result<UserAccount, AuthFlowError> {
        let Credentials { username, password } = credentials.validate()?;

        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthFlowError::Worker(e.to_string()))??;

        let account = self.users.create(&username, &hash, Role::user()).await?;
        info!(user_id = %account.id, "user registered");
        Ok(account)
    }

    /// Check a username/password pair and issue a bearer token.
    #[instrument(skip(self, credentials), err)]
    pub async fn login(&self, credentials: Credentials) -> Result<IssuedToken, AuthFlowError> {
        let Credentials { username, password } = credentials;
        let Some(stored) = self.users.find_credentials(username.trim()).await? else {
            warn!("login for unknown user");
            return Err(AuthFlowError::InvalidCredentials);
        };

        let hash = stored.password_hash;
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthFlowError::Worker(e.to_string()))??;
        if !matches {
            warn!(user_id = %stored.account.id, "login with wrong password");
            return Err(AuthFlowError::InvalidCredentials);
        }

        let account = stored.account;
        let issued = self
            .jwt
            .issue(account.id, &account.username, account.roles, Utc::now())?;
        Ok(issued)
    }
}
