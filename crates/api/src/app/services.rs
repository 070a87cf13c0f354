use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use custody_auth::{
    Argon2Hasher, Authenticator, CredentialStore, InMemoryCredentialStore, NewAccount,
    TokenCodec, UserAdministration,
};
use custody_infra::PostgresCredentialStore;

use crate::config::ApiConfig;

/// Domain services shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub authenticator: Authenticator,
    pub admin: UserAdministration,
}

impl AppServices {
    /// Wire services over an existing store.
    pub fn new(store: Arc<dyn CredentialStore>, config: &ApiConfig) -> Self {
        let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl);
        let authenticator = Authenticator::new(store.clone(), Arc::new(Argon2Hasher), codec);
        let admin = UserAdministration::new(store);
        Self {
            authenticator,
            admin,
        }
    }
}

/// Pick the credential store from configuration and seed the bootstrap
/// administrator when one is configured.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(url) => {
            let pg = PostgresCredentialStore::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            pg.ensure_schema()
                .await
                .context("failed to create the users table")?;
            info!("using Postgres credential store");
            Arc::new(pg)
        }
        None => {
            info!("using in-memory credential store");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let services = AppServices::new(store, config);

    if let Some(seed) = &config.bootstrap_admin {
        let account = NewAccount {
            username: &seed.username,
            email: &seed.email,
            password: &seed.password,
        };
        let created = services
            .authenticator
            .seed_admin(account, Utc::now())
            .await
            .context("failed to seed the bootstrap administrator")?;
        if created.is_none() {
            info!("accounts already exist; bootstrap administrator not seeded");
        }
    }

    Ok(services)
}
