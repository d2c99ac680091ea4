use std::sync::Arc;

use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    api::admin::AdminCredentials,
    db::admin::{Admin, DEFAULT_ADMIN_USERNAME},
    mongodb::ensure_indexes_exist,
};
use crate::store::{ElectionStore, MemoryStore, MongoStore, SharedStore};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    #[serde(default = "default_admin_username")]
    admin_username: String,
    // secrets
    jwt_secret: String,
    admin_password: String,
}

fn default_admin_username() -> String {
    DEFAULT_ADMIN_USERNAME.to_string()
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Credentials for the admin created when the store has none.
    pub fn bootstrap_admin(&self) -> AdminCredentials {
        AdminCredentials {
            username: self.admin_username.clone(),
            password: self.admin_password.clone(),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the store.
#[derive(Deserialize)]
struct StoreConfig {
    // secrets
    db_uri: Option<String>,
}

/// A fairing that sets up the store, performs any setup necessary, and places
/// a [`SharedStore`] into managed state.
///
/// By default the store is chosen from config: MongoDB if `db_uri` is set,
/// otherwise an in-memory store. A pre-built store can be supplied instead.
/// This fairing depends on [`Config`] being in managed state, and so must be
/// attached after [`ConfigFairing`].
pub struct StoreFairing {
    store: Option<SharedStore>,
}

impl StoreFairing {
    /// Choose the store from config.
    pub fn from_config() -> Self {
        Self { store: None }
    }

    /// Use the given store.
    pub fn with_store(store: SharedStore) -> Self {
        Self { store: Some(store) }
    }

    async fn connect(rocket: &Rocket<Build>) -> Option<SharedStore> {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load store config");
                rocket::config::pretty_print_error(e);
                return None;
            }
        };
        let db_uri = match config.db_uri {
            Some(db_uri) => db_uri,
            None => {
                warn!("No `db_uri` configured, using an in-memory store; nothing will persist");
                return Some(Arc::new(MemoryStore::default()));
            }
        };

        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return None;
            }
        };
        let db = client.database(&get_database_name());

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to connect to database: {e}");
            return None;
        }
        info!("...database connection online!");
        Some(Arc::new(MongoStore::new(db)))
    }
}

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let store = match &self.store {
            Some(store) => store.clone(),
            None => match Self::connect(&rocket).await {
                Some(store) => store,
                None => return Err(rocket),
            },
        };

        // Ensure there is at least one admin user.
        let credentials = match rocket.state::<Config>() {
            Some(config) => config.bootstrap_admin(),
            None => {
                error!("Config was not available when setting up the store");
                return Err(rocket);
            }
        };
        if let Err(e) = ensure_admin_exists(&*store, credentials).await {
            error!("Failed to create the bootstrap admin: {e}");
            return Err(rocket);
        }

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

/// Create the bootstrap admin if the store has no admins at all.
async fn ensure_admin_exists(
    store: &dyn ElectionStore,
    credentials: AdminCredentials,
) -> Result<(), String> {
    let count = store.admin_count().await.map_err(|e| e.to_string())?;
    if count > 0 {
        return Ok(());
    }
    let admin = Admin::try_from(credentials).map_err(|e| e.to_string())?;
    store.insert_admin(&admin).await.map_err(|e| e.to_string())?;
    warn!("Created bootstrap admin {:?}; change its password", admin.username);
    Ok(())
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "votekiosk".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}


#[cfg(test)]
mod tests {
    use super::*;

    #[rocket::async_test]
    async fn bootstrap_admin_created_once() {
        let store = MemoryStore::default();
        let credentials = Config::example().bootstrap_admin();

        ensure_admin_exists(&store, credentials.clone()).await.unwrap();
        let admin = store.admin(&credentials.username).await.unwrap().unwrap();
        assert!(admin.verify_password(&credentials.password));

        ensure_admin_exists(&store, credentials).await.unwrap();
        assert_eq!(store.admin_count().await.unwrap(), 1);
    }

    #[rocket::async_test]
    async fn weak_bootstrap_password_is_refused() {
        let store = MemoryStore::default();
        let credentials = AdminCredentials {
            username: "admin".into(),
            password: "short".into(),
        };
        assert!(ensure_admin_exists(&store, credentials).await.is_err());
        assert_eq!(store.admin_count().await.unwrap(), 0);
    }

    #[test]
    fn test_database_names_are_random() {
        assert!(get_database_name().starts_with("test"));
    }
}
