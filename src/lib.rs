#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, StoreFairing};
use crate::election::ElectionFairing;
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod election;
pub mod error;
pub mod logging;
pub mod model;
mod scheduled_task;
pub mod store;

pub use config::Config;
pub use election::Election;

/// Build the server from `Rocket.toml` and the environment.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StoreFairing::from_config())
        .attach(ElectionFairing)
}

/// Build a server for tests over the given store, with fixed secrets and
/// [`AdminCredentials::example`](model::api::admin::AdminCredentials::example)
/// as the bootstrap admin.
#[cfg(test)]
fn rocket_for_store(store: store::MemoryStore) -> Rocket<Build> {
    use std::sync::Arc;

    let admin = model::api::admin::AdminCredentials::example();
    let figment = rocket::Config::figment()
        .merge(("jwt_secret", "kiosk-test-jwt-secret"))
        .merge(("auth_ttl", 3600))
        .merge(("admin_username", admin.username))
        .merge(("admin_password", admin.password));
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StoreFairing::with_store(Arc::new(store)))
        .attach(ElectionFairing)
}
