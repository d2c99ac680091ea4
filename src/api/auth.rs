use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    model::api::{
        admin::AdminCredentials,
        auth::{AuthToken, AUTH_TOKEN_COOKIE},
    },
    store::SharedStore,
};

pub fn routes() -> Vec<Route> {
    routes![authenticate, logout]
}

/// Sign in as an admin. The JWT is set as a cookie and also returned as the body,
/// for clients that prefer a bearer header.
#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    store: &State<SharedStore>,
    config: &State<Config>,
) -> Result<String> {
    let admin = store
        .admin(&credentials.username)
        .await
        .map_err(Error::persistence("look up admin"))?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::Unauthorized(
                "No admin found with the provided username and password combination.".to_string(),
            )
        })?;

    let jwt = AuthToken::new(&admin).encode(config)?;
    cookies.add(AuthToken::cookie(jwt.clone(), config));
    info!("Admin {} signed in", admin.username);

    Ok(jwt)
}

#[post("/auth/logout")]
pub fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}
