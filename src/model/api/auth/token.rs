use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::db::admin::Admin;
use crate::store::SharedStore;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token granting admin rights to a specific admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "sub")]
    pub username: String,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given admin.
    pub fn new(admin: &Admin) -> Self {
        Self {
            username: admin.username.clone(),
        }
    }

    /// Encode this token as a signed JWT that expires after the configured lifetime.
    pub fn encode(&self, config: &Config) -> Result<String, Error> {
        let claims = Claims {
            token: self.clone(),
            expire_at: Utc::now() + config.auth_ttl(),
        };
        let jwt = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;
        Ok(jwt)
    }

    /// Wrap an encoded token in a cookie.
    pub fn cookie(jwt: String, config: &Config) -> Cookie<'static> {
        Cookie::build(AUTH_TOKEN_COOKIE, jwt)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Decode and validate a JWT.
    pub fn decode(jwt: &str, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            jwt,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// JWT claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// Pull the raw JWT from the auth cookie, falling back to a bearer header.
fn raw_token(req: &Request<'_>) -> Option<String> {
    if let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get_one("Authorization")
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|jwt| jwt.trim().to_string())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the request and check the admin it names still exists.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let unauthorized = |msg: &str| -> Outcome<Self, Self::Error> {
            Outcome::Failure((Status::Unauthorized, Error::Unauthorized(msg.into())))
        };

        let config = match req.guard::<&State<Config>>().await {
            Outcome::Success(config) => config,
            _ => {
                let err = Error::Unauthorized("authentication is not configured".into());
                return Outcome::Failure((Status::InternalServerError, err));
            }
        };

        let jwt = match raw_token(req) {
            Some(jwt) => jwt,
            None => return unauthorized("missing auth token"),
        };

        let token = match Self::decode(&jwt, config) {
            Ok(token) => token,
            Err(e) => {
                debug!("Rejecting auth token: {e}");
                return unauthorized("invalid auth token");
            }
        };

        // Check the admin actually exists.
        let store = match req.guard::<&State<SharedStore>>().await {
            Outcome::Success(store) => store,
            _ => {
                let err = Error::Unauthorized("store is not available".into());
                return Outcome::Failure((Status::InternalServerError, err));
            }
        };
        match store.admin(&token.username).await {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => unauthorized("unknown admin"),
            Err(e) => Outcome::Failure((
                Status::ServiceUnavailable,
                Error::persistence("look up admin")(e),
            )),
        }
    }
}
