use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder, Response},
    Request,
};
use thiserror::Error;

use crate::model::common::{department::ClassificationError, election::VoterId};
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input; rejected before anything is touched.
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    InvalidAffiliation(#[from] ClassificationError),
    #[error("Election is not open for voting")]
    ElectionClosed,
    #[error("Voter {0} has already voted")]
    AlreadyVoted(VoterId),
    #[error("Voter {0} is not registered")]
    VoterNotFound(VoterId),
    #[error("No election window has been set")]
    NotConfigured,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    /// The store failed; transient from the caller's point of view.
    #[error("Failed to {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Wrap a store error with the name of the operation that failed,
    /// for use with `map_err`.
    pub fn persistence(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Persistence { operation, source }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::BadRequest(_) => Status::BadRequest,
            Self::InvalidAffiliation(_) => Status::UnprocessableEntity,
            Self::ElectionClosed => Status::Forbidden,
            Self::AlreadyVoted(_) | Self::Conflict(_) => Status::Conflict,
            Self::VoterNotFound(_) | Self::NotConfigured | Self::NotFound(_) => Status::NotFound,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Persistence { .. } => Status::ServiceUnavailable,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.class() == StatusClass::ServerError {
            error!("{self}");
        } else {
            debug!("Rejecting request: {self}");
        }
        Response::build_from(self.to_string().respond_to(req)?)
            .status(status)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_errors_name_the_operation() {
        let err = Error::persistence("record vote")(StoreError::Unavailable("down".into()));
        assert_eq!(err.to_string(), "Failed to record vote: store unavailable: down");
        assert_eq!(err.status(), Status::ServiceUnavailable);
    }

    #[test]
    fn state_errors_map_to_client_statuses() {
        assert_eq!(Error::ElectionClosed.status(), Status::Forbidden);
        assert_eq!(Error::AlreadyVoted("x".into()).status(), Status::Conflict);
        assert_eq!(Error::VoterNotFound("x".into()).status(), Status::NotFound);
        assert_eq!(
            Error::from(ClassificationError("law".into())).status(),
            Status::UnprocessableEntity
        );
    }
}
