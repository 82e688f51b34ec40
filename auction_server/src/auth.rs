//! Identity extraction for incoming requests.
//!
//! Authentication itself lives upstream: the API gateway terminates sessions, verifies the caller, and forwards the
//! verified identity in the `x-cap-user-id` and `x-cap-user-kind` headers. The extractors here only read those
//! headers. Deploying this server without the gateway in front of it means trusting whatever the client sends.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use auction_engine::db_types::{CustomerId, MasterId};

use crate::errors::{AuthError, ServerError};

pub const USER_ID_HEADER: &str = "x-cap-user-id";
pub const USER_KIND_HEADER: &str = "x-cap-user-kind";

pub const KIND_MASTER: &str = "master";
pub const KIND_CUSTOMER: &str = "customer";

/// The verified identity of a master, taken from the gateway headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterClaims {
    pub master_id: MasterId,
}

/// The verified identity of a customer, taken from the gateway headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerClaims {
    pub customer_id: CustomerId,
}

fn identity_of_kind(req: &HttpRequest, expected: &str) -> Result<String, ServerError> {
    let kind = req
        .headers()
        .get(USER_KIND_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ServerError::AuthenticationError(AuthError::MissingIdentity))?;
    if kind != expected {
        return Err(ServerError::AuthenticationError(AuthError::WrongUserKind {
            expected: expected.to_string(),
            actual: kind.to_string(),
        }));
    }
    req.headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or(ServerError::AuthenticationError(AuthError::MissingIdentity))
}

impl FromRequest for MasterClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_of_kind(req, KIND_MASTER).map(|id| Self { master_id: MasterId::from(id) }))
    }
}

impl FromRequest for CustomerClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_of_kind(req, KIND_CUSTOMER).map(|id| Self { customer_id: CustomerId::from(id) }))
    }
}
