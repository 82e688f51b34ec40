use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use auction_engine::AuctionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Engine(#[from] AuctionError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingIdentity => StatusCode::UNAUTHORIZED,
                AuthError::WrongUserKind { .. } => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Engine(e) => engine_status_code(e),
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

/// Maps the engine's error taxonomy onto HTTP status codes. Malformed input is a 400, permission and policy refusals
/// are 403s, state conflicts are 409s, and a wallet that cannot cover a settlement is literally 402 Payment Required.
fn engine_status_code(e: &AuctionError) -> StatusCode {
    match e {
        AuctionError::InvalidAmount(_) | AuctionError::InvalidDuration(_) => StatusCode::BAD_REQUEST,
        AuctionError::OrderNotFound(_) | AuctionError::BidNotFound(_) | AuctionError::CommissionNotFound(_) => {
            StatusCode::NOT_FOUND
        },
        AuctionError::UnpaidCommissionsExist { .. } |
        AuctionError::NotBidOwner { .. } |
        AuctionError::NotOrderOwner { .. } |
        AuctionError::NotAssignedMaster { .. } => StatusCode::FORBIDDEN,
        AuctionError::OrderNotInAuction { .. } |
        AuctionError::InvalidDeliveryState { .. } |
        AuctionError::InvalidOrderTransition { .. } |
        AuctionError::CommissionAlreadySettled { .. } => StatusCode::CONFLICT,
        AuctionError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
        AuctionError::SettlementFailed(_) | AuctionError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No verified identity was attached to the request.")]
    MissingIdentity,
    #[error("This endpoint is for {expected} accounts, but the request was made by a {actual}.")]
    WrongUserKind { expected: String, actual: String },
}
