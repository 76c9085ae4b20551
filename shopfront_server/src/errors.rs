use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use shopfront_engine::{CartApiError, OrderApiError, PaymentApiError, traits::GatewayError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
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
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The resource was modified concurrently. {0}")]
    Conflict(String),
    #[error("The payment gateway could not be reached. {0}")]
    GatewayUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    TokenExpired,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::DatabaseError(e) => Self::BackendError(e),
            CartApiError::ProductNotFound(_) | CartApiError::ItemNotFound(_) => Self::NoRecordFound(e.to_string()),
            CartApiError::InvalidQuantity(_) => Self::InvalidRequestBody(e.to_string()),
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::DatabaseError(e) => Self::BackendError(e),
            OrderApiError::OrderNotFound(_) | OrderApiError::UserNotFound(_) | OrderApiError::ProductNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            OrderApiError::VersionConflict { .. } => Self::Conflict(e.to_string()),
            OrderApiError::OrderAlreadyExists(_) | OrderApiError::OrderCreationFailed(_) => {
                Self::BackendError(e.to_string())
            },
            OrderApiError::ValidationError(_) => Self::InvalidRequestBody(e.to_string()),
        }
    }
}

impl From<PaymentApiError> for ServerError {
    fn from(e: PaymentApiError) -> Self {
        match e {
            PaymentApiError::DatabaseError(e) => Self::BackendError(e),
            PaymentApiError::OrderError(e) => e.into(),
            PaymentApiError::LedgerError(e) => Self::BackendError(e.to_string()),
            PaymentApiError::GatewayError(ref g) => match g {
                GatewayError::Timeout | GatewayError::RequestFailed(_) => Self::GatewayUnavailable(e.to_string()),
                GatewayError::UnknownStatus(_) | GatewayError::InvalidResponse(_) => Self::BackendError(e.to_string()),
            },
            PaymentApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentApiError::OwnershipMismatch { .. } => Self::InsufficientPermissions(e.to_string()),
            PaymentApiError::TamperingDetected { .. } => Self::InsufficientPermissions(e.to_string()),
        }
    }
}
