use thiserror::Error;

#[derive(Debug, Error)]
pub enum KhaltiApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Gateway request failed: {0}")]
    RequestError(String),
    #[error("Gateway request timed out")]
    Timeout,
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Gateway rejected the request. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The gateway returned an unrecognised payment status: {0}")]
    UnknownStatus(String),
}
