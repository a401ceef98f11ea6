use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hashledger_core::LedgerError;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown chain {0}")]
    UnknownChain(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownChain(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ledger(err) => match err {
                LedgerError::MalformedInput(_)
                | LedgerError::InvalidTransaction { .. }
                | LedgerError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
                LedgerError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                LedgerError::IndexOutOfBounds { .. } => StatusCode::NOT_FOUND,
                LedgerError::MiningExhausted { .. } | LedgerError::MiningCancelled => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
