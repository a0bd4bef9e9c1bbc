use axum::http::header::InvalidHeaderValue;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid CORS origin: {0}")]
    InvalidOrigin(#[from] InvalidHeaderValue),
}

/// Errors of a single client connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Ws(#[from] axum::Error),
    #[error("connection closed")]
    Closed,
}
