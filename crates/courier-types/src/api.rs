use serde::{Deserialize, Serialize};

// -- Ingest --

/// Body of `POST /message`. Unknown extra fields are tolerated; only the
/// `message` field matters. Emptiness is checked by the handler, not serde.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
