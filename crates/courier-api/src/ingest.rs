use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use courier_types::api::{ErrorResponse, PostMessageRequest, StatusResponse};
use courier_types::models::InboundMessage;

use crate::AppState;
use crate::coordinator::RequestResult;

const INVALID_REQUEST: &str = "Invalid request. 'message' field required.";
const STORE_FAILED: &str = "Database operation failed.";
const STORE_UNCONFIGURED: &str = "Database not configured.";

/// Liveness probe. Says nothing about collaborator health, only that the
/// process is serving.
pub async fn health() -> Response {
    info!("health check requested");
    Json(StatusResponse {
        status: "ok".to_string(),
    })
    .into_response()
}

/// `POST /message`: validate, run the dual write once, map the result.
///
/// The `Result` extractor routes malformed bodies and missing fields through
/// the same 400 as an empty `message`, and the coordinator is never invoked
/// for any of them.
pub async fn post_message(
    State(coordinator): State<AppState>,
    body: Result<Json<PostMessageRequest>, JsonRejection>,
) -> Response {
    let message = match body {
        Ok(Json(req)) if !req.message.is_empty() => InboundMessage::new(req.message),
        Ok(_) => {
            warn!("received message with empty content");
            return error_response(StatusCode::BAD_REQUEST, INVALID_REQUEST);
        }
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "received invalid message format");
            return error_response(StatusCode::BAD_REQUEST, INVALID_REQUEST);
        }
    };

    info!(content = %message.content, "received message");

    match coordinator.process(&message).await {
        RequestResult::Accepted => (
            StatusCode::CREATED,
            Json(StatusResponse {
                status: "message processed".to_string(),
            }),
        )
            .into_response(),
        RequestResult::StoreFailure => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, STORE_FAILED)
        }
        RequestResult::StoreUnconfigured => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, STORE_UNCONFIGURED)
        }
    }
}

fn error_response(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
