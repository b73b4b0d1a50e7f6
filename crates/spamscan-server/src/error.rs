use std::io::Cursor;
use std::time::Duration;

use rocket::Request;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use thiserror::Error;

use crate::models::ErrorBody;

pub const EMPTY_CONTENT_MESSAGE: &str = "Email content cannot be empty";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Email content cannot be empty")]
    InvalidInput,
    #[error("Prediction error: {0}")]
    InferenceFailure(String),
    #[error("Prediction timed out after {}s", .0.as_secs_f64())]
    InferenceTimeout(Duration),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidInput => Status::BadRequest,
            Self::InferenceFailure(_) => Status::InternalServerError,
            Self::InferenceTimeout(_) => Status::GatewayTimeout,
        }
    }
}

/// `{"detail": ...}` JSON response with the given status.
pub fn detail_response<'r>(status: Status, detail: String) -> response::Result<'r> {
    let body = serde_json::to_string(&ErrorBody { detail })
        .map_err(|_| Status::InternalServerError)?;
    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(body.len(), Cursor::new(body))
        .ok()
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        detail_response(self.status(), self.to_string())
    }
}
