use std::sync::Arc;

use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Catcher, Request, Route, State};
use tracing::info;

use crate::error::{ApiError, detail_response};
use crate::models::{PredictRequest, PredictionResponse, StatusResponse};
use crate::service::InferenceService;

/// Shared by JSON syntax and shape errors; both answer 422.
pub const INVALID_BODY_MESSAGE: &str =
    "Request body must be a JSON object with a string `email_content` field";

#[get("/")]
fn index() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Spam Email Detector API is running".into(),
    })
}

#[post("/predict", data = "<req>")]
async fn predict(
    service: &State<Arc<InferenceService>>,
    req: Json<PredictRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let content = req.into_inner().email_content;
    let response = service.inner().classify_async(content).await?;
    info!(
        is_spam = response.is_spam,
        confidence = response.confidence,
        content_length = response.details.content_length,
        "prediction served"
    );
    Ok(Json(response))
}

pub fn routes() -> Vec<Route> {
    routes![index, predict]
}

/// Catchers must return a `Responder`; this hands back an already-built response.
struct Prebuilt(response::Result<'static>);

impl<'r> Responder<'r, 'static> for Prebuilt {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        self.0
    }
}

#[catch(400)]
fn bad_request(_: &Request<'_>) -> Prebuilt {
    Prebuilt(detail_response(
        Status::UnprocessableEntity,
        INVALID_BODY_MESSAGE.into(),
    ))
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Prebuilt {
    Prebuilt(detail_response(
        Status::NotFound,
        format!("Not found: {}", req.uri().path()),
    ))
}

#[catch(422)]
fn unprocessable(_: &Request<'_>) -> Prebuilt {
    Prebuilt(detail_response(
        Status::UnprocessableEntity,
        INVALID_BODY_MESSAGE.into(),
    ))
}

#[catch(500)]
fn internal_error(_: &Request<'_>) -> Prebuilt {
    Prebuilt(detail_response(
        Status::InternalServerError,
        "Internal server error".into(),
    ))
}

pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, not_found, unprocessable, internal_error]
}
