use serde::Serialize;
use axum::Json;
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-05-01T10:20:30.123Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn error(status: StatusCode, message: String) -> (StatusCode, Json<ErrorBody>) {
    (status, Json(ErrorBody { error: message }))
}
