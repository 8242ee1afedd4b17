use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::{JsonRejection, QueryRejection};

use crate::error::AppError;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("body", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation("query", rejection.body_text())
    }
}

// Handlers take `Result<Json<T>, JsonRejection>` so malformed input is reported
// in the same error shape as every other rejected request.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = body?;
    Ok(value)
}

pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    let Query(value) = query?;
    Ok(value)
}
