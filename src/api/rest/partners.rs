use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use serde::Deserialize;

use crate::api::rest::extract::query_params;
use crate::engine::matching::AvailablePartner;
use crate::error::AppError;
use crate::models::partner::MaterialCategory;
use crate::models::time_slot::TimeSlot;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/partners/available", get(list_available_partners))
        .route("/time-slots", get(list_time_slots))
}

#[derive(Deserialize)]
pub struct AvailablePartnersQuery {
    pub lat: f64,
    pub lng: f64,
    pub material: Option<String>,
    pub limit: Option<usize>,
}

async fn list_available_partners(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AvailablePartnersQuery>, QueryRejection>,
) -> Result<Json<Vec<AvailablePartner>>, AppError> {
    let query = query_params(query)?;
    let material = query
        .material
        .filter(|material| !material.trim().is_empty())
        .map(|material| material.parse::<MaterialCategory>())
        .transpose()?;

    let partners = state
        .dispatch
        .available_partners(query.lat, query.lng, material, query.limit)?;

    Ok(Json(partners))
}

async fn list_time_slots(State(state): State<Arc<AppState>>) -> Json<Vec<TimeSlot>> {
    Json(state.time_slots.active_slots())
}
