use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::rest::extract::{json_body, query_params};
use crate::engine::dispatch::{AssignedPartnerView, PickupSnapshot, RequesterOverview};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::partner::MaterialCategory;
use crate::models::pickup::{
    ContactDetails, PickupLocation, PickupRequest, PickupStatus, PickupSubmission, RequestId,
    RequesterId, SchedulePreference, WasteDetails,
};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pickups", post(submit_pickup).get(list_pickups))
        .route("/pickups/:id", get(get_pickup_status))
        .route("/pickups/:id/cancel", post(cancel_pickup))
        .route("/pickups/:id/rating", post(rate_pickup))
}

#[derive(Deserialize)]
pub struct CreatePickupRequest {
    pub requester_id: String,
    pub material_category: String,
    pub estimated_quantity: f64,
    pub quantity_unit: Option<String>,
    pub item_count: Option<u32>,
    pub description: Option<String>,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub pickup_address: String,
    pub landmark: Option<String>,
    pub area: Option<String>,
    pub preferred_date: NaiveDate,
    pub preferred_time_slot: String,
    pub alternative_time_slot: Option<String>,
    pub contact_name: String,
    pub contact_phone: String,
}

impl CreatePickupRequest {
    fn into_submission(self) -> Result<PickupSubmission, AppError> {
        if self.requester_id.trim().is_empty() {
            return Err(AppError::validation("requester_id", "requester id cannot be empty"));
        }

        Ok(PickupSubmission {
            requester_id: RequesterId::new(self.requester_id),
            waste: WasteDetails {
                material: self.material_category.parse::<MaterialCategory>()?,
                estimated_quantity: self.estimated_quantity,
                quantity_unit: self
                    .quantity_unit
                    .filter(|unit| !unit.trim().is_empty())
                    .unwrap_or_else(|| "kg".to_string()),
                item_count: self.item_count,
                description: self.description.unwrap_or_default(),
            },
            location: PickupLocation {
                point: GeoPoint::validated(self.pickup_lat, self.pickup_lng)?,
                address: self.pickup_address,
                landmark: non_blank(self.landmark),
                area: non_blank(self.area),
            },
            schedule: SchedulePreference {
                preferred_date: self.preferred_date,
                preferred_time_slot: self.preferred_time_slot,
                alternative_time_slot: non_blank(self.alternative_time_slot),
            },
            contact: ContactDetails {
                name: self.contact_name,
                phone: self.contact_phone,
            },
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[derive(Serialize)]
pub struct SubmitPickupResponse {
    pub request_id: RequestId,
    pub status: PickupStatus,
    pub assigned_partner: Option<AssignedPartnerView>,
    pub distance_km: Option<f64>,
}

#[derive(Deserialize)]
pub struct RequesterQuery {
    pub requester_id: String,
}

#[derive(Deserialize)]
pub struct CancelPickupRequest {
    pub requester_id: String,
}

#[derive(Deserialize)]
pub struct RatePickupRequest {
    pub requester_id: String,
    pub score: u8,
    #[serde(default)]
    pub feedback: String,
}

async fn submit_pickup(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreatePickupRequest>, JsonRejection>,
) -> Result<Json<SubmitPickupResponse>, AppError> {
    let payload = json_body(body)?;
    let outcome = state.dispatch.submit(payload.into_submission()?)?;

    Ok(Json(SubmitPickupResponse {
        request_id: outcome.request.id,
        status: outcome.request.status,
        assigned_partner: outcome.assigned_partner.as_ref().map(AssignedPartnerView::from),
        distance_km: outcome.distance_km,
    }))
}

async fn list_pickups(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RequesterQuery>, QueryRejection>,
) -> Result<Json<RequesterOverview>, AppError> {
    let query = query_params(query)?;

    Ok(Json(
        state
            .dispatch
            .list_for_requester(&RequesterId::new(query.requester_id)),
    ))
}

async fn get_pickup_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    query: Result<Query<RequesterQuery>, QueryRejection>,
) -> Result<Json<PickupSnapshot>, AppError> {
    let query = query_params(query)?;
    let snapshot = state.dispatch.get_status(
        &RequestId::from(id.as_str()),
        &RequesterId::new(query.requester_id),
    )?;

    Ok(Json(snapshot))
}

async fn cancel_pickup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<CancelPickupRequest>, JsonRejection>,
) -> Result<Json<PickupRequest>, AppError> {
    let payload = json_body(body)?;
    let request = state.dispatch.cancel(
        &RequestId::from(id.as_str()),
        &RequesterId::new(payload.requester_id),
    )?;

    Ok(Json(request))
}

async fn rate_pickup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<RatePickupRequest>, JsonRejection>,
) -> Result<Json<PickupRequest>, AppError> {
    let payload = json_body(body)?;
    let request = state.dispatch.rate(
        &RequestId::from(id.as_str()),
        &RequesterId::new(payload.requester_id),
        payload.score,
        payload.feedback,
    )?;

    Ok(Json(request))
}
