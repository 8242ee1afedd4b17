use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::rest::extract::{json_body, query_params};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::partner::{
    MaterialCategory, OrganizationType, Partner, PartnerContact, PartnerId,
};
use crate::models::pickup::{PickupRequest, PickupStatus, RequestId};
use crate::models::time_slot::TimeSlot;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/partners", post(provision_partner).get(list_partners))
        .route("/admin/partners/:id/active", patch(set_partner_active))
        .route("/admin/pickups", get(list_pickups))
        .route("/admin/pickups/:id/assign", post(assign_partner))
        .route("/admin/pickups/:id/status", post(update_pickup_status))
        .route("/admin/time-slots", post(upsert_time_slot))
}

#[derive(Deserialize)]
pub struct ProvisionPartnerRequest {
    pub partner_id: String,
    pub name: String,
    pub organization_type: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub contact_email: Option<String>,
    pub base_location: GeoPoint,
    pub service_radius_km: f64,
    pub accepted_materials: Vec<String>,
    pub operating_hours: Option<String>,
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Deserialize)]
pub struct AdminListQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct AssignPartnerRequest {
    pub partner_id: String,
    pub scheduled_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub notes: Option<String>,
    pub collected_weight: Option<f64>,
}

async fn provision_partner(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProvisionPartnerRequest>, JsonRejection>,
) -> Result<Json<Partner>, AppError> {
    let payload = json_body(body)?;
    let accepted_materials = payload
        .accepted_materials
        .iter()
        .map(|material| material.parse::<MaterialCategory>())
        .collect::<Result<BTreeSet<_>, _>>()?;

    let partner = Partner {
        id: PartnerId::new(payload.partner_id),
        name: payload.name,
        organization_type: payload.organization_type.parse::<OrganizationType>()?,
        contact: PartnerContact {
            person: payload.contact_person,
            phone: payload.contact_phone,
            email: payload.contact_email,
        },
        base_location: payload.base_location,
        service_radius_km: payload.service_radius_km,
        accepted_materials,
        operating_hours: payload.operating_hours,
        active: true,
        created_at: Utc::now(),
    };

    let partner = state.partners.provision(partner)?;
    tracing::info!(partner_id = %partner.id, "partner provisioned");

    Ok(Json(partner))
}

async fn list_partners(State(state): State<Arc<AppState>>) -> Json<Vec<Partner>> {
    Json(state.partners.all_partners())
}

async fn set_partner_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<Partner>, AppError> {
    let payload = json_body(body)?;
    let partner = state
        .partners
        .set_active(&PartnerId::new(id), payload.active)?;
    tracing::info!(partner_id = %partner.id, active = partner.active, "partner activity changed");

    Ok(Json(partner))
}

async fn list_pickups(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AdminListQuery>, QueryRejection>,
) -> Result<Json<Vec<PickupRequest>>, AppError> {
    let query = query_params(query)?;
    let status = query
        .status
        .filter(|status| status != "all")
        .map(|status| status.parse::<PickupStatus>())
        .transpose()?;

    Ok(Json(state.dispatch.list_requests(status, query.limit)))
}

async fn assign_partner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<AssignPartnerRequest>, JsonRejection>,
) -> Result<Json<PickupRequest>, AppError> {
    let payload = json_body(body)?;
    let request = state.dispatch.manual_assign(
        &RequestId::from(id.as_str()),
        &PartnerId::new(payload.partner_id),
        payload.scheduled_time,
    )?;

    Ok(Json(request))
}

async fn update_pickup_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<PickupRequest>, AppError> {
    let payload = json_body(body)?;
    let status = payload.status.parse::<PickupStatus>()?;
    let request = state.dispatch.update_status(
        &RequestId::from(id.as_str()),
        status,
        payload.notes,
        payload.collected_weight,
    )?;

    Ok(Json(request))
}

async fn upsert_time_slot(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TimeSlot>, JsonRejection>,
) -> Result<Json<TimeSlot>, AppError> {
    let slot = json_body(body)?;

    Ok(Json(state.time_slots.upsert(slot)?))
}
