use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::engine::matching::{AvailablePartner, match_partner, nearest_k_eligible};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::event::DispatchEvent;
use crate::models::partner::{MaterialCategory, Partner, PartnerId};
use crate::models::pickup::{
    PickupRequest, PickupStatus, PickupSubmission, RequestId, RequesterId,
};
use crate::observability::metrics::Metrics;
use crate::registry::{PartnerRegistry, TimeSlotCatalog};
use crate::store::RequestStore;

#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub request: PickupRequest,
    pub assigned_partner: Option<Partner>,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedPartnerView {
    pub partner_id: PartnerId,
    pub name: String,
    pub contact_phone: String,
}

impl From<&Partner> for AssignedPartnerView {
    fn from(partner: &Partner) -> Self {
        Self {
            partner_id: partner.id.clone(),
            name: partner.name.clone(),
            contact_phone: partner.contact.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupSnapshot {
    #[serde(flatten)]
    pub request: PickupRequest,
    pub partner: Option<AssignedPartnerView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequesterOverview {
    pub active: Vec<PickupRequest>,
    pub recent: Vec<PickupRequest>,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchLimits {
    pub available_partners_default: usize,
    pub available_partners_max: usize,
    pub admin_list: usize,
    pub requester_history: usize,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            available_partners_default: 5,
            available_partners_max: 50,
            admin_list: 50,
            requester_history: 10,
        }
    }
}

pub struct DispatchCoordinator {
    registry: Arc<dyn PartnerRegistry>,
    time_slots: Arc<TimeSlotCatalog>,
    store: Arc<dyn RequestStore>,
    clock: Arc<dyn Clock>,
    locks: DashMap<RequestId, Arc<Mutex<()>>>,
    events_tx: broadcast::Sender<DispatchEvent>,
    metrics: Metrics,
    limits: DispatchLimits,
}

impl DispatchCoordinator {
    pub fn new(
        registry: Arc<dyn PartnerRegistry>,
        time_slots: Arc<TimeSlotCatalog>,
        store: Arc<dyn RequestStore>,
        events_tx: broadcast::Sender<DispatchEvent>,
        metrics: Metrics,
    ) -> Self {
        Self {
            registry,
            time_slots,
            store,
            clock: Arc::new(SystemClock),
            locks: DashMap::new(),
            events_tx,
            metrics,
            limits: DispatchLimits::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_limits(mut self, limits: DispatchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn submit(&self, submission: PickupSubmission) -> Result<DispatchOutcome, AppError> {
        let start = Instant::now();
        let result = self.dispatch(submission);

        let outcome = match &result {
            Ok(outcome) if outcome.assigned_partner.is_some() => "assigned",
            Ok(_) => "unassigned",
            Err(_) => "error",
        };
        self.metrics
            .dispatch_latency_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        self.observe(result)
    }

    fn dispatch(&self, submission: PickupSubmission) -> Result<DispatchOutcome, AppError> {
        submission.validate()?;
        self.time_slots
            .ensure_active("preferred_time_slot", &submission.schedule.preferred_time_slot)?;
        if let Some(alternative) = &submission.schedule.alternative_time_slot {
            self.time_slots
                .ensure_active("alternative_time_slot", alternative)?;
        }

        let id = RequestId::generate();
        let key = id.clone();
        self.with_lock(&key, || self.dispatch_locked(id, submission))
    }

    fn dispatch_locked(
        &self,
        id: RequestId,
        submission: PickupSubmission,
    ) -> Result<DispatchOutcome, AppError> {
        let request = PickupRequest::new(id, submission, self.clock.now());
        self.store.insert(request.clone())?;
        self.metrics.pickups_submitted_total.inc();
        self.publish(None, &request);

        info!(
            request_id = %request.id,
            material = %request.waste.material,
            "pickup requested"
        );

        let matched = match_partner(
            &request.location.point,
            request.waste.material,
            self.registry.as_ref(),
        );
        let reason = matched.label();
        self.metrics
            .match_outcomes_total
            .with_label_values(&[reason])
            .inc();

        let Some(candidate) = matched.into_candidate() else {
            warn!(
                request_id = %request.id,
                reason,
                "no eligible partner; request left for manual assignment"
            );
            return Ok(DispatchOutcome {
                request,
                assigned_partner: None,
                distance_km: None,
            });
        };

        let mut assigned = request.clone();
        assigned.assign(&candidate.partner, None, self.clock.now())?;

        if let Err(err) = self.store.update(assigned.clone()) {
            warn!(
                request_id = %request.id,
                partner_id = %candidate.partner.id,
                error = %err,
                "assignment commit failed; request left in Requested"
            );
            self.metrics
                .rejected_operations_total
                .with_label_values(&[err.kind()])
                .inc();
            return Ok(DispatchOutcome {
                request,
                assigned_partner: None,
                distance_km: None,
            });
        }
        self.publish(Some(&request), &assigned);

        info!(
            request_id = %assigned.id,
            partner_id = %candidate.partner.id,
            distance_km = candidate.distance_km,
            "pickup assigned"
        );

        Ok(DispatchOutcome {
            request: assigned,
            assigned_partner: Some(candidate.partner),
            distance_km: Some(candidate.distance_km),
        })
    }

    pub fn manual_assign(
        &self,
        id: &RequestId,
        partner_id: &PartnerId,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> Result<PickupRequest, AppError> {
        let result = self.registry.by_id(partner_id).and_then(|partner| {
            if !partner.active {
                return Err(AppError::validation(
                    "partner_id",
                    format!("partner {partner_id} is inactive"),
                ));
            }

            self.transition(id, None, |request, now| {
                request.assign(&partner, scheduled_time, now).map(|_| ())
            })
        });

        if let Ok(request) = &result {
            info!(
                request_id = %id,
                partner_id = %partner_id,
                status = %request.status,
                "pickup manually assigned"
            );
        }
        self.observe(result)
    }

    pub fn update_status(
        &self,
        id: &RequestId,
        next: PickupStatus,
        notes: Option<String>,
        collected_weight_kg: Option<f64>,
    ) -> Result<PickupRequest, AppError> {
        let result = if collected_weight_kg.is_some() && next != PickupStatus::Completed {
            Err(AppError::validation(
                "collected_weight",
                format!("collected weight is only accepted with status Completed, not {next}"),
            ))
        } else {
            self.transition(id, None, |request, now| {
                request
                    .update_status(next, notes, collected_weight_kg, now)
                    .map(|_| ())
            })
        };

        if result.is_ok() {
            info!(request_id = %id, status = %next, "pickup status updated");
        }
        self.observe(result)
    }

    pub fn cancel(
        &self,
        id: &RequestId,
        requester_id: &RequesterId,
    ) -> Result<PickupRequest, AppError> {
        let result = self.transition(id, Some(requester_id), |request, now| {
            request.cancel(now).map(|_| ())
        });

        if result.is_ok() {
            info!(request_id = %id, "pickup cancelled by requester");
        }
        self.observe(result)
    }

    pub fn rate(
        &self,
        id: &RequestId,
        requester_id: &RequesterId,
        score: u8,
        feedback: String,
    ) -> Result<PickupRequest, AppError> {
        let result = self.transition(id, Some(requester_id), |request, now| {
            request.rate(score, feedback, now)
        });

        if result.is_ok() {
            info!(request_id = %id, score, "pickup rated");
        }
        self.observe(result)
    }

    pub fn get_status(
        &self,
        id: &RequestId,
        requester_id: &RequesterId,
    ) -> Result<PickupSnapshot, AppError> {
        let request = self.observe(self.load(id, Some(requester_id)))?;
        let partner = request
            .assigned_partner
            .as_ref()
            .and_then(|partner_id| self.registry.by_id(partner_id).ok())
            .map(|partner| AssignedPartnerView::from(&partner));

        Ok(PickupSnapshot { request, partner })
    }

    pub fn list_for_requester(&self, requester_id: &RequesterId) -> RequesterOverview {
        let (active, finished): (Vec<PickupRequest>, Vec<PickupRequest>) = newest_first(
            self.store
                .list()
                .into_iter()
                .filter(|request| &request.requester_id == requester_id)
                .collect(),
        )
        .into_iter()
        .partition(PickupRequest::is_active);

        RequesterOverview {
            active,
            recent: finished
                .into_iter()
                .take(self.limits.requester_history)
                .collect(),
        }
    }

    pub fn list_requests(
        &self,
        status: Option<PickupStatus>,
        limit: Option<usize>,
    ) -> Vec<PickupRequest> {
        let limit = limit.unwrap_or(self.limits.admin_list);
        newest_first(
            self.store
                .list()
                .into_iter()
                .filter(|request| status.is_none_or(|status| request.status == status))
                .collect(),
        )
        .into_iter()
        .take(limit)
        .collect()
    }

    pub fn available_partners(
        &self,
        lat: f64,
        lng: f64,
        material: Option<MaterialCategory>,
        limit: Option<usize>,
    ) -> Result<Vec<AvailablePartner>, AppError> {
        let point = self.observe(GeoPoint::validated(lat, lng))?;
        let limit = limit
            .unwrap_or(self.limits.available_partners_default)
            .clamp(1, self.limits.available_partners_max.max(1));

        Ok(nearest_k_eligible(
            self.registry.as_ref(),
            &point,
            material,
            limit,
        ))
    }

    pub fn request_count(&self) -> usize {
        self.store.len()
    }

    fn transition<F>(
        &self,
        id: &RequestId,
        requester_id: Option<&RequesterId>,
        apply: F,
    ) -> Result<PickupRequest, AppError>
    where
        F: FnOnce(&mut PickupRequest, DateTime<Utc>) -> Result<(), AppError>,
    {
        self.load(id, requester_id)?;

        self.with_lock(id, || {
            let current = self.load(id, requester_id)?;
            let mut next = current.clone();
            apply(&mut next, self.clock.now())?;

            self.store.update(next.clone())?;
            self.publish(Some(&current), &next);

            Ok(next)
        })
    }

    // Unknown ids and ids owned by another requester look the same.
    fn load(
        &self,
        id: &RequestId,
        requester_id: Option<&RequesterId>,
    ) -> Result<PickupRequest, AppError> {
        self.store
            .get(id)
            .filter(|request| requester_id.is_none_or(|owner| &request.requester_id == owner))
            .ok_or_else(|| AppError::not_found("request", id))
    }

    // The entry is dropped again once nobody holds or waits on it, so the map
    // only ever contains requests with an operation in flight.
    fn with_lock<T>(&self, id: &RequestId, f: impl FnOnce() -> T) -> T {
        let lock = Arc::clone(&self.locks.entry(id.clone()).or_default());
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        self.locks
            .remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    fn publish(&self, previous: Option<&PickupRequest>, current: &PickupRequest) {
        let seen = previous.map_or(0, |previous| previous.status_history.len());

        for change in current.status_history.iter().skip(seen) {
            self.metrics
                .status_transitions_total
                .with_label_values(&[change.to.as_str()])
                .inc();
            let _ = self
                .events_tx
                .send(DispatchEvent::from_change(current, change));
        }
    }

    fn observe<T>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(err) = &result {
            debug!(kind = err.kind(), error = %err, "dispatch operation rejected");
            self.metrics
                .rejected_operations_total
                .with_label_values(&[err.kind()])
                .inc();
        }
        result
    }
}

fn newest_first(mut requests: Vec<PickupRequest>) -> Vec<PickupRequest> {
    requests.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    requests
}
