use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::partner::PartnerId;
use crate::models::pickup::{PickupRequest, PickupStatus, RequestId, StatusChange};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEvent {
    pub request_id: RequestId,
    pub from: Option<PickupStatus>,
    pub to: PickupStatus,
    pub partner_id: Option<PartnerId>,
    pub at: DateTime<Utc>,
}

impl DispatchEvent {
    pub fn from_change(request: &PickupRequest, change: &StatusChange) -> Self {
        Self {
            request_id: request.id.clone(),
            from: change.from,
            to: change.to,
            partner_id: request.assigned_partner.clone(),
            at: change.at,
        }
    }
}
