use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::partner::{MaterialCategory, PartnerId};

/// Externally visible request id: `PU` followed by 12 upper-case hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("PU{}", hex[..12].to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(String);

impl RequesterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupStatus {
    Requested,
    Assigned,
    Scheduled,
    Completed,
    Cancelled,
}

impl PickupStatus {
    pub const ALL: [PickupStatus; 5] = [
        Self::Requested,
        Self::Assigned,
        Self::Scheduled,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "Requested",
            Self::Assigned => "Assigned",
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickupStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::validation("status", format!("unknown status {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteDetails {
    pub material: MaterialCategory,
    pub estimated_quantity: f64,
    pub quantity_unit: String,
    pub item_count: Option<u32>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupLocation {
    pub point: GeoPoint,
    pub address: String,
    pub landmark: Option<String>,
    pub area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePreference {
    pub preferred_date: NaiveDate,
    pub preferred_time_slot: String,
    pub alternative_time_slot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: Option<PickupStatus>,
    pub to: PickupStatus,
    pub at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub score: u8,
    pub feedback: String,
    pub rated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSubmission {
    pub requester_id: RequesterId,
    pub waste: WasteDetails,
    pub location: PickupLocation,
    pub schedule: SchedulePreference,
    pub contact: ContactDetails,
}

impl PickupSubmission {
    // Time-slot labels are checked by the coordinator against the catalog.
    pub fn validate(&self) -> Result<(), AppError> {
        GeoPoint::validated(self.location.point.lat, self.location.point.lng)?;

        let quantity = self.waste.estimated_quantity;
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(AppError::validation(
                "estimated_quantity",
                "estimated quantity must be > 0",
            ));
        }
        if self.waste.quantity_unit.trim().is_empty() {
            return Err(AppError::validation("quantity_unit", "unit cannot be empty"));
        }
        if self.location.address.trim().is_empty() {
            return Err(AppError::validation("pickup_address", "address cannot be empty"));
        }
        if self.contact.name.trim().is_empty() {
            return Err(AppError::validation("contact_name", "contact name cannot be empty"));
        }
        if self.contact.phone.trim().is_empty() {
            return Err(AppError::validation("contact_phone", "contact phone cannot be empty"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRequest {
    pub id: RequestId,
    pub requester_id: RequesterId,
    pub waste: WasteDetails,
    pub location: PickupLocation,
    pub schedule: SchedulePreference,
    pub contact: ContactDetails,
    pub status: PickupStatus,
    pub assigned_partner: Option<PartnerId>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub collected_weight_kg: Option<f64>,
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
    pub status_history: Vec<StatusChange>,
}

impl PickupRequest {
    pub fn new(id: RequestId, submission: PickupSubmission, now: DateTime<Utc>) -> Self {
        Self {
            id,
            requester_id: submission.requester_id,
            waste: submission.waste,
            location: submission.location,
            schedule: submission.schedule,
            contact: submission.contact,
            status: PickupStatus::Requested,
            assigned_partner: None,
            assigned_at: None,
            scheduled_time: None,
            completed_at: None,
            collected_weight_kg: None,
            rating: None,
            created_at: now,
            status_updated_at: now,
            status_history: vec![StatusChange {
                from: None,
                to: PickupStatus::Requested,
                at: now,
                notes: None,
            }],
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            PickupStatus::Requested | PickupStatus::Assigned | PickupStatus::Scheduled
        )
    }
}


#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, NaiveDate, Utc};

    use super::{
        ContactDetails, PickupLocation, PickupRequest, PickupSubmission, RequestId, RequesterId,
        SchedulePreference, WasteDetails,
    };
    use crate::geo::GeoPoint;
    use crate::models::partner::MaterialCategory;

    pub fn submission(requester: &str, material: MaterialCategory, lat: f64, lng: f64) -> PickupSubmission {
        PickupSubmission {
            requester_id: RequesterId::new(requester),
            waste: WasteDetails {
                material,
                estimated_quantity: 4.0,
                quantity_unit: "kg".to_string(),
                item_count: None,
                description: "bottles and tubs".to_string(),
            },
            location: PickupLocation {
                point: GeoPoint { lat, lng },
                address: "80 Feet Road, Koramangala".to_string(),
                landmark: None,
                area: Some("Koramangala".to_string()),
            },
            schedule: SchedulePreference {
                preferred_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
                preferred_time_slot: "9 AM - 12 PM".to_string(),
                alternative_time_slot: None,
            },
            contact: ContactDetails {
                name: "Asha".to_string(),
                phone: "+91 99999 00000".to_string(),
            },
        }
    }

    pub fn request(material: MaterialCategory, now: DateTime<Utc>) -> PickupRequest {
        PickupRequest::new(
            RequestId::generate(),
            submission("user-1", material, 12.9352, 77.6245),
            now,
        )
    }
}
