use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnerId(String);

impl PartnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganizationType {
    #[serde(rename = "NGO")]
    Ngo,
    Recycler,
    Municipality,
    Private,
}

impl OrganizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ngo => "NGO",
            Self::Recycler => "Recycler",
            Self::Municipality => "Municipality",
            Self::Private => "Private",
        }
    }
}

impl fmt::Display for OrganizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganizationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NGO" => Ok(Self::Ngo),
            "Recycler" => Ok(Self::Recycler),
            "Municipality" => Ok(Self::Municipality),
            "Private" => Ok(Self::Private),
            other => Err(AppError::validation(
                "organization_type",
                format!("unknown organization type {other}, expected NGO/Recycler/Municipality/Private"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialCategory {
    Plastic,
    Paper,
    Metal,
    Glass,
    Electronic,
    Textile,
    Organic,
    Mixed,
}

impl MaterialCategory {
    pub const ALL: [MaterialCategory; 8] = [
        Self::Plastic,
        Self::Paper,
        Self::Metal,
        Self::Glass,
        Self::Electronic,
        Self::Textile,
        Self::Organic,
        Self::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plastic => "Plastic",
            Self::Paper => "Paper",
            Self::Metal => "Metal",
            Self::Glass => "Glass",
            Self::Electronic => "Electronic",
            Self::Textile => "Textile",
            Self::Organic => "Organic",
            Self::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|material| material.as_str() == s)
            .ok_or_else(|| {
                AppError::validation("material_category", format!("unknown material category {s}"))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerContact {
    pub person: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    pub organization_type: OrganizationType,
    pub contact: PartnerContact,
    pub base_location: GeoPoint,
    pub service_radius_km: f64,
    pub accepted_materials: BTreeSet<MaterialCategory>,
    pub operating_hours: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Partner {
    pub fn accepts(&self, material: MaterialCategory) -> bool {
        self.accepted_materials.contains(&material)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.id.as_str().trim().is_empty() {
            return Err(AppError::validation("partner_id", "partner id cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name", "name cannot be empty"));
        }
        if !self.service_radius_km.is_finite() || self.service_radius_km <= 0.0 {
            return Err(AppError::validation(
                "service_radius_km",
                "service radius must be > 0",
            ));
        }
        if self.accepted_materials.is_empty() {
            return Err(AppError::validation(
                "accepted_materials",
                "at least one accepted material is required",
            ));
        }
        GeoPoint::validated(self.base_location.lat, self.base_location.lng)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MaterialCategory, OrganizationType};

    #[test]
    fn enumerations_round_trip_by_name() {
        for material in MaterialCategory::ALL {
            assert_eq!(material.as_str().parse::<MaterialCategory>().unwrap(), material);
            let json = serde_json::to_string(&material).unwrap();
            assert_eq!(json, format!("\"{}\"", material.as_str()));
        }

        assert_eq!(serde_json::to_string(&OrganizationType::Ngo).unwrap(), "\"NGO\"");
        assert_eq!("NGO".parse::<OrganizationType>().unwrap(), OrganizationType::Ngo);
    }

    #[test]
    fn unknown_material_is_a_validation_error() {
        let err = "Wood".parse::<MaterialCategory>().unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }
}
