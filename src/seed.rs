use chrono::Utc;
use tracing::info;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::partner::MaterialCategory::{
    Electronic, Glass, Metal, Mixed, Organic, Paper, Plastic, Textile,
};
use crate::models::partner::{
    MaterialCategory, OrganizationType, Partner, PartnerContact, PartnerId,
};
use crate::models::time_slot::TimeSlot;
use crate::registry::{InMemoryPartnerRegistry, TimeSlotCatalog};

pub fn default_time_slots() -> Vec<TimeSlot> {
    [
        ("9 AM - 12 PM", 9, 12),
        ("12 PM - 3 PM", 12, 15),
        ("3 PM - 6 PM", 15, 18),
        ("6 PM - 8 PM", 18, 20),
    ]
    .into_iter()
    .zip(1..)
    .map(|((label, start_hour, end_hour), display_order)| TimeSlot {
        label: label.to_string(),
        start_hour,
        end_hour,
        display_order,
        active: true,
    })
    .collect()
}

struct SamplePartner {
    id: &'static str,
    name: &'static str,
    organization_type: OrganizationType,
    person: &'static str,
    phone: &'static str,
    email: &'static str,
    location: (f64, f64),
    radius_km: f64,
    materials: &'static [MaterialCategory],
    hours: &'static str,
}

const SAMPLE_PARTNERS: [SamplePartner; 5] = [
    SamplePartner {
        id: "BANG-NGO-001",
        name: "Green Earth Foundation",
        organization_type: OrganizationType::Ngo,
        person: "Rajesh Kumar",
        phone: "+91 98765 43210",
        email: "contact@greenearth.org",
        location: (12.9716, 77.5946),
        radius_km: 15.0,
        materials: &[Plastic, Paper, Metal, Glass, Electronic],
        hours: "9 AM - 6 PM",
    },
    SamplePartner {
        id: "BANG-REC-002",
        name: "EcoRecycle Solutions",
        organization_type: OrganizationType::Recycler,
        person: "Priya Sharma",
        phone: "+91 98765 43211",
        email: "info@ecorecycle.in",
        location: (12.9352, 77.6245),
        radius_km: 20.0,
        materials: &[Plastic, Paper, Metal, Glass, Textile, Organic, Mixed],
        hours: "8 AM - 8 PM",
    },
    SamplePartner {
        id: "BANG-MUN-003",
        name: "BBMP Ward 45 Collection",
        organization_type: OrganizationType::Municipality,
        person: "Municipal Office",
        phone: "+91 98765 43212",
        email: "ward45@bbmp.gov.in",
        location: (12.9141, 77.6101),
        radius_km: 10.0,
        materials: &[Plastic, Paper, Glass, Organic, Mixed],
        hours: "6 AM - 2 PM",
    },
    SamplePartner {
        id: "BANG-PVT-004",
        name: "Wise Waste Collectors",
        organization_type: OrganizationType::Private,
        person: "Anand Reddy",
        phone: "+91 98765 43213",
        email: "wise@wastecollectors.com",
        location: (12.9784, 77.6408),
        radius_km: 12.0,
        materials: &[Electronic, Metal, Plastic, Paper],
        hours: "10 AM - 7 PM",
    },
    SamplePartner {
        id: "BANG-NGO-005",
        name: "Saahas Zero Waste",
        organization_type: OrganizationType::Ngo,
        person: "Archana Sharma",
        phone: "+91 98765 43214",
        email: "contact@saahas.org",
        location: (12.9081, 77.5976),
        radius_km: 18.0,
        materials: &[Plastic, Paper, Glass, Metal, Textile, Organic],
        hours: "9 AM - 5 PM",
    },
];

pub fn sample_partners() -> Vec<Partner> {
    let now = Utc::now();

    SAMPLE_PARTNERS
        .iter()
        .map(|sample| Partner {
            id: PartnerId::new(sample.id),
            name: sample.name.to_string(),
            organization_type: sample.organization_type,
            contact: PartnerContact {
                person: sample.person.to_string(),
                phone: sample.phone.to_string(),
                email: Some(sample.email.to_string()),
            },
            base_location: GeoPoint {
                lat: sample.location.0,
                lng: sample.location.1,
            },
            service_radius_km: sample.radius_km,
            accepted_materials: sample.materials.iter().copied().collect(),
            operating_hours: Some(sample.hours.to_string()),
            active: true,
            created_at: now,
        })
        .collect()
}

pub fn load_time_slots(catalog: &TimeSlotCatalog) -> Result<usize, AppError> {
    let slots = default_time_slots();
    let count = slots.len();
    for slot in slots {
        catalog.upsert(slot)?;
    }

    info!(count, "time slots seeded");
    Ok(count)
}

pub fn load_sample_partners(registry: &InMemoryPartnerRegistry) -> Result<usize, AppError> {
    let mut added = 0;
    for partner in sample_partners() {
        match registry.provision(partner) {
            Ok(_) => added += 1,
            Err(AppError::Conflict(_)) => {}
            Err(err) => return Err(err),
        }
    }

    info!(added, "sample partners seeded");
    Ok(added)
}
