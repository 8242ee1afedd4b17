use serde::Serialize;
use tracing::{debug, warn};

use crate::geo::{GeoPoint, haversine_km};
use crate::models::partner::{MaterialCategory, OrganizationType, Partner, PartnerId};
use crate::models::pickup::PickupRequest;
use crate::registry::PartnerRegistry;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub partner: Partner,
    pub distance_km: f64,
}

#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Matched(Candidate),
    NoCapablePartner,
    OutOfRange,
}

impl MatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            MatchOutcome::Matched(_) => "matched",
            MatchOutcome::NoCapablePartner => "no_capable_partner",
            MatchOutcome::OutOfRange => "out_of_range",
        }
    }

    pub fn into_candidate(self) -> Option<Candidate> {
        match self {
            MatchOutcome::Matched(candidate) => Some(candidate),
            MatchOutcome::NoCapablePartner | MatchOutcome::OutOfRange => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailablePartner {
    pub partner_id: PartnerId,
    pub name: String,
    pub organization_type: OrganizationType,
    pub distance_km: f64,
    pub contact_phone: String,
}

/// Ties on distance go to the partner seen first in registry order. That is a
/// stable tie-break only, not a ranking.
pub fn match_partner<R>(point: &GeoPoint, material: MaterialCategory, registry: &R) -> MatchOutcome
where
    R: PartnerRegistry + ?Sized,
{
    let capable: Vec<Partner> = registry
        .active_partners()
        .into_iter()
        .filter(|partner| partner.accepts(material))
        .collect();

    if capable.is_empty() {
        warn!(material = %material, "no active partner accepts material");
        return MatchOutcome::NoCapablePartner;
    }

    let mut best: Option<Candidate> = None;
    for partner in capable {
        let distance_km = haversine_km(point, &partner.base_location);
        if distance_km > partner.service_radius_km {
            debug!(
                partner_id = %partner.id,
                distance_km,
                radius_km = partner.service_radius_km,
                "partner out of range"
            );
            continue;
        }

        let closer = best
            .as_ref()
            .is_none_or(|current| distance_km < current.distance_km);
        if closer {
            best = Some(Candidate {
                partner,
                distance_km,
            });
        }
    }

    match best {
        Some(candidate) => MatchOutcome::Matched(candidate),
        None => {
            warn!(
                material = %material,
                lat = point.lat,
                lng = point.lng,
                "capable partners exist but none cover pickup point"
            );
            MatchOutcome::OutOfRange
        }
    }
}

pub fn find_nearest_eligible<R>(request: &PickupRequest, registry: &R) -> Option<Partner>
where
    R: PartnerRegistry + ?Sized,
{
    match_partner(&request.location.point, request.waste.material, registry)
        .into_candidate()
        .map(|candidate| candidate.partner)
}

pub fn nearest_k_eligible<R>(
    registry: &R,
    point: &GeoPoint,
    material: Option<MaterialCategory>,
    k: usize,
) -> Vec<AvailablePartner>
where
    R: PartnerRegistry + ?Sized,
{
    let mut in_range: Vec<Candidate> = registry
        .active_partners()
        .into_iter()
        .filter(|partner| material.is_none_or(|material| partner.accepts(material)))
        .filter_map(|partner| {
            let distance_km = haversine_km(point, &partner.base_location);
            (distance_km <= partner.service_radius_km).then_some(Candidate {
                partner,
                distance_km,
            })
        })
        .collect();

    in_range.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    in_range
        .into_iter()
        .take(k)
        .map(|candidate| AvailablePartner {
            partner_id: candidate.partner.id,
            name: candidate.partner.name,
            organization_type: candidate.partner.organization_type,
            distance_km: round_km(candidate.distance_km),
            contact_phone: candidate.partner.contact.phone,
        })
        .collect()
}

fn round_km(distance_km: f64) -> f64 {
    (distance_km * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{MatchOutcome, match_partner, nearest_k_eligible};
    use crate::geo::{GeoPoint, haversine_km};
    use crate::models::partner::MaterialCategory::{self, Electronic, Glass, Paper, Plastic};
    use crate::models::partner::PartnerId;
    use crate::registry::fixtures::partner;
    use crate::registry::InMemoryPartnerRegistry;

    fn registry_with(partners: Vec<crate::models::partner::Partner>) -> InMemoryPartnerRegistry {
        let registry = InMemoryPartnerRegistry::new();
        for p in partners {
            registry.provision(p).unwrap();
        }
        registry
    }

    fn koramangala() -> GeoPoint {
        GeoPoint {
            lat: 12.9352,
            lng: 77.6245,
        }
    }

    #[test]
    fn partner_within_radius_is_matched() {
        let registry = registry_with(vec![partner("P1", 12.9716, 77.5946, 15.0, &[Plastic])]);

        match match_partner(&koramangala(), Plastic, &registry) {
            MatchOutcome::Matched(candidate) => {
                assert_eq!(candidate.partner.id, PartnerId::new("P1"));
                assert!((candidate.distance_km - 5.18).abs() < 0.01);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn unaccepted_material_yields_no_capable_partner() {
        let registry = registry_with(vec![partner("P1", 12.9716, 77.5946, 15.0, &[Plastic])]);

        let outcome = match_partner(&koramangala(), Electronic, &registry);
        assert!(matches!(outcome, MatchOutcome::NoCapablePartner));
    }

    #[test]
    fn radius_is_per_partner() {
        // ~5.18 km away with a 5 km radius, and ~2.82 km away with a 3 km radius.
        let registry = registry_with(vec![
            partner("short-reach", 12.9716, 77.5946, 5.0, &[Paper]),
            partner("covers", 12.9141, 77.6101, 3.0, &[Paper]),
        ]);

        let outcome = match_partner(&koramangala(), Paper, &registry);
        let candidate = outcome.into_candidate().unwrap();
        assert_eq!(candidate.partner.id, PartnerId::new("covers"));

        let far_registry =
            registry_with(vec![partner("short-reach", 12.9716, 77.5946, 5.0, &[Paper])]);
        assert!(matches!(
            match_partner(&koramangala(), Paper, &far_registry),
            MatchOutcome::OutOfRange
        ));
    }

    #[test]
    fn nearest_of_several_wins_and_inactive_are_skipped() {
        let registry = registry_with(vec![
            partner("far", 12.9716, 77.5946, 20.0, &[Glass]),
            partner("near-but-off", 12.9353, 77.6246, 20.0, &[Glass]),
            partner("near", 12.9141, 77.6101, 20.0, &[Glass]),
        ]);
        registry
            .set_active(&PartnerId::new("near-but-off"), false)
            .unwrap();

        let candidate = match_partner(&koramangala(), Glass, &registry)
            .into_candidate()
            .unwrap();
        assert_eq!(candidate.partner.id, PartnerId::new("near"));
    }

    #[test]
    fn equal_distance_resolves_to_first_in_registry_order() {
        let registry = registry_with(vec![
            partner("first", 12.95, 77.60, 10.0, &[Plastic]),
            partner("second", 12.95, 77.60, 10.0, &[Plastic]),
        ]);

        let candidate = match_partner(&koramangala(), Plastic, &registry)
            .into_candidate()
            .unwrap();
        assert_eq!(candidate.partner.id, PartnerId::new("first"));
    }

    #[test]
    fn matches_never_violate_material_or_radius() {
        let materials = MaterialCategory::ALL;
        let mut seed: u64 = 0x5eed;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as f64 / (1u64 << 31) as f64
        };

        for round in 0..50 {
            let partners = (0..12)
                .map(|i| {
                    let accepted = [
                        materials[(round + i) % materials.len()],
                        materials[(round * 3 + i) % materials.len()],
                    ];
                    partner(
                        &format!("R{round}-{i}"),
                        12.8 + next() * 0.4,
                        77.4 + next() * 0.4,
                        1.0 + next() * 15.0,
                        &accepted,
                    )
                })
                .collect();
            let registry = registry_with(partners);
            let point = GeoPoint {
                lat: 12.8 + next() * 0.4,
                lng: 77.4 + next() * 0.4,
            };
            let material = materials[round % materials.len()];

            if let Some(candidate) = match_partner(&point, material, &registry).into_candidate() {
                let partner = candidate.partner;
                assert!(partner.accepts(material));
                assert!(haversine_km(&point, &partner.base_location) <= partner.service_radius_km);

                let listed = nearest_k_eligible(&registry, &point, Some(material), 1);
                assert_eq!(listed[0].partner_id, partner.id);
            }
        }
    }

    #[test]
    fn listing_is_sorted_limited_and_rounded() {
        let registry = registry_with(vec![
            partner("P1", 12.9716, 77.5946, 15.0, &[Plastic, Paper]),
            partner("P2", 12.9141, 77.6101, 10.0, &[Plastic]),
            partner("P3", 12.9081, 77.5976, 18.0, &[Plastic]),
            partner("P4", 12.9784, 77.6408, 12.0, &[Electronic]),
        ]);

        let listed = nearest_k_eligible(&registry, &koramangala(), Some(Plastic), 2);
        let ids: Vec<&str> = listed.iter().map(|p| p.partner_id.as_str()).collect();
        assert_eq!(ids, vec!["P2", "P3"]);
        assert_eq!(listed[0].distance_km, 2.82);
        assert_eq!(listed[1].distance_km, 4.19);

        let any_material = nearest_k_eligible(&registry, &koramangala(), None, 10);
        assert_eq!(any_material.len(), 4);
        assert_eq!(any_material[3].partner_id.as_str(), "P1");
    }
}
