use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::partner::Partner;
use crate::models::pickup::{PickupRequest, PickupStatus, Rating, StatusChange};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

impl PickupStatus {
    pub fn can_transition_to(self, next: PickupStatus) -> bool {
        use PickupStatus::*;

        matches!(
            (self, next),
            (Requested, Assigned)
                | (Assigned, Scheduled)
                | (Assigned | Scheduled, Completed)
                | (Requested | Assigned | Scheduled, Cancelled)
        )
    }
}

impl PickupRequest {
    pub fn assign(
        &mut self,
        partner: &Partner,
        scheduled_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<PickupStatus, AppError> {
        let target = if scheduled_time.is_some() {
            PickupStatus::Scheduled
        } else {
            PickupStatus::Assigned
        };
        if self.status != PickupStatus::Requested {
            return Err(AppError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        let at = self.advance_clock(now);
        self.assigned_partner = Some(partner.id.clone());
        self.assigned_at = Some(at);
        self.record(PickupStatus::Assigned, at, None);

        if scheduled_time.is_some() {
            self.scheduled_time = scheduled_time;
            self.record(PickupStatus::Scheduled, at, None);
        }

        Ok(self.status)
    }

    pub fn update_status(
        &mut self,
        next: PickupStatus,
        notes: Option<String>,
        collected_weight_kg: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<PickupStatus, AppError> {
        let needs_partner = next == PickupStatus::Assigned;
        if needs_partner || !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        if next == PickupStatus::Completed {
            if let Some(weight) = collected_weight_kg {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(AppError::validation(
                        "collected_weight",
                        "collected weight must be a non-negative number",
                    ));
                }
            }
        }

        let at = self.advance_clock(now);
        if next == PickupStatus::Completed {
            self.completed_at = Some(at);
            if collected_weight_kg.is_some() {
                self.collected_weight_kg = collected_weight_kg;
            }
        }
        self.record(next, at, notes.filter(|notes| !notes.trim().is_empty()));

        Ok(self.status)
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<PickupStatus, AppError> {
        self.update_status(PickupStatus::Cancelled, None, None, now)
    }

    pub fn rate(
        &mut self,
        score: u8,
        feedback: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if self.status != PickupStatus::Completed {
            return Err(AppError::InvalidState {
                operation: "rate",
                status: self.status,
            });
        }
        if !(MIN_RATING..=MAX_RATING).contains(&score) {
            return Err(AppError::validation(
                "score",
                format!("score must be between {MIN_RATING} and {MAX_RATING}"),
            ));
        }

        self.rating = Some(Rating {
            score,
            feedback: feedback.into(),
            rated_at: now.max(self.status_updated_at),
        });

        Ok(())
    }

    fn advance_clock(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let at = now.max(self.status_updated_at);
        self.status_updated_at = at;
        at
    }

    fn record(&mut self, to: PickupStatus, at: DateTime<Utc>, notes: Option<String>) {
        self.status_history.push(StatusChange {
            from: Some(self.status),
            to,
            at,
            notes,
        });
        self.status = to;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::models::partner::MaterialCategory::Plastic;
    use crate::models::pickup::PickupStatus::{self, *};
    use crate::models::pickup::fixtures::request;
    use crate::models::pickup::PickupRequest;
    use crate::registry::fixtures::partner;

    fn in_status(status: PickupStatus) -> PickupRequest {
        let now = Utc::now();
        let mut pickup = request(Plastic, now);
        let p1 = partner("P1", 12.9716, 77.5946, 15.0, &[Plastic]);

        match status {
            Requested => {}
            Assigned => {
                pickup.assign(&p1, None, now).unwrap();
            }
            Scheduled => {
                pickup.assign(&p1, Some(now + Duration::hours(2)), now).unwrap();
            }
            Completed => {
                pickup.assign(&p1, Some(now), now).unwrap();
                pickup.update_status(Completed, None, None, now).unwrap();
            }
            Cancelled => {
                pickup.cancel(now).unwrap();
            }
        }
        assert_eq!(pickup.status, status);
        pickup
    }

    #[test]
    fn assign_sets_partner_and_optionally_schedules() {
        let now = Utc::now();
        let p1 = partner("P1", 12.9716, 77.5946, 15.0, &[Plastic]);

        let mut plain = request(Plastic, now);
        assert_eq!(plain.assign(&p1, None, now).unwrap(), Assigned);
        assert_eq!(plain.assigned_partner, Some(p1.id.clone()));
        assert!(plain.scheduled_time.is_none());

        let mut scheduled = request(Plastic, now);
        let at = now + Duration::hours(3);
        assert_eq!(scheduled.assign(&p1, Some(at), now).unwrap(), Scheduled);
        assert_eq!(scheduled.scheduled_time, Some(at));
        let path: Vec<PickupStatus> = scheduled.status_history.iter().map(|c| c.to).collect();
        assert_eq!(path, vec![Requested, Assigned, Scheduled]);
    }

    #[test]
    fn assign_is_only_legal_from_requested() {
        let p2 = partner("P2", 12.9, 77.6, 15.0, &[Plastic]);
        for status in [Assigned, Scheduled, Completed, Cancelled] {
            let mut pickup = in_status(status);
            let before = pickup.clone();
            let err = pickup.assign(&p2, None, Utc::now()).unwrap_err();
            assert_eq!(err.kind(), "invalid_transition");
            assert_eq!(pickup, before);
        }
    }

    #[test]
    fn cancel_is_legal_only_before_a_terminal_state() {
        for status in [Requested, Assigned, Scheduled] {
            let mut pickup = in_status(status);
            assert_eq!(pickup.cancel(Utc::now()).unwrap(), Cancelled);
        }
        for status in [Completed, Cancelled] {
            let mut pickup = in_status(status);
            let err = pickup.cancel(Utc::now()).unwrap_err();
            assert_eq!(err.kind(), "invalid_transition");
            assert_eq!(pickup.status, status);
        }
    }

    #[test]
    fn rate_requires_completed() {
        for status in [Requested, Assigned, Scheduled, Cancelled] {
            let mut pickup = in_status(status);
            let err = pickup.rate(4, "good", Utc::now()).unwrap_err();
            assert_eq!(err.kind(), "invalid_state");
            assert!(pickup.rating.is_none());
        }

        let mut done = in_status(Completed);
        done.rate(4, "good", Utc::now()).unwrap();
        assert_eq!(done.rating.as_ref().map(|r| r.score), Some(4));
    }

    #[test]
    fn rate_rejects_scores_outside_one_to_five() {
        let mut done = in_status(Completed);
        assert_eq!(done.rate(0, "", Utc::now()).unwrap_err().kind(), "validation_error");
        assert_eq!(done.rate(6, "", Utc::now()).unwrap_err().kind(), "validation_error");
        assert!(done.rating.is_none());
    }

    #[test]
    fn update_status_rejects_edges_outside_the_graph() {
        let illegal = [
            (Completed, Scheduled),
            (Completed, Requested),
            (Cancelled, Assigned),
            (Requested, Completed),
            (Scheduled, Assigned),
            (Requested, Assigned),
            (Scheduled, Scheduled),
        ];
        for (from, to) in illegal {
            let mut pickup = in_status(from);
            let err = pickup.update_status(to, None, None, Utc::now()).unwrap_err();
            assert_eq!(err.kind(), "invalid_transition", "{from} -> {to}");
            assert_eq!(pickup.status, from);
        }
    }

    #[test]
    fn assigned_pickup_can_complete_without_scheduling() {
        let mut pickup = in_status(Assigned);
        pickup
            .update_status(Completed, None, Some(5.2), Utc::now())
            .unwrap();
        assert_eq!(pickup.status, Completed);
        assert_eq!(pickup.collected_weight_kg, Some(5.2));
    }

    #[test]
    fn collected_weight_is_recorded_only_on_completion() {
        let now = Utc::now();
        let mut pickup = in_status(Assigned);
        pickup
            .update_status(Scheduled, Some("driver confirmed".to_string()), Some(9.0), now)
            .unwrap();
        assert!(pickup.collected_weight_kg.is_none());
        assert_eq!(
            pickup.status_history.last().and_then(|c| c.notes.as_deref()),
            Some("driver confirmed")
        );

        let err = pickup
            .update_status(Completed, None, Some(-1.0), now)
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(pickup.status, Scheduled);

        pickup.update_status(Completed, None, Some(5.2), now).unwrap();
        assert_eq!(pickup.collected_weight_kg, Some(5.2));
        assert!(pickup.completed_at.is_some());
    }

    #[test]
    fn status_clock_never_moves_backwards() {
        let now = Utc::now();
        let mut pickup = request(Plastic, now);
        let p1 = partner("P1", 12.9716, 77.5946, 15.0, &[Plastic]);

        pickup.assign(&p1, None, now - Duration::minutes(10)).unwrap();
        assert_eq!(pickup.status_updated_at, now);

        let later = now + Duration::minutes(5);
        pickup.update_status(Scheduled, None, None, later).unwrap();
        pickup
            .update_status(Completed, None, None, later - Duration::minutes(1))
            .unwrap();
        assert_eq!(pickup.status_updated_at, later);

        let stamps: Vec<_> = pickup.status_history.iter().map(|c| c.at).collect();
        assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
