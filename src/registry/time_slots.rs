use parking_lot::RwLock;

use crate::error::AppError;
use crate::models::time_slot::TimeSlot;

#[derive(Debug, Default)]
pub struct TimeSlotCatalog {
    slots: RwLock<Vec<TimeSlot>>,
}

impl TimeSlotCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, slot: TimeSlot) -> Result<TimeSlot, AppError> {
        slot.validate()?;

        let mut slots = self.slots.write();
        match slots.iter_mut().find(|existing| existing.label == slot.label) {
            Some(existing) => *existing = slot.clone(),
            None => slots.push(slot.clone()),
        }

        Ok(slot)
    }

    pub fn active_slots(&self) -> Vec<TimeSlot> {
        let mut active: Vec<TimeSlot> = self
            .slots
            .read()
            .iter()
            .filter(|slot| slot.active)
            .cloned()
            .collect();
        active.sort_by_key(|slot| slot.display_order);
        active
    }

    pub fn ensure_active(&self, field: &'static str, label: &str) -> Result<(), AppError> {
        let known = self
            .slots
            .read()
            .iter()
            .any(|slot| slot.active && slot.label == label);

        if known {
            Ok(())
        } else {
            Err(AppError::validation(
                field,
                format!("{label:?} is not an available time slot"),
            ))
        }
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::TimeSlotCatalog;
    use crate::models::time_slot::TimeSlot;

    fn slot(label: &str, start: u8, end: u8, order: u32, active: bool) -> TimeSlot {
        TimeSlot {
            label: label.to_string(),
            start_hour: start,
            end_hour: end,
            display_order: order,
            active,
        }
    }

    #[test]
    fn active_slots_follow_display_order() {
        let catalog = TimeSlotCatalog::new();
        catalog.upsert(slot("3 PM - 6 PM", 15, 18, 3, true)).unwrap();
        catalog.upsert(slot("9 AM - 12 PM", 9, 12, 1, true)).unwrap();
        catalog.upsert(slot("6 PM - 8 PM", 18, 20, 4, false)).unwrap();

        let labels: Vec<String> = catalog
            .active_slots()
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["9 AM - 12 PM", "3 PM - 6 PM"]);
    }

    #[test]
    fn inactive_or_unknown_labels_are_rejected() {
        let catalog = TimeSlotCatalog::new();
        catalog.upsert(slot("9 AM - 12 PM", 9, 12, 1, true)).unwrap();
        catalog.upsert(slot("6 PM - 8 PM", 18, 20, 4, false)).unwrap();

        assert!(catalog.ensure_active("preferred_time_slot", "9 AM - 12 PM").is_ok());
        assert!(catalog.ensure_active("preferred_time_slot", "6 PM - 8 PM").is_err());
        assert!(catalog.ensure_active("preferred_time_slot", "midnight").is_err());
    }

    #[test]
    fn upsert_replaces_by_label_and_validates_hours() {
        let catalog = TimeSlotCatalog::new();
        catalog.upsert(slot("9 AM - 12 PM", 9, 12, 1, true)).unwrap();
        catalog.upsert(slot("9 AM - 12 PM", 9, 12, 1, false)).unwrap();

        assert_eq!(catalog.len(), 1);
        assert!(catalog.active_slots().is_empty());
        assert!(catalog.upsert(slot("broken", 12, 9, 2, true)).is_err());
    }
}
