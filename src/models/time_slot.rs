use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub label: String,
    pub start_hour: u8,
    pub end_hour: u8,
    pub display_order: u32,
    pub active: bool,
}

impl TimeSlot {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.label.trim().is_empty() {
            return Err(AppError::validation("label", "slot label cannot be empty"));
        }
        if self.start_hour >= self.end_hour || self.end_hour > 24 {
            return Err(AppError::validation(
                "end_hour",
                format!(
                    "slot hours {}..{} must satisfy start < end <= 24",
                    self.start_hour, self.end_hour
                ),
            ));
        }

        Ok(())
    }
}
