pub mod time_slots;

use parking_lot::RwLock;

use crate::error::AppError;
use crate::models::partner::{Partner, PartnerId};

pub use time_slots::TimeSlotCatalog;

/// `active_partners` iterates in a stable order that decides ties between
/// equidistant partners.
pub trait PartnerRegistry: Send + Sync {
    fn active_partners(&self) -> Vec<Partner>;

    fn by_id(&self, id: &PartnerId) -> Result<Partner, AppError>;
}

#[derive(Debug, Default)]
pub struct InMemoryPartnerRegistry {
    partners: RwLock<Vec<Partner>>,
}

impl InMemoryPartnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provision(&self, partner: Partner) -> Result<Partner, AppError> {
        partner.validate()?;

        let mut partners = self.partners.write();
        if partners.iter().any(|existing| existing.id == partner.id) {
            return Err(AppError::Conflict(format!(
                "partner {} already exists",
                partner.id
            )));
        }
        partners.push(partner.clone());

        Ok(partner)
    }

    pub fn set_active(&self, id: &PartnerId, active: bool) -> Result<Partner, AppError> {
        let mut partners = self.partners.write();
        let partner = partners
            .iter_mut()
            .find(|partner| &partner.id == id)
            .ok_or_else(|| AppError::not_found("partner", id))?;

        partner.active = active;
        Ok(partner.clone())
    }

    pub fn all_partners(&self) -> Vec<Partner> {
        self.partners.read().clone()
    }

    pub fn len(&self) -> usize {
        self.partners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.read().is_empty()
    }
}

impl PartnerRegistry for InMemoryPartnerRegistry {
    fn active_partners(&self) -> Vec<Partner> {
        self.partners
            .read()
            .iter()
            .filter(|partner| partner.active)
            .cloned()
            .collect()
    }

    fn by_id(&self, id: &PartnerId) -> Result<Partner, AppError> {
        self.partners
            .read()
            .iter()
            .find(|partner| &partner.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found("partner", id))
    }
}
