use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::AppError;
use crate::models::pickup::{PickupRequest, RequestId};

pub trait RequestStore: Send + Sync {
    fn insert(&self, request: PickupRequest) -> Result<(), AppError>;

    fn update(&self, request: PickupRequest) -> Result<(), AppError>;

    fn get(&self, id: &RequestId) -> Option<PickupRequest>;

    fn list(&self) -> Vec<PickupRequest>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    requests: DashMap<RequestId, PickupRequest>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestStore for InMemoryRequestStore {
    fn insert(&self, request: PickupRequest) -> Result<(), AppError> {
        match self.requests.entry(request.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "request {} already exists",
                request.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(request);
                Ok(())
            }
        }
    }

    fn update(&self, request: PickupRequest) -> Result<(), AppError> {
        let mut stored = self
            .requests
            .get_mut(&request.id)
            .ok_or_else(|| AppError::not_found("request", &request.id))?;

        *stored = request;
        Ok(())
    }

    fn get(&self, id: &RequestId) -> Option<PickupRequest> {
        self.requests.get(id).map(|entry| entry.value().clone())
    }

    fn list(&self) -> Vec<PickupRequest> {
        self.requests
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.requests.len()
    }
}
