use std::sync::Arc;

use tokio::sync::broadcast;

use crate::clock::Clock;
use crate::engine::dispatch::{DispatchCoordinator, DispatchLimits};
use crate::models::event::DispatchEvent;
use crate::observability::metrics::Metrics;
use crate::registry::{InMemoryPartnerRegistry, TimeSlotCatalog};
use crate::store::{InMemoryRequestStore, RequestStore};

pub struct AppState {
    pub partners: Arc<InMemoryPartnerRegistry>,
    pub time_slots: Arc<TimeSlotCatalog>,
    pub dispatch: DispatchCoordinator,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Self {
        Self::with_store(Arc::new(InMemoryRequestStore::new()), event_buffer_size)
    }

    pub fn with_store(store: Arc<dyn RequestStore>, event_buffer_size: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        let partners = Arc::new(InMemoryPartnerRegistry::new());
        let time_slots = Arc::new(TimeSlotCatalog::new());
        let metrics = Metrics::new();

        let dispatch = DispatchCoordinator::new(
            partners.clone(),
            time_slots.clone(),
            store,
            events_tx.clone(),
            metrics.clone(),
        );

        Self {
            partners,
            time_slots,
            dispatch,
            events_tx,
            metrics,
        }
    }

    pub fn with_limits(mut self, limits: DispatchLimits) -> Self {
        self.dispatch = self.dispatch.with_limits(limits);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.dispatch = self.dispatch.with_clock(clock);
        self
    }
}
