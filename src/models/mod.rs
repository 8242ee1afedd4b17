pub mod event;
pub mod partner;
pub mod pickup;
pub mod time_slot;
