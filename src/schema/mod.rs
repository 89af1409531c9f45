pub mod category;
pub mod curve;
pub mod event;
