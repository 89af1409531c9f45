pub mod bindings;
pub mod log;
pub mod report;
pub mod scheduler;
pub mod timeline;
pub mod tuning;
