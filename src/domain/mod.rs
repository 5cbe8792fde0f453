// Order, sheet and report models plus the Storage/Pipeline ports.

pub mod model;
pub mod ports;
