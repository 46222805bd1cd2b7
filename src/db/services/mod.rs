//! High-level database API. Encapsulates the query and transaction logic
//! so handlers and background services work with domain values without
//! touching the schema directly. One sub-module per entity area.

pub mod machine_service;
pub mod snapshot_service;

pub use machine_service::*;
pub use snapshot_service::*;
