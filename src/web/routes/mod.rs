pub mod machine_routes;
pub mod snapshot_routes;
pub mod webhook_routes;
