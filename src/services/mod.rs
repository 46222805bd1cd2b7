//! Background services spawned at startup: the telemetry poller and the
//! snapshot retention job. Each runs its own interval loop and shares
//! nothing with request handling beyond the database.

pub mod poller;
pub mod retention;
