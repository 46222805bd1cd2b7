//! The telemetry ingestion path: admission control at the gateway, then
//! normalization of the accepted document into a snapshot record. The
//! gateway never writes storage; the normalizer never reads the network.

pub mod gateway;
pub mod normalizer;
pub mod payload;
