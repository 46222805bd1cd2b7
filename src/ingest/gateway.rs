//! Admission control for inbound telemetry. The gateway authenticates a
//! submission and resolves it to a registered machine; it never writes
//! storage itself.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use thiserror::Error;

use crate::db::entities::machine;
use crate::ingest::payload::TelemetryDocument;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid or missing webhook secret")]
    Unauthorized,
    #[error("{0}")]
    UnknownMachine(String),
    #[error("malformed telemetry document: {0}")]
    Malformed(String),
    #[error("storage failure: {0}")]
    Storage(#[from] DbErr),
}

/// The header must match the configured secret exactly, case-sensitive.
/// Deployments without a configured secret admit every submission.
pub fn verify_secret(
    configured: Option<&str>,
    presented: Option<&str>,
) -> Result<(), IngestError> {
    match configured {
        None => Ok(()),
        Some(expected) => match presented {
            Some(value) if value == expected => Ok(()),
            _ => Err(IngestError::Unauthorized),
        },
    }
}

/// Parses the raw body into the canonical document. Any structural
/// failure is `Malformed`; nothing is partially ingested.
pub fn parse_document(body: &[u8]) -> Result<TelemetryDocument, IngestError> {
    serde_json::from_slice(body).map_err(|e| IngestError::Malformed(e.to_string()))
}

/// Exactly one registered machine may claim the source address. An
/// ambiguous registration is a configuration error surfaced to the
/// caller, never resolved by picking one.
pub fn select_registered(
    source_ip: &str,
    mut matches: Vec<machine::Model>,
) -> Result<machine::Model, IngestError> {
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(IngestError::UnknownMachine(format!(
            "address {source_ip} is not registered"
        ))),
        n => Err(IngestError::UnknownMachine(format!(
            "address {source_ip} is registered to {n} machines"
        ))),
    }
}

/// Resolves the submitting machine from the network-level peer address.
pub async fn resolve_by_source_ip(
    db: &DatabaseConnection,
    source_ip: &str,
) -> Result<machine::Model, IngestError> {
    let matches = machine::Entity::find()
        .filter(machine::Column::IpAddress.eq(source_ip))
        .all(db)
        .await?;
    select_registered(source_ip, matches)
}

/// Resolves the submitting machine from an explicit machine id.
pub async fn resolve_by_id(
    db: &DatabaseConnection,
    machine_id: i32,
) -> Result<machine::Model, IngestError> {
    machine::Entity::find_by_id(machine_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            IngestError::UnknownMachine(format!("machine id {machine_id} is not registered"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn registered(id: i32, ip: &str) -> machine::Model {
        machine::Model {
            id,
            name: format!("machine-{id}"),
            hostname: None,
            ip_address: ip.to_string(),
            mac_address: None,
            ha_entity_id: None,
            description: None,
            os_name: None,
            os_version: None,
            is_active: true,
            last_seen: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_no_configured_secret_admits_everything() {
        assert!(verify_secret(None, None).is_ok());
        assert!(verify_secret(None, Some("anything")).is_ok());
    }

    #[test]
    fn test_matching_secret_is_accepted() {
        assert!(verify_secret(Some("s3cret"), Some("s3cret")).is_ok());
    }

    #[test]
    fn test_missing_or_mismatched_secret_is_unauthorized() {
        assert!(matches!(
            verify_secret(Some("s3cret"), None),
            Err(IngestError::Unauthorized)
        ));
        assert!(matches!(
            verify_secret(Some("s3cret"), Some("S3CRET")),
            Err(IngestError::Unauthorized)
        ));
    }

    #[test]
    fn test_single_match_is_selected() {
        let machine = select_registered("10.0.0.5", vec![registered(1, "10.0.0.5")]).unwrap();
        assert_eq!(machine.id, 1);
    }

    #[test]
    fn test_zero_matches_is_unknown_machine() {
        assert!(matches!(
            select_registered("10.0.0.5", Vec::new()),
            Err(IngestError::UnknownMachine(_))
        ));
    }

    #[test]
    fn test_ambiguous_match_is_unknown_machine() {
        let matches = vec![registered(1, "10.0.0.5"), registered(2, "10.0.0.5")];
        assert!(matches!(
            select_registered("10.0.0.5", matches),
            Err(IngestError::UnknownMachine(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(
            parse_document(b"not json"),
            Err(IngestError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_by_source_ip_with_no_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<machine::Model>::new()])
            .into_connection();

        let result = resolve_by_source_ip(&db, "10.0.0.9").await;
        assert!(matches!(result, Err(IngestError::UnknownMachine(_))));
    }

    #[tokio::test]
    async fn test_resolve_by_source_ip_with_one_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![registered(7, "10.0.0.7")]])
            .into_connection();

        let machine = resolve_by_source_ip(&db, "10.0.0.7").await.unwrap();
        assert_eq!(machine.id, 7);
    }
}
