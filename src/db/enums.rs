use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of a snapshot: pulled from the agent by the hub, or pushed
/// by the agent through the webhook.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text", enum_name = "snapshot_source_enum")]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    #[sea_orm(string_value = "api")]
    Api,
    #[sea_orm(string_value = "webhook")]
    Webhook,
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotSource::Api => write!(f, "api"),
            SnapshotSource::Webhook => write!(f, "webhook"),
        }
    }
}
