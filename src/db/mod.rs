use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};

pub mod entities;
pub mod enums;
pub mod services;

/// Opens the connection pool against the configured database URL.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Creates any table that does not exist yet from the entity definitions,
/// so a fresh deployment needs no out-of-band migration step.
pub async fn init_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = vec![
        schema.create_table_from_entity(entities::machine::Entity),
        schema.create_table_from_entity(entities::snapshot::Entity),
        schema.create_table_from_entity(entities::snapshot_filesystem::Entity),
        schema.create_table_from_entity(entities::snapshot_network_interface::Entity),
        schema.create_table_from_entity(entities::snapshot_sensor::Entity),
        schema.create_table_from_entity(entities::snapshot_alert::Entity),
    ];

    for statement in statements.iter_mut() {
        statement.if_not_exists();
        db.execute(backend.build(statement)).await?;
    }

    Ok(())
}
