//! Aequora Migration - schema bootstrap
//!
//! Tables are created from the SeaORM entities in `aequora-persistence`,
//! followed by the composite unique indexes the entities cannot express.

pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_tables;
mod m20250601_000002_create_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_tables::Migration),
            Box::new(m20250601_000002_create_indexes::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::{ConnectOptions, ConnectionTrait, Database, Statement};

    #[tokio::test]
    async fn test_migrate_up_and_down_on_sqlite() {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.unwrap();

        Migrator::up(&db, None).await.unwrap();

        let backend = db.get_database_backend();
        let row = db
            .query_one(Statement::from_string(
                backend,
                "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name IN ('user', 'booking', 'issuevote')",
            ))
            .await
            .unwrap()
            .unwrap();
        let tables: i64 = row.try_get("", "n").unwrap();
        assert_eq!(tables, 3);

        Migrator::down(&db, None).await.unwrap();

        let row = db
            .query_one(Statement::from_string(
                backend,
                "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = 'booking'",
            ))
            .await
            .unwrap()
            .unwrap();
        let tables: i64 = row.try_get("", "n").unwrap();
        assert_eq!(tables, 0);
    }
}
